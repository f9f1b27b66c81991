//! Build script for alloctrace.
//!
//! Emits build-time notes for feature combinations that commonly surprise
//! users integrating the tracer.

use std::env;

fn main() {
    // Re-run if features change
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_LOG");

    let log_enabled = env::var("CARGO_FEATURE_LOG").is_ok();
    let target = env::var("TARGET").unwrap_or_default();

    if log_enabled {
        emit_info("log integration enabled");
        emit_note("diagnostics are forwarded to the log facade as well as stderr");
        emit_note("install a logger (e.g. env_logger) in the traced program to capture them");
    }

    if !target.contains("linux") && !target.contains("darwin") && !target.contains("macos") {
        emit_warning("alloctrace targets Unix (mmap + the malloc family); this target is untested");
    }
}

fn emit_info(msg: &str) {
    println!("cargo:warning=[alloctrace] ℹ️  {}", msg);
}

fn emit_note(msg: &str) {
    println!("cargo:warning=[alloctrace]    {}", msg);
}

fn emit_warning(msg: &str) {
    println!("cargo:warning=[alloctrace] ⚠️  {}", msg);
}
