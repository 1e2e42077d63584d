//! vulngate - A gated build, scan, attest and deploy pipeline
//!
//! Builds an image, scans it, and signs, promotes and deploys it only
//! when the severity gate allows. Exit codes: 0 succeeded, 1 failed,
//! 2 blocked, 3 cancelled.

// Deny all clippy warnings in this crate
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata
)]

mod cli;
mod commands;

/// Main entry point for the vulngate CLI
fn main() {
    match cli::run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        },
    }
}
