//! vulngate - A gated build, scan, attest and deploy pipeline
//!
//! An artifact is built, pushed to a staging partition and scanned. A
//! severity gate decides whether it may continue. Only allowed artifacts
//! are signed by an attestor, promoted to production and deployed, and
//! the admission controller refuses any digest lacking a valid
//! attestation from every required attestor.

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

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapters;
pub mod config;
pub mod core;
pub mod output;
pub mod paths;
pub mod project;
