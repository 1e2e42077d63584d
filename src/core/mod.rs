//! Core pipeline logic for vulngate
//!
//! This module contains the gating pipeline with no direct I/O.
//! All external interactions are abstracted through port traits.
//!
//! ## Architecture
//!
//! - `models/` - Domain types (Artifact, Finding, Policy, Attestation, Stage)
//! - `services/` - Gate, attestor, admission and orchestration
//! - `ports/` - Trait definitions for external collaborators
//! - `error` - Stage error taxonomy

pub mod error;
pub mod models;
pub mod ports;
pub mod services;
