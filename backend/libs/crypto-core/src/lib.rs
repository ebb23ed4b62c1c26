//! Shared cryptographic helpers for social-api services.
//!
//! Currently this is only JWT issuance and validation (RS256).

pub mod jwt;
