//! Application layer containing the cashcard orchestration.
//!
//! This module defines `Cashcard`, which verifies the caller's PIN through the
//! injected `IdentityVerifier` port and then applies the balance change under a
//! per-card lock.

pub mod cashcard;
