//! # clubshelf_core
//!
//! Core domain logic for Clubshelf: entitlement and loyalty derivation,
//! route gating, the session observer, and the administrative commands that
//! mutate account state together with their audit trail.

pub mod access;
pub mod admin;
pub mod config;
pub mod entitlement;
pub mod loyalty;
pub mod models;
pub mod notify;
pub mod referral;
pub mod refresh;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
