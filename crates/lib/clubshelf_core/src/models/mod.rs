//! Domain models shared by the gating core, the admin surface and the stores.
//!
//! Raw records (`AccountRecord` and friends) are what the identity and storage
//! collaborators hand over. Derived, read-only values (`AccountView`) are what
//! presentation consumes.

pub mod account;
pub mod audit;
