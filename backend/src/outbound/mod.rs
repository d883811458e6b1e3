//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: in-memory repositories with optimistic concurrency.
//! - **security**: password hashing, MFA secrets and codes, mail tokens.
//!
//! Adapters translate between domain types and their storage or crypto
//! representation. They contain no business rules.

pub mod persistence;
pub mod security;
