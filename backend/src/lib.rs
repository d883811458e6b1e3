//! Identity backend: roles, users with MFA, and mail tokens.
//!
//! `domain` holds aggregates, ports, and services; `outbound` holds reference
//! adapters for those ports; `settings` loads the identity policy.

pub mod domain;
pub mod outbound;
pub mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
