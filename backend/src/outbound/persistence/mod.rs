//! In-memory persistence adapters.
//!
//! Each repository keeps the storage record of its aggregate in a
//! mutex-guarded map. Conditional writes compare and bump `version` while the
//! lock is held, so two writers holding the same version cannot both succeed.
//! Rows are decoded through the record's `TryFrom`, the same path a database
//! adapter would take.

mod memory_mail_token_repository;
mod memory_role_repository;
mod memory_user_repository;
mod table;

pub use memory_mail_token_repository::InMemoryMailTokenRepository;
pub use memory_role_repository::InMemoryRoleRepository;
pub use memory_user_repository::InMemoryUserRepository;
