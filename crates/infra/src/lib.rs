//! Infrastructure adapters for `masthead-auth`: storage and password hashing.

pub mod password;
pub mod store;

pub use password::Argon2Hasher;
pub use store::{InMemoryRoleRepository, InMemorySubjectRepository};
