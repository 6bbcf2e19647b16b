//! Storage adapters for the access core's repository traits.

pub mod in_memory;

pub use in_memory::{InMemoryRoleRepository, InMemorySubjectRepository};
