//! `masthead-core` — domain primitives shared by the access-control crates.
//!
//! Nothing in here performs IO.

pub mod error;
pub mod id;
pub mod version;

pub use error::{DomainError, DomainResult};
pub use id::{RoleId, SubjectId};
pub use version::ExpectedVersion;
