//! Optimistic concurrency for stored records.

use crate::error::{DomainError, DomainResult};

/// Expected storage revision of a record at save time.
///
/// Security counters (failed logins, backup codes) are read-modify-write: a
/// save must fail rather than silently overwrite a revision it never saw.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (administrative overwrites, migrations).
    Any,
    /// Require the record to be at an exact revision. `Exact(0)` means "absent".
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
