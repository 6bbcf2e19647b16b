//! Capabilities the access core consumes but does not implement.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use masthead_core::{DomainError, ExpectedVersion, RoleId, SubjectId};

use crate::roles::Role;
use crate::subject::Subject;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Stale revision or uniqueness violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage could not be reached or failed mid-operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<DomainError> for RepositoryError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

pub trait RoleRepository: Send + Sync {
    fn load(&self, role_id: RoleId) -> Result<Role, RepositoryError>;

    fn find_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError>;

    /// Insert or replace. Role names are unique.
    fn save(&self, role: &Role) -> Result<(), RepositoryError>;
}

pub trait SubjectRepository: Send + Sync {
    fn load(&self, subject_id: SubjectId) -> Result<Subject, RepositoryError>;

    /// Store `subject` if the stored revision matches `expected`, returning
    /// the stored copy with its new `version`.
    fn save(
        &self,
        subject: &Subject,
        expected: ExpectedVersion,
    ) -> Result<Subject, RepositoryError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_moves_only_when_told() {
        let start = Utc::now();
        let clock = FixedClock::at(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now(), start + Duration::minutes(5));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn version_conflicts_map_to_repository_conflicts() {
        let err: RepositoryError = ExpectedVersion::Exact(1).check(2).unwrap_err().into();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}
