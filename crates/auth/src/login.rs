//! Per-subject serialization of login bookkeeping.
//!
//! `record_attempt` is read-modify-write on the failure counter. Two racing
//! failures that both read `k` and both write `k + 1` would let more than
//! `threshold` guesses through, so every mutation here runs under a
//! per-subject lock and is saved with `ExpectedVersion::Exact`. The lock
//! serializes callers within a process; the version check turns a race with
//! another process into `RepositoryError::Conflict` instead of a lost update.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;

use masthead_core::{ExpectedVersion, SubjectId};

use crate::backup_codes::{self, DEFAULT_BACKUP_CODE_COUNT};
use crate::config::{AccountKind, SecurityConfig};
use crate::lockout::{login_state, record_attempt, LockoutPolicy, LoginState};
use crate::ports::{Clock, RepositoryError, SubjectRepository};
use crate::subject::Subject;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credential accepted; counters reset. Carries the stored subject.
    Authenticated(Subject),
    /// Credential rejected and recorded.
    Rejected {
        failed_attempts: u32,
        locked_until: Option<DateTime<Utc>>,
    },
    /// Refused without evaluating the credential.
    Locked { until: DateTime<Utc> },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("account is deactivated")]
    Inactive,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

type SubjectLock = Arc<Mutex<()>>;

pub struct LoginCoordinator<R, C> {
    subjects: R,
    clock: C,
    policy: LockoutPolicy,
    backup_code_count: usize,
    /// Only subjects with an operation in flight have an entry.
    locks: Mutex<HashMap<SubjectId, SubjectLock>>,
}

impl<R, C> LoginCoordinator<R, C>
where
    R: SubjectRepository,
    C: Clock,
{
    pub fn new(subjects: R, clock: C, policy: LockoutPolicy) -> Self {
        Self {
            subjects,
            clock,
            policy,
            backup_code_count: DEFAULT_BACKUP_CODE_COUNT,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Coordinator for one kind of account, with its lockout policy and
    /// backup-code batch size taken from `config`.
    pub fn from_config(subjects: R, clock: C, config: &SecurityConfig, kind: AccountKind) -> Self {
        Self {
            backup_code_count: config.backup_code_count,
            ..Self::new(subjects, clock, config.policy_for(kind))
        }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    pub fn backup_code_count(&self) -> usize {
        self.backup_code_count
    }

    pub fn subjects(&self) -> &R {
        &self.subjects
    }

    fn acquire(&self, subject_id: SubjectId) -> SubjectLock {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(subject_id).or_default())
    }

    fn release(&self, subject_id: SubjectId, lock: SubjectLock) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only handed out under `locks`, so a count of two (the map
        // and ours) means nobody else holds or waits on this subject.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&subject_id);
        }
    }

    /// Load, mutate and save one subject while holding its lock.
    ///
    /// `f` returns the subject to save (if anything changed) and a result.
    /// The stored copy, with its bumped version, is handed back alongside.
    fn with_subject<T, F>(
        &self,
        subject_id: SubjectId,
        f: F,
    ) -> Result<(Option<Subject>, T), LoginError>
    where
        F: FnOnce(&Self, Subject) -> Result<(Option<Subject>, T), LoginError>,
    {
        let lock = self.acquire(subject_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.load_modify_save(subject_id, f)
        };
        self.release(subject_id, lock);
        result
    }

    fn load_modify_save<T, F>(
        &self,
        subject_id: SubjectId,
        f: F,
    ) -> Result<(Option<Subject>, T), LoginError>
    where
        F: FnOnce(&Self, Subject) -> Result<(Option<Subject>, T), LoginError>,
    {
        let loaded = self.subjects.load(subject_id)?;
        let expected = ExpectedVersion::Exact(loaded.version);
        let (changed, out) = f(self, loaded)?;
        let stored = match changed {
            Some(updated) => Some(self.subjects.save(&updated, expected)?),
            None => None,
        };
        Ok((stored, out))
    }

    /// Run one password attempt.
    ///
    /// `verify` sees the loaded subject and reports whether the presented
    /// credential is valid. It is not called for locked or inactive accounts.
    pub fn attempt_login<F>(
        &self,
        subject_id: SubjectId,
        verify: F,
    ) -> Result<LoginOutcome, LoginError>
    where
        F: FnOnce(&Subject) -> bool,
    {
        let (stored, outcome) = self.with_subject(subject_id, |this, subject| {
            if !subject.is_active {
                tracing::info!(subject_id = %subject_id, "login refused: account deactivated");
                return Err(LoginError::Inactive);
            }

            let now = this.clock.now();
            if let LoginState::Locked { until } = login_state(&subject, now) {
                tracing::info!(
                    subject_id = %subject_id,
                    locked_until = %until,
                    "login refused: account locked"
                );
                return Ok((None, LoginOutcome::Locked { until }));
            }

            let success = verify(&subject);
            let updated = record_attempt(subject, success, now, &this.policy);

            let outcome = if success {
                tracing::info!(subject_id = %subject_id, "login succeeded");
                LoginOutcome::Authenticated(updated.clone())
            } else {
                tracing::info!(
                    subject_id = %subject_id,
                    failed_attempts = updated.failed_login_attempts,
                    "login failed"
                );
                LoginOutcome::Rejected {
                    failed_attempts: updated.failed_login_attempts,
                    locked_until: updated.lockout_until,
                }
            };
            Ok((Some(updated), outcome))
        })?;

        Ok(match (outcome, stored) {
            (LoginOutcome::Authenticated(_), Some(stored)) => LoginOutcome::Authenticated(stored),
            (outcome, _) => outcome,
        })
    }

    /// Spend a backup code during the second-factor challenge.
    pub fn consume_backup_code(
        &self,
        subject_id: SubjectId,
        code: &str,
    ) -> Result<bool, LoginError> {
        let (_, accepted) = self.with_subject(subject_id, |_, subject| {
            let (accepted, updated) = backup_codes::consume_backup_code(subject, code);
            Ok((accepted.then_some(updated), accepted))
        })?;
        Ok(accepted)
    }

    /// Issue a fresh batch of `count` codes, invalidating the previous one.
    pub fn issue_backup_codes(
        &self,
        subject_id: SubjectId,
        count: usize,
    ) -> Result<Vec<String>, LoginError> {
        let (_, codes) = self.with_subject(subject_id, |_, subject| {
            let (updated, codes) = backup_codes::issue_for(subject, count);
            Ok((Some(updated), codes))
        })?;
        Ok(codes)
    }

    /// [`Self::issue_backup_codes`] with the configured batch size.
    pub fn regenerate_backup_codes(
        &self,
        subject_id: SubjectId,
    ) -> Result<Vec<String>, LoginError> {
        self.issue_backup_codes(subject_id, self.backup_code_count)
    }
}
