//! Explicit preparation steps run by the caller before persisting.
//!
//! Nothing here happens implicitly on save: role defaults and password
//! hashing are plain function calls the caller makes, then it persists the
//! result.

use thiserror::Error;

use masthead_core::{DomainError, RoleId};

use crate::defaults::{defaults_for, RoleDefaults};
use crate::roles::{NewRole, Role};
use crate::subject::Subject;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("stored password hash is malformed: {0}")]
    Malformed(String),
}

/// Password hashing capability.
///
/// The primitive is opaque to this crate; see `masthead-infra` for Argon2id.
pub trait Hasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    /// `Ok(false)` for a wrong password, `Err` only when the stored hash
    /// cannot be interpreted.
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError>;
}

/// Build a role ready to store.
///
/// Canonical names take the registry bundle wholesale. Custom names keep what
/// the caller supplied and fall back to the baseline for anything left unset.
pub fn prepare_for_create(new: NewRole) -> Result<Role, DomainError> {
    let name = new.name.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::validation("role name cannot be empty"));
    }

    let defaults = match defaults_for(&name) {
        Some(canonical) => canonical,
        None => {
            let baseline = RoleDefaults::baseline();
            RoleDefaults {
                access_level: new.access_level.unwrap_or(baseline.access_level),
                is_admin: new.is_admin.unwrap_or(baseline.is_admin),
                can_manage_users: new.can_manage_users.unwrap_or(baseline.can_manage_users),
                can_manage_roles: new.can_manage_roles.unwrap_or(baseline.can_manage_roles),
                permissions: new.permissions.unwrap_or(baseline.permissions),
            }
        }
    };

    if !(1..=10).contains(&defaults.access_level) {
        return Err(DomainError::validation(format!(
            "access level must be between 1 and 10, got {}",
            defaults.access_level
        )));
    }

    Ok(Role {
        id: RoleId::new(),
        name,
        description: new.description,
        access_level: defaults.access_level,
        is_admin: defaults.is_admin,
        can_manage_users: defaults.can_manage_users,
        can_manage_roles: defaults.can_manage_roles,
        permissions: defaults.permissions,
    })
}

/// Normalize a subject before it is stored.
///
/// - a staged plaintext password is hashed and cleared;
/// - an existing hash is left untouched;
/// - the email is trimmed and lowercased.
pub fn prepare_for_save<H: Hasher + ?Sized>(
    mut subject: Subject,
    hasher: &H,
) -> Result<Subject, HashError> {
    if let Some(pending) = subject.pending_password.take() {
        subject.password_hash = Some(hasher.hash(pending.expose())?);
    }
    subject.email = subject.email.trim().to_lowercase();
    Ok(subject)
}

/// Check a login password against the stored hash.
///
/// A subject without a hash, or whose hash cannot be parsed, never
/// authenticates.
pub fn verify_password<H: Hasher + ?Sized>(hasher: &H, subject: &Subject, plaintext: &str) -> bool {
    let Some(hash) = subject.password_hash.as_deref() else {
        return false;
    };
    match hasher.verify(plaintext, hash) {
        Ok(valid) => valid,
        Err(err) => {
            tracing::error!(
                subject_id = %subject.id,
                error = %err,
                "stored password hash unusable"
            );
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Reversible stand-in for a real hasher.
    pub struct PrefixHasher;

    impl Hasher for PrefixHasher {
        fn hash(&self, plaintext: &str) -> Result<String, HashError> {
            Ok(format!("hashed:{plaintext}"))
        }

        fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
            let stored = hash
                .strip_prefix("hashed:")
                .ok_or_else(|| HashError::Malformed(hash.to_string()))?;
            Ok(stored == plaintext)
        }
    }
}
