use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use masthead_core::{DomainError, RoleId, SubjectId};

use crate::permissions::PermissionSet;
use crate::roles::Role;

/// Plaintext password waiting to be hashed by `prepare_for_save`.
///
/// Never serialized, never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingPassword(String);

impl PendingPassword {
    pub fn new(plaintext: impl Into<String>) -> Self {
        Self(plaintext.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for PendingPassword {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PendingPassword(<redacted>)")
    }
}

/// An account that logs in and is checked for permissions (admin or member).
///
/// Security fields (`failed_login_attempts`, `lockout_until`,
/// `last_login_at`) change only through `lockout::record_attempt`;
/// `mfa_backup_codes` only through the `backup_codes` module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub email: String,
    pub name: String,
    pub role_id: RoleId,
    /// Grants layered on top of the role. Overrides only ever add.
    pub permission_overrides: PermissionSet,
    pub failed_login_attempts: u32,
    pub lockout_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub mfa_enabled: bool,
    pub mfa_backup_codes: Vec<String>,
    pub password_hash: Option<String>,
    #[serde(skip)]
    pub pending_password: Option<PendingPassword>,
    /// Storage revision; bumped by the repository on every save.
    pub version: u64,
}

impl Subject {
    pub fn new(
        id: SubjectId,
        email: impl Into<String>,
        name: impl Into<String>,
        role_id: RoleId,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            name: name.into(),
            role_id,
            permission_overrides: PermissionSet::new(),
            failed_login_attempts: 0,
            lockout_until: None,
            last_login_at: None,
            is_active: true,
            mfa_enabled: false,
            mfa_backup_codes: Vec::new(),
            password_hash: None,
            pending_password: None,
            version: 0,
        }
    }

    /// Stage a new plaintext password; it is hashed by `prepare_for_save`.
    pub fn with_password(mut self, plaintext: impl Into<String>) -> Self {
        self.pending_password = Some(PendingPassword::new(plaintext));
        self
    }

    pub fn with_overrides<I, S>(mut self, grants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for grant in grants {
            self.permission_overrides.grant(grant);
        }
        self
    }

    /// Role grants ∪ override grants.
    ///
    /// `role` must be the role this subject references.
    pub fn effective_permissions(&self, role: &Role) -> Result<PermissionSet, DomainError> {
        if role.id != self.role_id {
            return Err(DomainError::invariant(format!(
                "subject {} references role {}, got role {}",
                self.id, self.role_id, role.id
            )));
        }
        Ok(role.permissions.union(&self.permission_overrides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::has_permission;

    fn role(id: RoleId, grants: &[&str]) -> Role {
        Role {
            id,
            name: "Staff Writers".to_string(),
            description: None,
            access_level: 4,
            is_admin: false,
            can_manage_users: false,
            can_manage_roles: false,
            permissions: grants.iter().copied().collect(),
        }
    }

    #[test]
    fn overrides_merge_as_union() {
        let role_id = RoleId::new();
        let role = role(role_id, &["content.create"]);
        let subject = Subject::new(SubjectId::new(), "ed@example.com", "Ed", role_id)
            .with_overrides(["content.delete"]);

        let effective = subject.effective_permissions(&role).unwrap();
        assert!(has_permission(&effective, "content.create"));
        assert!(has_permission(&effective, "content.delete"));
    }

    #[test]
    fn override_cannot_revoke_role_grant() {
        let role_id = RoleId::new();
        let role = role(role_id, &["content.publish"]);
        let mut subject = Subject::new(SubjectId::new(), "ed@example.com", "Ed", role_id);
        // A stored `false` override is dropped on load and does not subtract.
        subject.permission_overrides =
            serde_json::from_str(r#"{"content.publish": false}"#).unwrap();

        let effective = subject.effective_permissions(&role).unwrap();
        assert!(has_permission(&effective, "content.publish"));
    }

    #[test]
    fn effective_permissions_rejects_foreign_role() {
        let subject = Subject::new(SubjectId::new(), "ed@example.com", "Ed", RoleId::new());
        let other = role(RoleId::new(), &["content.create"]);
        let err = subject.effective_permissions(&other).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn pending_password_is_neither_printed_nor_serialized() {
        let subject = Subject::new(SubjectId::new(), "ed@example.com", "Ed", RoleId::new())
            .with_password("hunter22");
        assert!(!format!("{subject:?}").contains("hunter22"));
        let json = serde_json::to_string(&subject).unwrap();
        assert!(!json.contains("hunter22"));
        assert!(!json.contains("pending_password"));
    }
}
