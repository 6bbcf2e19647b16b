use std::collections::HashMap;
use std::sync::RwLock;

use masthead_auth::{RepositoryError, Role, RoleRepository, Subject, SubjectRepository};
use masthead_core::{ExpectedVersion, RoleId, SubjectId};

fn poisoned() -> RepositoryError {
    RepositoryError::Unavailable("lock poisoned".to_string())
}

/// In-memory role table with a unique index on `name`.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<HashMap<RoleId, Role>>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoleRepository for InMemoryRoleRepository {
    fn load(&self, role_id: RoleId) -> Result<Role, RepositoryError> {
        let roles = self.roles.read().map_err(|_| poisoned())?;
        roles
            .get(&role_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("role {role_id}")))
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError> {
        let roles = self.roles.read().map_err(|_| poisoned())?;
        Ok(roles.values().find(|r| r.name == name).cloned())
    }

    fn save(&self, role: &Role) -> Result<(), RepositoryError> {
        let mut roles = self.roles.write().map_err(|_| poisoned())?;

        if roles.values().any(|r| r.name == role.name && r.id != role.id) {
            return Err(RepositoryError::Conflict(format!(
                "role name '{}' already exists",
                role.name
            )));
        }
        if let Some(existing) = roles.get(&role.id) {
            if existing.name != role.name {
                return Err(RepositoryError::Conflict(format!(
                    "role {} cannot be renamed from '{}' to '{}'",
                    role.id, existing.name, role.name
                )));
            }
        }

        roles.insert(role.id, role.clone());
        Ok(())
    }
}

/// In-memory subject table with per-row revisions.
///
/// `save` is a compare-and-swap on `version`: the stored revision must match
/// `expected`, and the stored copy gets `version + 1`. Inserting a new subject
/// is `ExpectedVersion::Exact(0)`.
#[derive(Debug, Default)]
pub struct InMemorySubjectRepository {
    subjects: RwLock<HashMap<SubjectId, Subject>>,
}

impl InMemorySubjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a brand-new subject.
    pub fn insert(&self, subject: &Subject) -> Result<Subject, RepositoryError> {
        self.save(subject, ExpectedVersion::Exact(0))
    }
}

impl SubjectRepository for InMemorySubjectRepository {
    fn load(&self, subject_id: SubjectId) -> Result<Subject, RepositoryError> {
        let subjects = self.subjects.read().map_err(|_| poisoned())?;
        subjects
            .get(&subject_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("subject {subject_id}")))
    }

    fn save(
        &self,
        subject: &Subject,
        expected: ExpectedVersion,
    ) -> Result<Subject, RepositoryError> {
        let mut subjects = self.subjects.write().map_err(|_| poisoned())?;

        let current = subjects.get(&subject.id).map(|s| s.version).unwrap_or(0);
        expected.check(current)?;

        let mut stored = subject.clone();
        stored.version = current + 1;
        // Plaintext never reaches storage.
        stored.pending_password = None;
        subjects.insert(stored.id, stored.clone());

        tracing::debug!(subject_id = %stored.id, version = stored.version, "subject saved");
        Ok(stored)
    }
}
