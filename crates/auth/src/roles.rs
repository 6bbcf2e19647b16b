use serde::{Deserialize, Serialize};

use masthead_core::RoleId;

use crate::permissions::PermissionSet;

/// A stored role, shared by every subject that references it.
///
/// `access_level` and the boolean flags are informational: callers may use
/// them as coarse gates, the resolver never reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
    pub access_level: u8,
    pub is_admin: bool,
    pub can_manage_users: bool,
    pub can_manage_roles: bool,
    pub permissions: PermissionSet,
}

/// Role creation input, before defaults are applied.
///
/// Fields left `None` are filled by `prepare_for_create`. For canonical role
/// names every field except `name`/`description` is overwritten by the
/// registry bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
    pub access_level: Option<u8>,
    pub is_admin: Option<bool>,
    pub can_manage_users: Option<bool>,
    pub can_manage_roles: Option<bool>,
    pub permissions: Option<PermissionSet>,
}

impl NewRole {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
