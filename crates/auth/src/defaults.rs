//! Canonical role bundles.
//!
//! The table is immutable and versioned. It is read once, when a role is
//! created; permission checks afterwards only see the seeded
//! `Role::permissions`.

use serde::Serialize;

use crate::permissions::PermissionSet;

/// Bumped whenever a canonical bundle changes. Roles created under an older
/// version keep their seeded permissions.
pub const REGISTRY_VERSION: u32 = 1;

/// Role-level settings applied at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDefaults {
    pub access_level: u8,
    pub is_admin: bool,
    pub can_manage_users: bool,
    pub can_manage_roles: bool,
    pub permissions: PermissionSet,
}

impl RoleDefaults {
    /// Settings for a role name that is not canonical.
    pub fn baseline() -> Self {
        Self {
            access_level: 1,
            is_admin: false,
            can_manage_users: false,
            can_manage_roles: false,
            permissions: PermissionSet::new(),
        }
    }
}

struct CanonicalRole {
    name: &'static str,
    access_level: u8,
    is_admin: bool,
    can_manage_users: bool,
    can_manage_roles: bool,
    permissions: &'static [&'static str],
}

impl CanonicalRole {
    fn to_defaults(&self) -> RoleDefaults {
        RoleDefaults {
            access_level: self.access_level,
            is_admin: self.is_admin,
            can_manage_users: self.can_manage_users,
            can_manage_roles: self.can_manage_roles,
            permissions: self.permissions.iter().copied().collect(),
        }
    }
}

const CANONICAL_ROLES: &[CanonicalRole] = &[
    CanonicalRole {
        name: "Master Admin",
        access_level: 10,
        is_admin: true,
        can_manage_users: true,
        can_manage_roles: true,
        permissions: &[
            "system",
            "system.full_access",
            "system.user_management",
            "system.role_management",
            "system.site_config",
            "system.technical_access",
            "system.performance_monitoring",
            "system.maintenance",
            "content",
            "content.create",
            "content.edit",
            "content.delete",
            "content.publish",
            "content.moderate",
            "content.read",
            "content.view",
            "users",
            "users.view",
            "users.read",
            "users.manage_roles",
            "users.manage",
            "communication",
            "communication.manage",
            "analytics",
            "analytics.view",
            "analytics.read",
            "analytics.export",
            "security",
            "security.view_logs",
            "security.read",
            "security.manage",
            "security.manage_security",
        ],
    },
    CanonicalRole {
        name: "Webmaster",
        access_level: 9,
        is_admin: true,
        can_manage_users: true,
        can_manage_roles: true,
        permissions: &[
            "system",
            "system.technical_access",
            "system.performance_monitoring",
            "system.maintenance",
            "system.settings",
            "system.logs",
            "analytics",
            "analytics.view",
            "analytics.read",
            "analytics.export",
            "security",
            "security.view_logs",
            "security.read",
            "security.manage",
            "security.manage_security",
            "content.create",
            "content.edit",
            "content.delete",
            "content.publish",
            "users",
            "users.view",
            "users.read",
            "users.manage_roles",
            "users.manage",
        ],
    },
    CanonicalRole {
        name: "Content Admin",
        access_level: 8,
        is_admin: true,
        can_manage_users: false,
        can_manage_roles: false,
        permissions: &[
            "system",
            "system.dashboard.view",
            "system.settings",
            "content",
            "content.view",
            "content.read",
            "content.create",
            "content.edit",
            "content.delete",
            "content.publish",
            "content.moderate",
            "content.schedule",
            "content.approve",
            "content.quality_control",
            "analytics",
            "analytics.view",
            "analytics.read",
            "users",
            "users.view",
            "users.read",
            "users.view_content_users",
            "communication",
            "communication.manage",
        ],
    },
    CanonicalRole {
        name: "Editor-in-Chief",
        access_level: 7,
        is_admin: false,
        can_manage_users: false,
        can_manage_roles: false,
        permissions: &[
            "content.create",
            "content.edit",
            "content.delete",
            "content.publish",
            "content.approve",
            "content.quality_control",
            "editorial.strategy",
            "editorial.standards",
            "editorial.approvals",
        ],
    },
    CanonicalRole {
        name: "Section Editors",
        access_level: 6,
        is_admin: false,
        can_manage_users: false,
        can_manage_roles: false,
        permissions: &[
            "content.create",
            "content.edit",
            "content.delete",
            "content.publish",
            "content.section_oversight",
            "editorial.section_strategy",
            "editorial.writer_coordination",
        ],
    },
    CanonicalRole {
        name: "Senior Writers",
        access_level: 5,
        is_admin: false,
        can_manage_users: false,
        can_manage_roles: false,
        permissions: &[
            "content.create",
            "content.edit",
            "content.publish",
            "content.feature_articles",
            "content.investigative",
        ],
    },
    CanonicalRole {
        name: "Staff Writers",
        access_level: 4,
        is_admin: false,
        can_manage_users: false,
        can_manage_roles: false,
        permissions: &[
            "content.create",
            "content.edit",
            "content.publish",
            "content.daily_articles",
            "content.event_coverage",
        ],
    },
    CanonicalRole {
        name: "Contributors",
        access_level: 3,
        is_admin: false,
        can_manage_users: false,
        can_manage_roles: false,
        permissions: &["content.create", "content.submit", "content.limited_edit"],
    },
    CanonicalRole {
        name: "Reviewers",
        access_level: 2,
        is_admin: false,
        can_manage_users: false,
        can_manage_roles: false,
        permissions: &[
            "content.review",
            "content.fact_check",
            "content.quality_assurance",
            "content.approve",
        ],
    },
    CanonicalRole {
        name: "Social Media Manager",
        access_level: 1,
        is_admin: false,
        can_manage_users: false,
        can_manage_roles: false,
        permissions: &[
            "social.manage_platforms",
            "social.content_promotion",
            "social.engagement",
            "social.analytics",
        ],
    },
];

/// Canonical bundle for `role_name`, or `None` for custom roles.
///
/// Names match exactly (case and spacing included).
pub fn defaults_for(role_name: &str) -> Option<RoleDefaults> {
    CANONICAL_ROLES
        .iter()
        .find(|r| r.name == role_name)
        .map(CanonicalRole::to_defaults)
}

/// Canonical bundle for `role_name`, falling back to [`RoleDefaults::baseline`].
pub fn seed_role_from_defaults(role_name: &str) -> RoleDefaults {
    defaults_for(role_name).unwrap_or_else(RoleDefaults::baseline)
}

pub fn is_canonical(role_name: &str) -> bool {
    CANONICAL_ROLES.iter().any(|r| r.name == role_name)
}

/// Canonical role names, highest access level first.
pub fn canonical_roles() -> impl Iterator<Item = &'static str> {
    CANONICAL_ROLES.iter().map(|r| r.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::has_permission;

    #[test]
    fn contributors_bundle() {
        let defaults = seed_role_from_defaults("Contributors");
        assert_eq!(
            defaults.permissions.granted(),
            vec!["content.create", "content.limited_edit", "content.submit"]
        );
        assert!(has_permission(&defaults.permissions, "content.create"));
        assert!(!has_permission(&defaults.permissions, "content.delete"));
        assert_eq!(defaults.access_level, 3);
        assert!(!defaults.is_admin);
    }

    #[test]
    fn unknown_role_gets_baseline() {
        assert_eq!(defaults_for("Podcast Host"), None);
        assert_eq!(seed_role_from_defaults("Podcast Host"), RoleDefaults::baseline());
        // Lookup is exact: casing differences are custom roles.
        assert_eq!(defaults_for("contributors"), None);
    }

    #[test]
    fn only_top_two_roles_manage_roles() {
        let managers: Vec<&str> = canonical_roles()
            .filter(|name| seed_role_from_defaults(name).can_manage_roles)
            .collect();
        assert_eq!(managers, vec!["Master Admin", "Webmaster"]);
    }

    #[test]
    fn access_levels_descend_from_ten_to_one() {
        let levels: Vec<u8> = canonical_roles()
            .map(|name| seed_role_from_defaults(name).access_level)
            .collect();
        assert_eq!(levels, (1..=10).rev().collect::<Vec<u8>>());
    }

    #[test]
    fn canonical_bundles_are_well_formed() {
        for name in canonical_roles() {
            assert!(is_canonical(name));
            let defaults = seed_role_from_defaults(name);
            assert!(!defaults.permissions.is_empty(), "{name} has no permissions");
            for key in defaults.permissions.iter() {
                assert!(
                    crate::Permission::new(key.to_string()).is_well_formed(),
                    "{name}: malformed key {key:?}"
                );
            }
        }
    }
}
