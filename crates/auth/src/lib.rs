//! `masthead-auth` — the magazine CMS access core.
//!
//! Decides whether a subject holds a permission, whether a login attempt is
//! currently allowed, and whether an MFA backup code is still good. It is
//! decoupled from HTTP and storage: persistence, clocks and password hashing
//! come in through the traits in [`ports`] and [`lifecycle`].

pub mod backup_codes;
pub mod config;
pub mod defaults;
pub mod lifecycle;
pub mod lockout;
pub mod login;
pub mod permissions;
pub mod ports;
pub mod resolver;
pub mod roles;
pub mod subject;

pub use backup_codes::{consume_backup_code, issue_backup_codes, DEFAULT_BACKUP_CODE_COUNT};
pub use crate::config::{AccountKind, LockoutConfig, SecurityConfig};
pub use defaults::{defaults_for, seed_role_from_defaults, RoleDefaults, REGISTRY_VERSION};
pub use lifecycle::{prepare_for_create, prepare_for_save, verify_password, HashError, Hasher};
pub use lockout::{is_locked_out, login_state, record_attempt, LockoutPolicy, LoginState};
pub use login::{LoginCoordinator, LoginError, LoginOutcome};
pub use permissions::{Permission, PermissionSet};
pub use ports::{Clock, FixedClock, RepositoryError, RoleRepository, SubjectRepository, SystemClock};
pub use resolver::{authorize, has_any_permission, has_permission, resolve, AuthzError, Grant};
pub use roles::{NewRole, Role};
pub use subject::{PendingPassword, Subject};
