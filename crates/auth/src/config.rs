//! Security settings loaded from defaults plus `MASTHEAD_*` environment
//! variables (`MASTHEAD_ADMIN_LOCKOUT__THRESHOLD=3`, ...).

use chrono::Duration;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::lockout::LockoutPolicy;

const MAX_LOCKOUT_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LockoutConfig {
    /// Failures before the account locks.
    pub threshold: u32,
    /// Lockout window in seconds.
    pub duration_secs: u64,
}

impl LockoutConfig {
    pub fn policy(&self) -> LockoutPolicy {
        // `validate` bounds duration_secs, so the cast cannot wrap.
        LockoutPolicy::new(self.threshold, Duration::seconds(self.duration_secs as i64))
    }

    fn validate(&self, which: &str) -> Result<(), ConfigError> {
        if !(1..=20).contains(&self.threshold) {
            return Err(ConfigError::Message(format!(
                "{which}.threshold must be between 1 and 20"
            )));
        }
        if self.duration_secs == 0 || self.duration_secs > MAX_LOCKOUT_SECS {
            return Err(ConfigError::Message(format!(
                "{which}.duration_secs must be between 1 and {MAX_LOCKOUT_SECS}"
            )));
        }
        Ok(())
    }
}

/// Which lockout policy an account falls under.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Admin,
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecurityConfig {
    /// Lockout for admin accounts.
    pub admin_lockout: LockoutConfig,
    /// Lockout for member (site user) accounts.
    pub member_lockout: LockoutConfig,
    /// Codes per backup-code batch.
    pub backup_code_count: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            admin_lockout: LockoutConfig {
                threshold: 5,
                duration_secs: 15 * 60,
            },
            member_lockout: LockoutConfig {
                threshold: 5,
                duration_secs: 30 * 60,
            },
            backup_code_count: crate::backup_codes::DEFAULT_BACKUP_CODE_COUNT,
        }
    }
}

impl SecurityConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("admin_lockout.threshold", defaults.admin_lockout.threshold)?
            .set_default("admin_lockout.duration_secs", defaults.admin_lockout.duration_secs)?
            .set_default("member_lockout.threshold", defaults.member_lockout.threshold)?
            .set_default("member_lockout.duration_secs", defaults.member_lockout.duration_secs)?
            .set_default("backup_code_count", defaults.backup_code_count as u64)?
            .add_source(
                Environment::with_prefix("MASTHEAD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: SecurityConfig = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.admin_lockout.validate("admin_lockout")?;
        self.member_lockout.validate("member_lockout")?;
        if !(1..=100).contains(&self.backup_code_count) {
            return Err(ConfigError::Message(
                "backup_code_count must be between 1 and 100".to_string(),
            ));
        }
        Ok(())
    }

    pub fn admin_policy(&self) -> LockoutPolicy {
        self.admin_lockout.policy()
    }

    pub fn member_policy(&self) -> LockoutPolicy {
        self.member_lockout.policy()
    }

    pub fn policy_for(&self, kind: AccountKind) -> LockoutPolicy {
        match kind {
            AccountKind::Admin => self.admin_policy(),
            AccountKind::Member => self.member_policy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "MASTHEAD_ADMIN_LOCKOUT__THRESHOLD",
        "MASTHEAD_ADMIN_LOCKOUT__DURATION_SECS",
        "MASTHEAD_MEMBER_LOCKOUT__THRESHOLD",
        "MASTHEAD_MEMBER_LOCKOUT__DURATION_SECS",
        "MASTHEAD_BACKUP_CODE_COUNT",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: tests touching the environment are serialized.
            unsafe { std::env::remove_var(var) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: tests touching the environment are serialized.
        unsafe { std::env::set_var(key, value) };
    }

    #[test]
    #[serial]
    fn defaults_match_observed_policies() {
        clear_env();
        let config = SecurityConfig::from_env().unwrap();
        assert_eq!(config, SecurityConfig::default());
        assert_eq!(config.admin_policy(), LockoutPolicy::admin());
        assert_eq!(config.member_policy(), LockoutPolicy::member());
        assert_eq!(config.policy_for(AccountKind::Admin), LockoutPolicy::admin());
        assert_eq!(config.policy_for(AccountKind::Member), LockoutPolicy::member());
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        clear_env();
        set_env("MASTHEAD_ADMIN_LOCKOUT__THRESHOLD", "3");
        set_env("MASTHEAD_MEMBER_LOCKOUT__DURATION_SECS", "600");
        set_env("MASTHEAD_BACKUP_CODE_COUNT", "12");

        let config = SecurityConfig::from_env().unwrap();
        assert_eq!(config.admin_lockout.threshold, 3);
        assert_eq!(config.member_policy().duration, Duration::minutes(10));
        assert_eq!(config.backup_code_count, 12);
        clear_env();
    }

    #[test]
    #[serial]
    fn rejects_out_of_range_values() {
        clear_env();
        set_env("MASTHEAD_ADMIN_LOCKOUT__THRESHOLD", "0");
        assert!(SecurityConfig::from_env().is_err());
        clear_env();

        set_env("MASTHEAD_MEMBER_LOCKOUT__DURATION_SECS", "0");
        assert!(SecurityConfig::from_env().is_err());
        clear_env();

        set_env("MASTHEAD_BACKUP_CODE_COUNT", "1000");
        assert!(SecurityConfig::from_env().is_err());
        clear_env();
    }
}
