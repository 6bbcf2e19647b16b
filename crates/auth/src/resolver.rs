//! Permission resolution against an effective permission set.
//!
//! - No IO
//! - No panics, malformed queries resolve to "not granted"
//! - Pure function of its inputs

use serde::Serialize;
use thiserror::Error;

use crate::permissions::{segments, Permission, PermissionSet};

/// Which rule granted a permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "key", rename_all = "snake_case")]
pub enum Grant {
    /// The queried key itself is granted.
    Exact,
    /// A wildcard ancestor (`content.*`) covers the query.
    Wildcard(String),
    /// The query is a bucket and this key below it is granted.
    Bucket(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Resolve `query` against `effective`, reporting the rule that matched.
///
/// Rules are tried in order, first match wins:
/// 1. exact key,
/// 2. nearest-first wildcard ancestor (`a.b.*`, then `a.*`),
/// 3. any granted key below the query (`content.create` grants `content`).
pub fn resolve(effective: &PermissionSet, query: &str) -> Option<Grant> {
    let parts = segments(query)?;

    if effective.contains(query) {
        return Some(Grant::Exact);
    }

    for depth in (1..parts.len()).rev() {
        let wildcard = format!("{}.*", parts[..depth].join("."));
        if effective.contains(&wildcard) {
            return Some(Grant::Wildcard(wildcard));
        }
    }

    effective
        .first_under(query)
        .map(|key| Grant::Bucket(key.to_string()))
}

/// Does the effective set grant `query`?
pub fn has_permission(effective: &PermissionSet, query: &str) -> bool {
    let grant = resolve(effective, query);
    tracing::debug!(permission = query, granted = grant.is_some(), ?grant, "permission check");
    grant.is_some()
}

/// True iff at least one of `queries` is granted.
pub fn has_any_permission<'a, I>(effective: &PermissionSet, queries: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    queries.into_iter().any(|q| has_permission(effective, q))
}

/// `Result`-shaped check for request boundaries.
pub fn authorize(effective: &PermissionSet, required: &Permission) -> Result<Grant, AuthzError> {
    resolve(effective, required.as_str())
        .ok_or_else(|| AuthzError::Forbidden(required.as_str().to_string()))
}
