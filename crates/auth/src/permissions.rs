use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are dot-delimited hierarchical strings (e.g. `"content.edit"`).
/// A trailing `.*` segment (e.g. `"content.*"`) marks a wildcard grant that
/// covers everything below its prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str().ends_with(".*")
    }

    /// Dot-separated segments, or `None` when the string is empty or contains
    /// an empty segment (`"content..edit"`, `".content"`, `"content."`).
    pub fn segments(&self) -> Option<Vec<&str>> {
        segments(self.as_str())
    }

    pub fn is_well_formed(&self) -> bool {
        self.segments().is_some()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

pub(crate) fn segments(raw: &str) -> Option<Vec<&str>> {
    if raw.is_empty() {
        return None;
    }
    let parts: Vec<&str> = raw.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts)
}

/// A set of granted permission keys.
///
/// Stored and exchanged as a `key -> true` map. `false` entries carry no
/// meaning and are dropped on the way in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, bool>", into = "BTreeMap<String, bool>")]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, key: impl Into<String>) {
        self.0.insert(key.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Granted keys in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Granted keys in lexical order, owned (audit listings, API payloads).
    pub fn granted(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// Set union. A key granted by either side is granted in the result;
    /// nothing is ever removed.
    pub fn union(&self, other: &PermissionSet) -> PermissionSet {
        Self(self.0.union(&other.0).cloned().collect())
    }

    /// First granted key strictly below `bucket` (i.e. starting with
    /// `bucket + "."`), if any.
    pub fn first_under(&self, bucket: &str) -> Option<&str> {
        let prefix = format!("{bucket}.");
        self.0
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .next()
            .filter(|k| k.starts_with(&prefix))
            .map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, bool>> for PermissionSet {
    fn from(value: BTreeMap<String, bool>) -> Self {
        Self(
            value
                .into_iter()
                .filter_map(|(k, granted)| granted.then_some(k))
                .collect(),
        )
    }
}

impl From<PermissionSet> for BTreeMap<String, bool> {
    fn from(value: PermissionSet) -> Self {
        value.0.into_iter().map(|k| (k, true)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_strings_have_no_segments() {
        for raw in ["", ".", "content..edit", ".content", "content."] {
            assert!(segments(raw).is_none(), "{raw:?} should be malformed");
        }
        assert_eq!(segments("content.edit"), Some(vec!["content", "edit"]));
    }

    #[test]
    fn wildcard_detection() {
        assert!(Permission::new("content.*").is_wildcard());
        assert!(!Permission::new("content").is_wildcard());
        assert!(!Permission::new("*").is_wildcard());
    }

    #[test]
    fn false_entries_are_dropped_on_deserialize() {
        let set: PermissionSet =
            serde_json::from_str(r#"{"content.create": true, "content.delete": false}"#).unwrap();
        assert!(set.contains("content.create"));
        assert!(!set.contains("content.delete"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn serializes_as_true_map() {
        let set: PermissionSet = ["users.view", "content"].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"content":true,"users.view":true}"#);
    }

    #[test]
    fn union_only_adds() {
        let role: PermissionSet = ["content.create"].into_iter().collect();
        let overrides: PermissionSet = ["content.delete"].into_iter().collect();
        let merged = role.union(&overrides);
        assert_eq!(merged.granted(), vec!["content.create", "content.delete"]);
    }

    #[test]
    fn first_under_respects_segment_boundary() {
        let set: PermissionSet = ["contentious", "content.create"].into_iter().collect();
        assert_eq!(set.first_under("content"), Some("content.create"));

        let only_lookalike: PermissionSet = ["contentious", "content"].into_iter().collect();
        assert_eq!(only_lookalike.first_under("content"), None);
    }
}
