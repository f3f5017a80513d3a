//! Permission and role names, and the entry shapes they arrive in.

use std::borrow::{Borrow, Cow};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "manage_users"). No wildcard is
/// interpreted at this layer: a name matches only itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Permission {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role identifier.
///
/// Roles are opaque strings; mapping roles to permissions is the backend's
/// concern; the client only receives both lists already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Role {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of a permission or role list as delivered by the backend.
///
/// The backend sends either bare names (`"editor"`) or objects carrying a
/// `name` field (`{"id": 3, "name": "editor"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameEntry {
    Bare(String),
    Named { name: String },
}

impl NameEntry {
    /// The name as sent, or `None` for an empty entry. Names are opaque:
    /// no trimming or case folding.
    pub fn name(&self) -> Option<&str> {
        let name = match self {
            NameEntry::Bare(name) => name,
            NameEntry::Named { name } => name,
        };
        (!name.is_empty()).then_some(name.as_str())
    }

    /// Lenient conversion from arbitrary JSON.
    ///
    /// Anything that is neither a string nor an object with a string `name`
    /// (null, numbers, booleans, nested arrays) yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => Some(NameEntry::Bare(name.clone())),
            Value::Object(map) => match map.get("name") {
                Some(Value::String(name)) => Some(NameEntry::Named { name: name.clone() }),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<&str> for NameEntry {
    fn from(value: &str) -> Self {
        NameEntry::Bare(value.to_string())
    }
}

impl From<String> for NameEntry {
    fn from(value: String) -> Self {
        NameEntry::Bare(value)
    }
}

impl From<&String> for NameEntry {
    fn from(value: &String) -> Self {
        NameEntry::Bare(value.clone())
    }
}

impl From<Permission> for NameEntry {
    fn from(value: Permission) -> Self {
        NameEntry::Bare(value.as_str().to_string())
    }
}

impl From<Role> for NameEntry {
    fn from(value: Role) -> Self {
        NameEntry::Bare(value.as_str().to_string())
    }
}

/// Normalize entries into owned names, dropping empty ones.
pub(crate) fn normalize<I>(entries: I) -> impl Iterator<Item = String>
where
    I: IntoIterator,
    I::Item: Into<NameEntry>,
{
    entries
        .into_iter()
        .filter_map(|entry| entry.into().name().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_and_named_entries_normalize_to_same_name() {
        let bare = NameEntry::from("editor");
        let named: NameEntry = serde_json::from_value(json!({"name": "editor"})).unwrap();
        assert_eq!(bare.name(), Some("editor"));
        assert_eq!(named.name(), Some("editor"));
    }

    #[test]
    fn only_empty_entries_have_no_name() {
        assert_eq!(NameEntry::from("").name(), None);
        assert_eq!(NameEntry::Named { name: String::new() }.name(), None);
        assert_eq!(NameEntry::from(" admin").name(), Some(" admin"));
        assert_ne!(NameEntry::from(" admin").name(), NameEntry::from("admin").name());
    }

    #[test]
    fn from_value_is_lenient() {
        assert_eq!(
            NameEntry::from_value(&json!({"id": 1, "name": "admin"})),
            Some(NameEntry::Named { name: "admin".into() })
        );
        assert_eq!(NameEntry::from_value(&json!(null)), None);
        assert_eq!(NameEntry::from_value(&json!(42)), None);
        assert_eq!(NameEntry::from_value(&json!({"id": 1})), None);
        assert_eq!(NameEntry::from_value(&json!({"name": 5})), None);
    }

    #[test]
    fn permission_set_lookup_by_str() {
        let set: std::collections::HashSet<Permission> =
            [Permission::new("manage_users")].into_iter().collect();
        assert!(set.contains("manage_users"));
        assert!(!set.contains("view_reports"));
    }
}
