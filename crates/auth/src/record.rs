//! Persisted session record (the serialized user object in client storage).

use serde_json::Value;

use crate::error::SessionError;
use crate::names::NameEntry;

/// The authorization-relevant part of the persisted user record.
///
/// Only `permissions` and `roles` are read; every other field the backend
/// sends (id, email, display name…) is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
    pub permissions: Vec<NameEntry>,
    pub roles: Vec<NameEntry>,
}

impl SessionRecord {
    /// Parse the raw stored string.
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| SessionError::malformed(format!("invalid json: {e}")))?;
        Self::from_value(&value)
    }

    /// Extract from an already-decoded user object.
    ///
    /// The record must be an object with `permissions` and `roles` arrays.
    /// Individual entries that are neither names nor `{name}` objects are
    /// dropped, not rejected.
    pub fn from_value(value: &Value) -> Result<Self, SessionError> {
        let object = value
            .as_object()
            .ok_or_else(|| SessionError::malformed("record is not an object"))?;

        Ok(Self {
            permissions: entries(object.get("permissions"), "permissions")?,
            roles: entries(object.get("roles"), "roles")?,
        })
    }

    pub fn permission_names(&self) -> Vec<&str> {
        self.permissions.iter().filter_map(NameEntry::name).collect()
    }

    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().filter_map(NameEntry::name).collect()
    }
}

fn entries(field: Option<&Value>, label: &str) -> Result<Vec<NameEntry>, SessionError> {
    match field {
        Some(Value::Array(items)) => Ok(items.iter().filter_map(NameEntry::from_value).collect()),
        Some(_) => Err(SessionError::malformed(format!("`{label}` is not an array"))),
        None => Err(SessionError::malformed(format!("`{label}` is missing"))),
    }
}
