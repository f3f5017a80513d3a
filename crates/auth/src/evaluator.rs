//! Permission evaluator: pure predicates over a store snapshot.
//!
//! - No IO
//! - No panics
//! - Unknown names evaluate to `false`
//!
//! List queries are disjunctive: holding any one listed name is enough.

use crate::store::AuthorizationSnapshot;

/// A single name or an "any of" list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameQuery {
    One(String),
    Any(Vec<String>),
}

impl NameQuery {
    pub fn any<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NameQuery::Any(names.into_iter().map(Into::into).collect())
    }

    /// True when the query names nothing (empty name, empty list, or a list
    /// of empty names).
    pub fn is_empty(&self) -> bool {
        self.names().next().is_none()
    }

    /// Non-empty names in the query.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let names: Box<dyn Iterator<Item = &String> + '_> = match self {
            NameQuery::One(name) => Box::new(std::iter::once(name)),
            NameQuery::Any(names) => Box::new(names.iter()),
        };
        names.map(String::as_str).filter(|n| !n.is_empty())
    }

    fn matches(&self, contains: impl Fn(&str) -> bool) -> bool {
        self.names().any(contains)
    }
}

impl From<&str> for NameQuery {
    fn from(value: &str) -> Self {
        NameQuery::One(value.to_string())
    }
}

impl From<String> for NameQuery {
    fn from(value: String) -> Self {
        NameQuery::One(value)
    }
}

impl From<&String> for NameQuery {
    fn from(value: &String) -> Self {
        NameQuery::One(value.clone())
    }
}

impl From<Vec<String>> for NameQuery {
    fn from(value: Vec<String>) -> Self {
        NameQuery::Any(value)
    }
}

impl From<Vec<&str>> for NameQuery {
    fn from(value: Vec<&str>) -> Self {
        NameQuery::any(value)
    }
}

impl From<&[&str]> for NameQuery {
    fn from(value: &[&str]) -> Self {
        NameQuery::any(value.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for NameQuery {
    fn from(value: [&str; N]) -> Self {
        NameQuery::any(value)
    }
}

impl From<&NameQuery> for NameQuery {
    fn from(value: &NameQuery) -> Self {
        value.clone()
    }
}

/// Does the actor hold the permission (or any of the listed permissions)?
pub fn has_permission(snapshot: &AuthorizationSnapshot, query: impl Into<NameQuery>) -> bool {
    query.into().matches(|name| snapshot.contains_permission(name))
}

/// Does the actor hold the role (or any of the listed roles)?
pub fn has_role(snapshot: &AuthorizationSnapshot, query: impl Into<NameQuery>) -> bool {
    query.into().matches(|name| snapshot.contains_role(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn snapshot(perms: &[&str], roles: &[&str]) -> AuthorizationSnapshot {
        AuthorizationSnapshot::new(perms.iter().copied(), roles.iter().copied())
    }

    #[test]
    fn single_name_is_membership() {
        let s = snapshot(&["manage_users"], &["editor"]);
        assert!(has_permission(&s, "manage_users"));
        assert!(!has_permission(&s, "view_reports"));
        assert!(has_role(&s, "editor"));
        assert!(!has_role(&s, "admin"));
    }

    #[test]
    fn list_is_disjunctive() {
        let s = snapshot(&["view_reports"], &[]);
        assert!(has_permission(&s, ["manage_users", "view_reports"]));
        assert!(!has_permission(&s, ["manage_users", "delete_users"]));
    }

    #[test]
    fn empty_list_is_false() {
        let s = snapshot(&["a"], &["r"]);
        assert!(!has_permission(&s, Vec::<String>::new()));
        assert!(!has_role(&s, NameQuery::Any(vec![String::new()])));
    }

    #[test]
    fn permission_and_role_namespaces_are_separate() {
        let s = snapshot(&["admin"], &[]);
        assert!(!has_role(&s, "admin"));
    }

    #[test]
    fn cleared_snapshot_denies_everything() {
        let s = AuthorizationSnapshot::default();
        assert!(!has_permission(&s, "anything"));
        assert!(!has_role(&s, ["a", "b"]));
    }

    fn name() -> impl Strategy<Value = String> {
        "[a-z_]{1,8}"
    }

    proptest! {
        #[test]
        fn single_query_matches_membership(
            perms in proptest::collection::hash_set(name(), 0..8),
            query in name(),
        ) {
            let s = AuthorizationSnapshot::new(perms.iter().cloned(), Vec::<String>::new());
            prop_assert_eq!(has_permission(&s, query.as_str()), perms.contains(&query));
        }

        #[test]
        fn list_query_matches_any_member(
            perms in proptest::collection::hash_set(name(), 0..8),
            queries in proptest::collection::vec(name(), 0..6),
        ) {
            let s = AuthorizationSnapshot::new(perms.iter().cloned(), Vec::<String>::new());
            let expected = queries.iter().any(|q| perms.contains(q));
            prop_assert_eq!(has_permission(&s, queries.clone()), expected);
        }

        #[test]
        fn evaluation_is_repeatable(
            roles in proptest::collection::hash_set(name(), 0..8),
            query in name(),
        ) {
            let s = AuthorizationSnapshot::new(Vec::<String>::new(), roles.iter().cloned());
            prop_assert_eq!(has_role(&s, query.as_str()), has_role(&s, query.as_str()));
        }

        #[test]
        fn mixed_shapes_are_idempotent(
            names in proptest::collection::vec(name(), 0..8),
            probe in name(),
        ) {
            use crate::names::NameEntry;
            use crate::store::AuthorizationStore;

            let bare: Vec<NameEntry> = names.iter().map(NameEntry::from).collect();
            let named: Vec<NameEntry> = names
                .iter()
                .map(|n| NameEntry::Named { name: n.clone() })
                .collect();

            let store = AuthorizationStore::new();
            store.set_actor_authorization(bare.clone(), bare);
            let first = store.snapshot();
            store.set_actor_authorization(named.clone(), named);
            let second = store.snapshot();

            prop_assert!(first.same_grants(&second));
            prop_assert_eq!(has_permission(&first, probe.as_str()), has_permission(&second, probe.as_str()));
            let expected: HashSet<&str> = names.iter().map(String::as_str).collect();
            prop_assert_eq!(second.permission_names().into_iter().collect::<HashSet<_>>(), expected);
        }

        #[test]
        fn clear_denies_every_name(
            perms in proptest::collection::vec(name(), 0..8),
            probe in name(),
        ) {
            use crate::store::AuthorizationStore;

            let store = AuthorizationStore::new();
            store.set_actor_authorization(perms.clone(), perms);
            store.clear();
            prop_assert!(!store.has_permission(probe.as_str()));
            prop_assert!(!store.has_role(probe.as_str()));
        }
    }
}
