//! `gatehouse-auth`: client-side authorization core.
//!
//! This crate is intentionally decoupled from HTTP and the DOM. Browser and
//! edge adapters plug in through [`CredentialStore`] and [`Navigator`].

pub mod bootstrap;
pub mod config;
pub mod cookie;
pub mod credentials;
pub mod error;
pub mod evaluator;
pub mod guard;
pub mod logout;
pub mod names;
pub mod record;
pub mod session;
pub mod store;

pub use bootstrap::{AuthBootstrap, AuthListener, BootstrapOutcome};
pub use config::SessionConfig;
pub use credentials::{CredentialStore, InMemoryCredentialStore};
pub use error::SessionError;
pub use evaluator::{NameQuery, has_permission, has_role};
pub use guard::{AccessRequirement, Guard, GuardState, Render, Requirement, RoleRequirement, WatchedGuard};
pub use logout::{InMemoryNavigator, LogoutFlow, LogoutOutcome, LogoutReason, Navigator};
pub use names::{NameEntry, Permission, Role};
pub use record::SessionRecord;
pub use session::AuthSession;
pub use store::{AuthorizationChange, AuthorizationSnapshot, AuthorizationStore};
