use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The signed-in user as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), email: None, created_at: None, is_admin: false }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self { is_admin: true, ..Self::new(id) }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Capability to look up the current session's user.
///
/// Returns `None` when signed out. Called on every gate decision, so implementations
/// should be cheap.
pub trait SessionLookup: Send + Sync {
    fn current_user(&self) -> Option<User>;
}

impl<T: SessionLookup + ?Sized> SessionLookup for Arc<T> {
    fn current_user(&self) -> Option<User> {
        (**self).current_user()
    }
}

/// Live-updatable session holder.
///
/// Clones share state, so the host can keep one handle to update on sign-in/sign-out
/// and hand another to the gate.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<ArcSwapOption<User>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        let handle = Self::new();
        handle.sign_in(user);
        handle
    }

    pub fn sign_in(&self, user: User) {
        tracing::debug!(user_id = %user.id, admin = user.is_admin, "session signed in");
        self.inner.store(Some(Arc::new(user)));
    }

    pub fn sign_out(&self) {
        self.inner.store(None);
    }
}

impl SessionLookup for SessionHandle {
    fn current_user(&self) -> Option<User> {
        self.inner.load_full().map(|u| (*u).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_clones_share_state() {
        let handle = SessionHandle::new();
        let gate_side = handle.clone();
        assert!(gate_side.current_user().is_none());

        handle.sign_in(User::admin("a1").with_email("a1@example.com"));
        let user = gate_side.current_user().unwrap();
        assert_eq!(user.id, "a1");
        assert!(user.is_admin);

        handle.sign_out();
        assert!(gate_side.current_user().is_none());
    }

    #[test]
    fn user_deserializes_with_defaults() {
        let user: User = serde_json::from_str(r#"{"id":"u1"}"#).unwrap();
        assert_eq!(user, User::new("u1"));
    }
}
