//! Privilege and feature access decisions.
//!
//! The gate never caches: both lookups are consulted on every call, because sign-in and
//! subscription state can change between two messages.
//!
//! - [`SessionLookup`]: who is signed in, and whether they are an administrator.
//! - [`SubscriptionLookup`]: the current subscription tier and status.
//! - [`AccessGate`]: combines the two into the privilege predicate used by the
//!   rate limit store, and into per-feature checks.

pub mod session;
pub mod subscription;

pub use session::{SessionHandle, SessionLookup, User};
pub use subscription::{
    Subscription, SubscriptionHandle, SubscriptionLookup, SubscriptionStatus, SubscriptionTier,
};

/// Features that require an active premium subscription.
pub const PREMIUM_FEATURES: &[&str] =
    &["ai-chat", "wallet-simulator", "node-simulator", "development", "premium-courses"];

/// Evaluates privilege and feature access from the injected lookups.
#[derive(Debug, Clone)]
pub struct AccessGate<S, P> {
    session: S,
    subscription: P,
}

impl<S, P> AccessGate<S, P>
where
    S: SessionLookup,
    P: SubscriptionLookup,
{
    pub fn new(session: S, subscription: P) -> Self {
        Self { session, subscription }
    }

    /// Exempt from rate limiting: an administrator, or an active premium subscriber.
    pub fn is_privileged(&self) -> bool {
        if self.session.current_user().is_some_and(|u| u.is_admin) {
            return true;
        }
        self.subscription.current_subscription().is_some_and(|s| s.is_active_premium())
    }

    /// Whether the current session may use `feature`.
    pub fn check_access(&self, feature: &str) -> bool {
        if self.session.current_user().is_some_and(|u| u.is_admin) {
            return true;
        }
        if !PREMIUM_FEATURES.contains(&feature) {
            return true;
        }
        self.subscription.current_subscription().is_some_and(|s| s.is_active_premium())
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn subscription(&self) -> &P {
        &self.subscription
    }
}
