use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Subscription tier as stored in the `subscriptions` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
}

/// Billing status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    Expired,
    #[default]
    None,
}

/// A user's subscription record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Subscription {
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_price_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_subscription_id: Option<String>,
}

impl Subscription {
    /// Free tier with no billing relationship; what signed-out users get.
    pub fn free() -> Self {
        Self::default()
    }

    /// Active premium subscription.
    pub fn premium() -> Self {
        Self::with(SubscriptionTier::Premium, SubscriptionStatus::Active)
    }

    pub fn with(tier: SubscriptionTier, status: SubscriptionStatus) -> Self {
        Self { tier, status, ..Self::default() }
    }

    /// Premium tier and currently active. Canceled or expired premium does not count.
    pub fn is_active_premium(&self) -> bool {
        self.tier == SubscriptionTier::Premium && self.status == SubscriptionStatus::Active
    }
}

/// Capability to look up the current session's subscription.
pub trait SubscriptionLookup: Send + Sync {
    fn current_subscription(&self) -> Option<Subscription>;
}

impl<T: SubscriptionLookup + ?Sized> SubscriptionLookup for Arc<T> {
    fn current_subscription(&self) -> Option<Subscription> {
        (**self).current_subscription()
    }
}

/// Live-updatable subscription holder. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionHandle {
    inner: Arc<ArcSwapOption<Subscription>>,
}

impl SubscriptionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscription(subscription: Subscription) -> Self {
        let handle = Self::new();
        handle.set(subscription);
        handle
    }

    pub fn set(&self, subscription: Subscription) {
        tracing::debug!(
            tier = ?subscription.tier,
            status = ?subscription.status,
            "subscription updated"
        );
        self.inner.store(Some(Arc::new(subscription)));
    }

    /// Mark the current subscription canceled, keeping its tier.
    pub fn cancel(&self) {
        if let Some(cur) = self.inner.load_full() {
            let mut next = (*cur).clone();
            next.status = SubscriptionStatus::Canceled;
            self.inner.store(Some(Arc::new(next)));
        }
    }

    pub fn clear(&self) {
        self.inner.store(None);
    }
}

impl SubscriptionLookup for SubscriptionHandle {
    fn current_subscription(&self) -> Option<Subscription> {
        self.inner.load_full().map(|s| (*s).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_active_premium_counts() {
        assert!(Subscription::premium().is_active_premium());
        assert!(!Subscription::free().is_active_premium());
        assert!(!Subscription::with(SubscriptionTier::Premium, SubscriptionStatus::Canceled)
            .is_active_premium());
        assert!(!Subscription::with(SubscriptionTier::Premium, SubscriptionStatus::Expired)
            .is_active_premium());
        assert!(!Subscription::with(SubscriptionTier::Free, SubscriptionStatus::Active)
            .is_active_premium());
    }

    #[test]
    fn parses_table_row() {
        let row = r#"{
            "tier": "premium",
            "status": "active",
            "start_date": "2024-01-01T00:00:00Z",
            "stripe_customer_id": "cus_123",
            "stripe_price_id": "price_456"
        }"#;
        let sub: Subscription = serde_json::from_str(row).unwrap();
        assert!(sub.is_active_premium());
        assert_eq!(sub.stripe_customer_id.as_deref(), Some("cus_123"));
        assert!(sub.end_date.is_none());
    }

    #[test]
    fn cancel_keeps_tier() {
        let handle = SubscriptionHandle::with_subscription(Subscription::premium());
        handle.cancel();
        let sub = handle.current_subscription().unwrap();
        assert_eq!(sub.tier, SubscriptionTier::Premium);
        assert_eq!(sub.status, SubscriptionStatus::Canceled);

        handle.clear();
        handle.cancel();
        assert!(handle.current_subscription().is_none());
    }
}
