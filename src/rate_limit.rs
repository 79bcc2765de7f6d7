//! Chat message rate limiting.
//!
//! This module provides the building blocks for limiting how many chat messages a
//! subject may send:
//! - [`MessageLimiter`]: the interface the chat orchestrator talks to.
//! - [`ChatLimitStore`]: fixed-window implementation with privilege bypass.
//! - [`LimitPolicy`]: window length and per-window limit.
//! - [`LimitStorage`]: persistence seam, with [`MemoryStorage`] in this crate and a
//!   file-backed store in `tutorgate-fs`.
//!
//! # Lifecycle
//!
//! Per subject: no record, then active (`count < limit`), then at limit
//! (`count == limit`). When the window expires the subject reads as "no record" again,
//! and the next counted message overwrites the old window.
//!
//! This is a client-side soft limit, not a security boundary.

use std::fmt;

pub mod policy;
pub mod store;
pub mod window;

pub use policy::LimitPolicy;
pub use store::{LimitSnapshot, LimitStorage, MemoryStorage, WindowEntry, NAMESPACE};
pub use window::ChatLimitStore;

/// Messages a subject may still send in the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    /// Privileged subjects are never counted.
    Unlimited,
    Limited(u32),
}

impl Remaining {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Remaining::Unlimited)
    }

    /// `None` for unlimited.
    pub fn count(&self) -> Option<u32> {
        match self {
            Remaining::Unlimited => None,
            Remaining::Limited(n) => Some(*n),
        }
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remaining::Unlimited => write!(f, "unlimited"),
            Remaining::Limited(n) => write!(f, "{}", n),
        }
    }
}

/// Expiry-aware view of one subject's counting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub subject_id: String,
    /// Milliseconds since the Unix epoch.
    pub window_start: u64,
    pub count: u32,
    pub window_limit: u32,
}

/// Core interface for per-subject message limiting.
///
/// Decisions are synchronous and must be made before the outbound request is dispatched.
pub trait MessageLimiter: Send + Sync {
    /// `true` if the subject may send another message now.
    fn check_limit(&self, subject_id: &str) -> bool;

    /// Record one sent message.
    fn increment_count(&self, subject_id: &str);

    fn remaining_messages(&self, subject_id: &str) -> Remaining;

    /// Whether the current session bypasses limiting.
    fn is_privileged(&self) -> bool;
}

impl<T: MessageLimiter + ?Sized> MessageLimiter for std::sync::Arc<T> {
    fn check_limit(&self, subject_id: &str) -> bool {
        (**self).check_limit(subject_id)
    }

    fn increment_count(&self, subject_id: &str) {
        (**self).increment_count(subject_id)
    }

    fn remaining_messages(&self, subject_id: &str) -> Remaining {
        (**self).remaining_messages(subject_id)
    }

    fn is_privileged(&self) -> bool {
        (**self).is_privileged()
    }
}

#[cfg(test)]
mod tests {
    use super::Remaining;

    #[test]
    fn remaining_display_and_count() {
        assert_eq!(Remaining::Unlimited.to_string(), "unlimited");
        assert_eq!(Remaining::Limited(3).to_string(), "3");
        assert_eq!(Remaining::Limited(3).count(), Some(3));
        assert!(Remaining::Unlimited.count().is_none());
        assert!(Remaining::Unlimited.is_unlimited());
    }
}
