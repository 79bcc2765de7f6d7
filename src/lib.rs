#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # tutorgate
//!
//! Access and rate-limit gate for a subscription-tiered Bitcoin tutor chat.
//!
//! ## Features
//!
//! - **Fixed-window message limits** per user, persisted across restarts
//! - **Privilege bypass** for administrators and active premium subscribers,
//!   recomputed on every call
//! - **Graceful degradation**: storage failures never reach the caller
//! - **Chat orchestration** with check-then-send-then-increment ordering
//! - **Telemetry** via `tower::Service` sinks
//!
//! ## Quick Start
//!
//! ```rust
//! use tutorgate::prelude::*;
//!
//! let session = SessionHandle::signed_in(User::new("u1"));
//! let subscription = SubscriptionHandle::with_subscription(Subscription::free());
//! let store = ChatLimitStore::new(
//!     MemoryStorage::new(),
//!     session.clone(),
//!     subscription.clone(),
//!     LimitPolicy::daily(),
//! );
//!
//! assert!(store.check_limit("u1"));
//! store.increment_count("u1");
//! assert_eq!(store.remaining_messages("u1"), Remaining::Limited(4));
//!
//! subscription.set(Subscription::premium());
//! assert_eq!(store.remaining_messages("u1"), Remaining::Unlimited);
//! ```

pub mod access;
pub mod chat;
pub mod clock;
pub mod config;
pub mod error;
pub mod prelude;
pub mod rate_limit;
pub mod telemetry;

// Re-exports
pub use access::{
    AccessGate, SessionHandle, SessionLookup, Subscription, SubscriptionHandle,
    SubscriptionLookup, SubscriptionStatus, SubscriptionTier, User,
};
pub use chat::{ChatOrchestrator, CompletionClient, Message};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GateConfig;
pub use error::{ChatError, ConfigError, StorageError};
pub use rate_limit::{
    ChatLimitStore, LimitPolicy, LimitStorage, MemoryStorage, MessageLimiter, RateLimitRecord,
    Remaining,
};
