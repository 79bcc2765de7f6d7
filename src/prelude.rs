//! Convenient re-exports for common tutorgate types.
pub use crate::{
    access::{
        AccessGate, SessionHandle, SessionLookup, Subscription, SubscriptionHandle,
        SubscriptionLookup, SubscriptionStatus, SubscriptionTier, User,
    },
    chat::{AiModel, ChatOrchestrator, CompletionClient, Message},
    clock::{Clock, ManualClock, SystemClock},
    config::GateConfig,
    error::{ChatError, ConfigError, StorageError},
    rate_limit::{
        ChatLimitStore, LimitPolicy, LimitSnapshot, LimitStorage, MemoryStorage, MessageLimiter,
        RateLimitRecord, Remaining,
    },
    telemetry::{GateEvent, LogSink, MemorySink, NullSink, TelemetrySink},
};
