use crate::access::{AccessGate, SessionLookup, SubscriptionLookup};
use crate::clock::{Clock, SystemClock};
use crate::rate_limit::store::{LimitSnapshot, LimitStorage, WindowEntry};
use crate::rate_limit::{LimitPolicy, MessageLimiter, RateLimitRecord, Remaining};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Fixed-window message limiter for chat subjects.
///
/// Privileged subjects (admins, active premium) bypass counting entirely. Everyone else
/// gets `window_limit` messages per window; the window starts with the first counted
/// message and expires `policy.window()` later.
///
/// State is loaded from `storage` once at construction and written back after every
/// change. Storage failures are logged and otherwise ignored: the worst case is an
/// allowance that resets when the process restarts.
pub struct ChatLimitStore<St, S, P> {
    storage: St,
    gate: AccessGate<S, P>,
    policy: LimitPolicy,
    window_limit: AtomicU32,
    clock: Arc<dyn Clock>,
    state: Mutex<LimitSnapshot>,
}

impl<St, S, P> ChatLimitStore<St, S, P>
where
    St: LimitStorage,
    S: SessionLookup,
    P: SubscriptionLookup,
{
    /// Create a store backed by `storage`, using the operator override for the window
    /// limit when the storage has one.
    pub fn new(storage: St, session: S, subscription: P, policy: LimitPolicy) -> Self {
        let state = match storage.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "rate limit state unreadable; starting empty");
                LimitSnapshot::default()
            }
        };
        let window_limit = Self::read_override(&storage).unwrap_or(policy.limit());
        Self {
            storage,
            gate: AccessGate::new(session, subscription),
            policy,
            window_limit: AtomicU32::new(window_limit),
            clock: Arc::new(SystemClock),
            state: Mutex::new(state),
        }
    }

    /// Replace the clock (tests, or hosts with their own time source).
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn policy(&self) -> LimitPolicy {
        self.policy
    }

    /// Effective per-window limit (policy default or operator override).
    pub fn window_limit(&self) -> u32 {
        self.window_limit.load(Ordering::Relaxed)
    }

    pub fn gate(&self) -> &AccessGate<S, P> {
        &self.gate
    }

    /// Re-read the operator override. Falls back to the policy default when the override
    /// is absent or unreadable.
    pub fn reload_override(&self) -> u32 {
        let limit = Self::read_override(&self.storage).unwrap_or(self.policy.limit());
        self.window_limit.store(limit, Ordering::Relaxed);
        limit
    }

    /// Whether `subject_id` may send a message now.
    pub fn check_limit(&self, subject_id: &str) -> bool {
        if subject_id.is_empty() {
            tracing::debug!("rate limit check for empty subject denied");
            return false;
        }
        if self.gate.is_privileged() {
            return true;
        }
        let count = self.live_count(subject_id);
        let allowed = count < self.window_limit();
        tracing::debug!(subject = subject_id, count, allowed, "rate limit check");
        allowed
    }

    /// Record one sent message for `subject_id`.
    pub fn increment_count(&self, subject_id: &str) {
        if subject_id.is_empty() || self.gate.is_privileged() {
            return;
        }
        let now = self.clock.now_millis();
        let limit = self.window_limit();
        let key = self.policy.storage_key(subject_id);

        let mut state = self.lock_state();
        match state.limits.get_mut(&key) {
            Some(entry) if !self.policy.is_expired(entry.window_start, now) => {
                if entry.count < limit {
                    entry.count += 1;
                }
            }
            _ => {
                state.limits.insert(key, WindowEntry { count: 1, window_start: now });
            }
        }
        self.persist(&state);
    }

    /// Messages left in the current window.
    pub fn remaining_messages(&self, subject_id: &str) -> Remaining {
        if subject_id.is_empty() {
            return Remaining::Limited(0);
        }
        if self.gate.is_privileged() {
            return Remaining::Unlimited;
        }
        Remaining::Limited(self.window_limit().saturating_sub(self.live_count(subject_id)))
    }

    /// Expiry-aware view of the subject's record. `None` when there is no record or
    /// its window has expired.
    pub fn record(&self, subject_id: &str) -> Option<RateLimitRecord> {
        let entry = self.live_entry(subject_id)?;
        Some(RateLimitRecord {
            subject_id: subject_id.to_string(),
            window_start: entry.window_start,
            count: entry.count,
            window_limit: self.window_limit(),
        })
    }

    fn live_count(&self, subject_id: &str) -> u32 {
        self.live_entry(subject_id).map_or(0, |e| e.count)
    }

    fn live_entry(&self, subject_id: &str) -> Option<WindowEntry> {
        if subject_id.is_empty() {
            return None;
        }
        let now = self.clock.now_millis();
        let key = self.policy.storage_key(subject_id);
        let state = self.lock_state();
        state.limits.get(&key).copied().filter(|e| !self.policy.is_expired(e.window_start, now))
    }

    fn persist(&self, state: &LimitSnapshot) {
        if let Err(e) = self.storage.save(state) {
            tracing::warn!(error = %e, "failed to persist rate limit state");
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, LimitSnapshot> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_override(storage: &St) -> Option<u32> {
        match storage.limit_override() {
            Ok(limit) => limit,
            Err(e) => {
                tracing::warn!(error = %e, "window limit override unreadable; using default");
                None
            }
        }
    }
}

impl<St, S, P> MessageLimiter for ChatLimitStore<St, S, P>
where
    St: LimitStorage,
    S: SessionLookup,
    P: SubscriptionLookup,
{
    fn check_limit(&self, subject_id: &str) -> bool {
        ChatLimitStore::check_limit(self, subject_id)
    }

    fn increment_count(&self, subject_id: &str) {
        ChatLimitStore::increment_count(self, subject_id)
    }

    fn remaining_messages(&self, subject_id: &str) -> Remaining {
        ChatLimitStore::remaining_messages(self, subject_id)
    }

    fn is_privileged(&self) -> bool {
        self.gate.is_privileged()
    }
}

impl<St, S, P> std::fmt::Debug for ChatLimitStore<St, S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatLimitStore")
            .field("policy", &self.policy)
            .field("window_limit", &self.window_limit.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
