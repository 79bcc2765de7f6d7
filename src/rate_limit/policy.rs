use std::time::Duration;

/// Messages allowed per window under the default daily policy.
pub const DEFAULT_DAILY_LIMIT: u32 = 5;
/// Messages allowed per window under the hourly preset.
pub const DEFAULT_HOURLY_LIMIT: u32 = 15;

const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Fixed-window limit: at most `limit` messages per `window`.
///
/// A store runs under exactly one policy. Records are keyed by window length, so
/// switching policies starts every subject from a fresh window instead of mixing counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    window: Duration,
    limit: u32,
}

impl LimitPolicy {
    /// Build a policy. A zero window is clamped to one millisecond.
    pub fn new(window: Duration, limit: u32) -> Self {
        Self { window: window.max(Duration::from_millis(1)), limit }
    }

    /// 5 messages per rolling day, starting at the first message. The default.
    pub fn daily() -> Self {
        Self::new(DAY, DEFAULT_DAILY_LIMIT)
    }

    /// 15 messages per hour.
    pub fn hourly() -> Self {
        Self::new(HOUR, DEFAULT_HOURLY_LIMIT)
    }

    pub fn with_limit(self, limit: u32) -> Self {
        Self { limit, ..self }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn window_millis(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// `now - window_start >= window`. A window start in the future (clock skew) is
    /// never expired.
    pub fn is_expired(&self, window_start: u64, now: u64) -> bool {
        match now.checked_sub(window_start) {
            Some(elapsed) => elapsed >= self.window_millis(),
            None => false,
        }
    }

    /// Persisted key for `subject` under this policy's window length.
    pub fn storage_key(&self, subject: &str) -> String {
        format!("{}@{}ms", subject, self.window_millis())
    }
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self::daily()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_daily_five() {
        let p = LimitPolicy::default();
        assert_eq!(p.limit(), 5);
        assert_eq!(p.window(), Duration::from_secs(86_400));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let p = LimitPolicy::hourly();
        let hour = 3_600_000;
        assert!(!p.is_expired(1_000, 1_000 + hour - 1));
        assert!(p.is_expired(1_000, 1_000 + hour));
    }

    #[test]
    fn future_window_start_is_not_expired() {
        let p = LimitPolicy::hourly();
        assert!(!p.is_expired(10_000_000, 5));
    }

    #[test]
    fn storage_key_carries_window() {
        assert_eq!(LimitPolicy::daily().storage_key("u1"), "u1@86400000ms");
        assert_eq!(LimitPolicy::hourly().storage_key("u1"), "u1@3600000ms");
    }

    #[test]
    fn sub_second_windows_get_distinct_keys() {
        let fast = LimitPolicy::new(Duration::from_millis(900), 5);
        let faster = LimitPolicy::new(Duration::from_millis(400), 5);
        assert_ne!(fast.storage_key("u1"), faster.storage_key("u1"));
        assert_eq!(faster.storage_key("u1"), "u1@400ms");
    }

    #[test]
    fn zero_window_is_clamped() {
        let p = LimitPolicy::new(Duration::ZERO, 3);
        assert_eq!(p.window_millis(), 1);
    }
}
