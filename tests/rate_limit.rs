use std::time::Duration;
use tutorgate::prelude::*;

const HOUR: Duration = Duration::from_secs(3_600);

type Store = ChatLimitStore<MemoryStorage, SessionHandle, SubscriptionHandle>;

struct Fixture {
    storage: MemoryStorage,
    session: SessionHandle,
    subs: SubscriptionHandle,
    clock: ManualClock,
    store: Store,
}

fn fixture(user: User, policy: LimitPolicy) -> Fixture {
    let storage = MemoryStorage::new();
    let session = SessionHandle::signed_in(user);
    let subs = SubscriptionHandle::with_subscription(Subscription::free());
    let clock = ManualClock::new(1_700_000_000_000);
    let store = ChatLimitStore::new(storage.clone(), session.clone(), subs.clone(), policy)
        .with_clock(clock.clone());
    Fixture { storage, session, subs, clock, store }
}

impl Fixture {
    /// A second store over the same storage, session and clock (a restart).
    fn reopen(&self, policy: LimitPolicy) -> Store {
        ChatLimitStore::new(self.storage.clone(), self.session.clone(), self.subs.clone(), policy)
            .with_clock(self.clock.clone())
    }
}

fn hourly_five() -> LimitPolicy {
    LimitPolicy::new(HOUR, 5)
}

#[test]
fn unseen_subject_has_full_allowance() {
    let f = fixture(User::new("someone"), LimitPolicy::daily());
    for subject in ["u1", "u2", "a-very-long-subject-id"] {
        assert!(f.store.check_limit(subject));
        assert_eq!(f.store.remaining_messages(subject), Remaining::Limited(5));
    }
}

#[test]
fn scenario_a_limit_reached_after_window_limit_increments() {
    let f = fixture(User::new("u1"), LimitPolicy::daily());
    assert_eq!(f.store.remaining_messages("u1"), Remaining::Limited(5));
    for _ in 0..5 {
        assert!(f.store.check_limit("u1"));
        f.store.increment_count("u1");
    }
    assert!(!f.store.check_limit("u1"));
    assert_eq!(f.store.remaining_messages("u1"), Remaining::Limited(0));
}

#[test]
fn scenario_b_admin_is_never_counted() {
    let f = fixture(User::admin("admin1"), LimitPolicy::daily());
    for _ in 0..100 {
        f.store.increment_count("admin1");
    }
    assert!(f.store.check_limit("admin1"));
    assert!(f.store.remaining_messages("admin1").is_unlimited());
    assert!(f.store.record("admin1").is_none());
    assert!(f.storage.raw().is_none());
}

#[test]
fn active_premium_is_never_counted() {
    let f = fixture(User::new("p1"), LimitPolicy::daily());
    f.subs.set(Subscription::premium());
    for _ in 0..20 {
        f.store.increment_count("p1");
    }
    assert!(f.store.check_limit("p1"));
    assert_eq!(f.store.remaining_messages("p1"), Remaining::Unlimited);

    // Once the subscription lapses, nothing was tracked in the meantime.
    f.subs.set(Subscription::with(SubscriptionTier::Premium, SubscriptionStatus::Expired));
    assert_eq!(f.store.remaining_messages("p1"), Remaining::Limited(5));
}

#[test]
fn scenario_c_window_expiry_resets() {
    let f = fixture(User::new("u2"), hourly_five());
    for _ in 0..5 {
        f.store.increment_count("u2");
    }
    assert!(!f.store.check_limit("u2"));

    f.clock.advance(HOUR + Duration::from_millis(1));
    assert!(f.store.check_limit("u2"));
    assert_eq!(f.store.remaining_messages("u2"), Remaining::Limited(5));
}

#[test]
fn window_expires_exactly_at_its_length() {
    let f = fixture(User::new("u2"), hourly_five());
    for _ in 0..5 {
        f.store.increment_count("u2");
    }
    f.clock.advance(HOUR - Duration::from_millis(1));
    assert!(!f.store.check_limit("u2"));
    f.clock.advance(Duration::from_millis(1));
    assert!(f.store.check_limit("u2"));
}

#[test]
fn scenario_d_empty_subject_fails_closed() {
    let f = fixture(User::admin("admin1"), LimitPolicy::daily());
    assert!(!f.store.check_limit(""));
    assert_eq!(f.store.remaining_messages(""), Remaining::Limited(0));
    f.store.increment_count("");
    assert!(f.storage.raw().is_none());
    assert!(f.store.record("").is_none());
}

#[test]
fn reset_after_expiry_starts_at_one() {
    let f = fixture(User::new("u1"), hourly_five());
    for _ in 0..3 {
        f.store.increment_count("u1");
    }
    f.clock.advance(HOUR * 2);
    assert!(f.store.check_limit("u1"));
    f.store.increment_count("u1");

    let record = f.store.record("u1").unwrap();
    assert_eq!(record.count, 1);
    assert_eq!(record.window_start, f.clock.now_millis());
    assert_eq!(record.window_limit, 5);
}

#[test]
fn reload_reproduces_remaining() {
    let f = fixture(User::new("u1"), LimitPolicy::daily());
    f.store.increment_count("u1");
    f.store.increment_count("u1");
    let before = f.store.remaining_messages("u1");

    let reloaded = f.reopen(LimitPolicy::daily());
    assert_eq!(reloaded.remaining_messages("u1"), before);
    assert_eq!(reloaded.remaining_messages("u1"), Remaining::Limited(3));
}

#[test]
fn policy_change_does_not_mix_counts() {
    let f = fixture(User::new("u1"), LimitPolicy::daily());
    for _ in 0..5 {
        f.store.increment_count("u1");
    }
    let hourly = f.reopen(LimitPolicy::hourly());
    assert_eq!(hourly.remaining_messages("u1"), Remaining::Limited(15));
}

#[test]
fn clock_skew_never_resets_window() {
    let f = fixture(User::new("u1"), hourly_five());
    for _ in 0..5 {
        f.store.increment_count("u1");
    }
    f.clock.rewind(Duration::from_secs(10 * 86_400));
    assert!(!f.store.check_limit("u1"));
    assert_eq!(f.store.remaining_messages("u1"), Remaining::Limited(0));

    f.store.increment_count("u1");
    assert_eq!(f.store.record("u1").unwrap().count, 5);
}

#[test]
fn unavailable_storage_keeps_store_usable() {
    let storage = MemoryStorage::failing();
    let session = SessionHandle::signed_in(User::new("u1"));
    let subs = SubscriptionHandle::new();
    let store = ChatLimitStore::new(storage.clone(), session, subs, LimitPolicy::daily());

    assert!(store.check_limit("u1"));
    for _ in 0..5 {
        store.increment_count("u1");
    }
    // Counting still works in memory for the lifetime of the store.
    assert!(!store.check_limit("u1"));
    assert_eq!(store.window_limit(), 5);
    assert!(storage.raw().is_none());
}

#[test]
fn storage_recovery_persists_in_memory_state() {
    let storage = MemoryStorage::new();
    let session = SessionHandle::signed_in(User::new("u1"));
    let subs = SubscriptionHandle::new();
    let store =
        ChatLimitStore::new(storage.clone(), session.clone(), subs.clone(), LimitPolicy::daily());

    storage.set_failing(true);
    store.increment_count("u1");
    storage.set_failing(false);
    store.increment_count("u1");

    let reloaded = ChatLimitStore::new(storage, session, subs, LimitPolicy::daily());
    assert_eq!(reloaded.remaining_messages("u1"), Remaining::Limited(3));
}

#[test]
fn signed_out_session_is_still_limited() {
    let f = fixture(User::new("u1"), LimitPolicy::daily());
    f.session.sign_out();
    f.store.increment_count("u1");
    assert_eq!(f.store.remaining_messages("u1"), Remaining::Limited(4));
}

#[test]
fn zero_limit_override_blocks_everyone_unprivileged() {
    let storage = MemoryStorage::new();
    storage.set_limit_override(Some(0));
    let session = SessionHandle::signed_in(User::new("u1"));
    let subs = SubscriptionHandle::new();
    let store = ChatLimitStore::new(storage, session.clone(), subs, LimitPolicy::daily());
    assert!(!store.check_limit("u1"));
    assert_eq!(store.remaining_messages("u1"), Remaining::Limited(0));

    session.sign_in(User::admin("u1"));
    assert!(store.check_limit("u1"));
}

#[test]
fn sub_second_policies_share_storage_without_mixing() {
    let f = fixture(User::new("u1"), LimitPolicy::new(Duration::from_millis(900), 5));
    for _ in 0..5 {
        f.store.increment_count("u1");
    }
    assert!(!f.store.check_limit("u1"));

    let shorter = f.reopen(LimitPolicy::new(Duration::from_millis(400), 5));
    assert_eq!(shorter.remaining_messages("u1"), Remaining::Limited(5));
    assert!(shorter.check_limit("u1"));
}
