use std::time::Duration;
use tutorgate::prelude::*;
use tutorgate_fs::{storage_from_config, FileStorage};

fn free_user(id: &str) -> (SessionHandle, SubscriptionHandle) {
    (
        SessionHandle::signed_in(User::new(id)),
        SubscriptionHandle::with_subscription(Subscription::free()),
    )
}

#[test]
fn missing_file_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::in_dir(dir.path());
    assert_eq!(storage.load().unwrap(), LimitSnapshot::default());
    assert_eq!(storage.limit_override().unwrap(), None);
}

#[test]
fn state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(1_700_000_000_000);
    let (session, subs) = free_user("u1");

    let store = ChatLimitStore::new(
        FileStorage::in_dir(dir.path()),
        session.clone(),
        subs.clone(),
        LimitPolicy::daily(),
    )
    .with_clock(clock.clone());
    store.increment_count("u1");
    store.increment_count("u1");
    assert_eq!(store.remaining_messages("u1"), Remaining::Limited(3));
    drop(store);

    let contents = std::fs::read_to_string(dir.path().join("chat-limits.json")).unwrap();
    assert!(contents.contains("u1@86400000ms"));
    assert!(contents.contains("windowStart"));

    let storage = FileStorage::in_dir(dir.path());
    let reloaded = ChatLimitStore::new(storage, session, subs, LimitPolicy::daily())
        .with_clock(clock.clone());
    assert_eq!(reloaded.remaining_messages("u1"), Remaining::Limited(3));

    clock.advance(Duration::from_secs(86_400));
    assert_eq!(reloaded.remaining_messages("u1"), Remaining::Limited(5));
}

#[test]
fn override_file_sets_window_limit() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::in_dir(dir.path());
    storage.set_limit_override(Some(12)).unwrap();
    let (session, subs) = free_user("u1");

    let store = ChatLimitStore::new(storage.clone(), session, subs, LimitPolicy::daily());
    assert_eq!(store.window_limit(), 12);

    storage.set_limit_override(None).unwrap();
    storage.set_limit_override(None).unwrap();
    assert_eq!(store.reload_override(), 5);
}

#[test]
fn corrupt_file_degrades_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chat-limits.json");
    std::fs::write(&path, "{ definitely not json").unwrap();
    let storage = FileStorage::new(&path);
    assert!(matches!(storage.load(), Err(StorageError::Serde(_))));

    let (session, subs) = free_user("u1");
    let store = ChatLimitStore::new(storage, session, subs, LimitPolicy::daily());
    assert!(store.check_limit("u1"));
    store.increment_count("u1");
    assert_eq!(store.remaining_messages("u1"), Remaining::Limited(4));

    // The next save replaced the corrupt file with a valid snapshot.
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(LimitSnapshot::from_json(&raw).is_ok());
}

#[test]
fn garbage_override_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::in_dir(dir.path());
    std::fs::write(storage.override_path(), "many").unwrap();
    assert!(storage.limit_override().is_err());

    let (session, subs) = free_user("u1");
    let store = ChatLimitStore::new(storage, session, subs, LimitPolicy::hourly());
    assert_eq!(store.window_limit(), 15);
}

#[test]
fn configured_path_selects_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("limits").join("state.json");
    let config = GateConfig { storage_path: Some(path.clone()), ..GateConfig::default() };
    assert_eq!(FileStorage::from_config(&config).unwrap().path(), path.as_path());

    let (session, subs) = free_user("u1");
    let store = ChatLimitStore::new(
        storage_from_config(&config),
        session.clone(),
        subs.clone(),
        config.policy(),
    );
    store.increment_count("u1");
    assert!(path.exists());

    let storage = storage_from_config(&config);
    let reopened = ChatLimitStore::new(storage, session, subs, config.policy());
    assert_eq!(reopened.remaining_messages("u1"), Remaining::Limited(4));
}

#[test]
fn no_path_falls_back_to_memory() {
    let config = GateConfig::default();
    assert!(FileStorage::from_config(&config).is_none());

    let (session, subs) = free_user("u1");
    let storage = storage_from_config(&config);
    let store = ChatLimitStore::new(storage, session.clone(), subs.clone(), config.policy());
    store.increment_count("u1");
    assert_eq!(store.remaining_messages("u1"), Remaining::Limited(4));

    // Each memory backend starts empty, so nothing carries over.
    let fresh = ChatLimitStore::new(storage_from_config(&config), session, subs, config.policy());
    assert_eq!(fresh.remaining_messages("u1"), Remaining::Limited(5));
}
