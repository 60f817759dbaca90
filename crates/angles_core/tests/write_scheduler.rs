use angles_core::config::DEFAULT_SNAPSHOT_KEY;
use angles_core::{
    migrate, CanonicalSnapshot, FlushOutcome, ManualClock, MemoryStorage, Store, StoreConfig,
};
use serde_json::Value;

#[test]
fn rapid_mutations_coalesce_into_one_write_after_quiet_period() {
    let clock = ManualClock::new(0);
    let mut store = open(clock.clone());

    store.replace(&with_hold("t0")).unwrap();
    clock.set(100);
    store.replace(&with_hold("t100")).unwrap();
    clock.set(200);
    store.replace(&with_hold("t200")).unwrap();
    assert_eq!(store.next_deadline(), Some(700));

    clock.set(699);
    assert_eq!(store.tick().unwrap(), FlushOutcome::Idle);
    assert_eq!(write_count(&store), 0);

    clock.set(700);
    let outcome = store.tick().unwrap();
    assert!(matches!(
        outcome,
        FlushOutcome::Written {
            written_at_ms: 700,
            ..
        }
    ));
    assert_eq!(write_count(&store), 1);
    assert_eq!(persisted_holds(&store), vec!["t200"]);

    clock.set(5_000);
    assert_eq!(store.tick().unwrap(), FlushOutcome::Idle);
    assert_eq!(write_count(&store), 1);
}

#[test]
fn teardown_flushes_latest_snapshot_and_cancels_timer() {
    let clock = ManualClock::new(0);
    let mut store = open(clock.clone());

    store.replace(&with_hold("t0")).unwrap();
    clock.set(100);
    store.replace(&with_hold("t100")).unwrap();
    clock.set(200);
    store.replace(&with_hold("t200")).unwrap();

    clock.set(250);
    let outcome = store.on_teardown().unwrap();
    assert!(matches!(
        outcome,
        FlushOutcome::Written {
            written_at_ms: 250,
            ..
        }
    ));
    assert_eq!(write_count(&store), 1);
    assert_eq!(persisted_holds(&store), vec!["t200"]);
    assert_eq!(store.next_deadline(), None);

    clock.set(700);
    assert_eq!(store.tick().unwrap(), FlushOutcome::Idle);
    assert_eq!(write_count(&store), 1);
}

#[test]
fn writes_follow_scheduling_order() {
    let clock = ManualClock::new(0);
    let mut store = open(clock.clone());

    store.replace(&with_hold("first")).unwrap();
    clock.set(500);
    store.tick().unwrap();
    assert_eq!(persisted_holds(&store), vec!["first"]);

    store.replace(&with_hold("second")).unwrap();
    clock.set(900);
    assert_eq!(store.tick().unwrap(), FlushOutcome::Idle);
    clock.set(1_000);
    store.tick().unwrap();
    assert_eq!(persisted_holds(&store), vec!["second"]);
    assert_eq!(write_count(&store), 2);
}

#[test]
fn custom_window_is_honored() {
    let clock = ManualClock::new(0);
    let config = StoreConfig {
        debounce_ms: 50,
        ..StoreConfig::default()
    };
    let mut store = Store::open(MemoryStorage::new(), clock.clone(), config).unwrap();

    store.replace(&with_hold("fast")).unwrap();
    clock.set(50);
    store.tick().unwrap();
    assert_eq!(write_count(&store), 1);
}

fn open(clock: ManualClock) -> Store<MemoryStorage, ManualClock> {
    Store::open(MemoryStorage::new(), clock, StoreConfig::default()).unwrap()
}

fn with_hold(name: &str) -> CanonicalSnapshot {
    let mut snapshot = CanonicalSnapshot::empty();
    snapshot.holds.push(name.to_string());
    snapshot
}

fn write_count(store: &Store<MemoryStorage, ManualClock>) -> usize {
    store.storage().write_count(DEFAULT_SNAPSHOT_KEY)
}

fn persisted_holds(store: &Store<MemoryStorage, ManualClock>) -> Vec<String> {
    let raw = store.storage().raw(DEFAULT_SNAPSHOT_KEY).unwrap();
    let value: Value = serde_json::from_str(raw).unwrap();
    migrate(&value).holds
}
