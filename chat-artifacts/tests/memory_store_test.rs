//! Concurrency and eviction behavior of the session store

use chat_artifacts::core::{ManualClock, MemoryStore, MemoryStoreConfig};
use chat_artifacts::models::{ChatError, Message};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

fn store_with_clock(capacity: usize, max_messages: usize) -> (Arc<MemoryStore>, ManualClock) {
    let clock = ManualClock::new(DateTime::<Utc>::UNIX_EPOCH);
    let store = MemoryStore::with_clock(
        MemoryStoreConfig {
            capacity,
            max_messages,
        },
        Arc::new(clock.clone()),
    );
    (Arc::new(store), clock)
}

/// Concurrent appends to one session lose nothing and keep per-writer order
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_same_session() {
    let (store, _) = store_with_clock(10, 1000);

    let mut handles = Vec::new();
    for writer in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..50 {
                store.append("shared", Message::user(format!("{writer}:{i}")));
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let history = store.history("shared", None);
    assert_eq!(history.len(), 400);

    for writer in 0..8 {
        let prefix = format!("{writer}:");
        let sequence: Vec<usize> = history
            .iter()
            .filter_map(|m| m.content.strip_prefix(&prefix))
            .map(|n| n.parse().unwrap())
            .collect();
        assert_eq!(sequence, (0..50).collect::<Vec<_>>());
    }
}

/// Many sessions created at once never exceed the capacity
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creation_respects_capacity() {
    let (store, _) = store_with_clock(5, 10);

    let mut handles = Vec::new();
    for writer in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..20 {
                store.append(&format!("s-{writer}-{i}"), Message::user("hi"));
                assert!(store.len() <= 5);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.len(), 5);
}

#[test]
fn test_fifo_cap_per_session() {
    let (store, _) = store_with_clock(10, 3);
    for i in 0..10 {
        store.append("s1", Message::user(format!("m{i}")));
    }

    let contents: Vec<String> = store.history("s1", None).into_iter().map(|m| m.content).collect();
    assert_eq!(contents, vec!["m7", "m8", "m9"]);
}

#[test]
fn test_lru_eviction_with_synthetic_time() {
    let (store, clock) = store_with_clock(3, 10);

    for id in ["a", "b", "c"] {
        store.append(id, Message::user("hi"));
        clock.advance(Duration::minutes(1));
    }

    // "a" becomes the most recent, "b" the oldest
    store.append("a", Message::user("again"));
    clock.advance(Duration::minutes(1));
    store.append("d", Message::user("hi"));
    assert_eq!(store.session_ids(), vec!["a", "c", "d"]);

    clock.advance(Duration::minutes(1));
    store.append("e", Message::user("hi"));
    assert_eq!(store.session_ids(), vec!["a", "d", "e"]);
}

#[test]
fn test_updated_at_is_monotonic_under_clock_skew() {
    let (store, clock) = store_with_clock(10, 10);

    clock.set(DateTime::<Utc>::UNIX_EPOCH + Duration::hours(1));
    store.append("s1", Message::user("one"));
    let before = store.session_stats("s1").unwrap().updated_at;

    clock.set(DateTime::<Utc>::UNIX_EPOCH);
    store.append("s1", Message::user("two"));
    let after = store.session_stats("s1").unwrap().updated_at;

    assert!(after >= before);
}

#[test]
fn test_stats_of_missing_session() {
    let (store, _) = store_with_clock(10, 10);
    let err = store.session_stats("ghost").unwrap_err();
    assert!(matches!(err, ChatError::SessionNotFound(ref id) if id == "ghost"));
    assert_eq!(err.to_string(), "Session not found: ghost");
}
