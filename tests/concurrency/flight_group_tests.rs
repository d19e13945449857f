use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use flightgroup::concurrency::FlightGroup;

use crate::assert_all_eq;
use crate::common::logger::init_test_logger;

type Group = FlightGroup<String, Option<u64>, String>;

/// Holds the leader inside its operation until `followers` callers have attached,
/// so every caller provably lands in the same burst.
fn wait_for_followers(group: &Group, followers: u64) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while group.stats().followers < followers && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
}

fn spawn_callers<F>(
    group: &Arc<Group>,
    callers: usize,
    key: &str,
    make_op: F,
) -> Vec<Result<Option<u64>, String>>
where
    F: Fn() -> Box<dyn FnOnce() -> Result<Option<u64>, String> + Send> + Send + Sync + 'static,
{
    let make_op = Arc::new(make_op);
    let barrier = Arc::new(Barrier::new(callers));
    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let group = Arc::clone(group);
            let barrier = Arc::clone(&barrier);
            let make_op = Arc::clone(&make_op);
            let key = key.to_string();
            thread::spawn(move || {
                let operation = make_op();
                barrier.wait();
                group.do_call(key, operation)
            })
        })
        .collect();

    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

mod coalescing {
    use super::*;

    #[test]
    fn test_ten_callers_share_one_execution() {
        init_test_logger();
        let group: Arc<Group> = Arc::new(FlightGroup::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let start = Instant::now();
        let results = {
            let group_for_op = Arc::clone(&group);
            let runs = Arc::clone(&runs);
            spawn_callers(&group, 10, "x", move || {
                let group = Arc::clone(&group_for_op);
                let runs = Arc::clone(&runs);
                Box::new(move || {
                    runs.fetch_add(1, Ordering::SeqCst);
                    wait_for_followers(&group, 9);
                    thread::sleep(Duration::from_millis(50));
                    Ok(Some(42))
                })
            })
        };
        let elapsed = start.elapsed();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(results.len(), 10);
        assert_all_eq!(results, Ok(Some(42)));
        assert!(
            elapsed < Duration::from_millis(500),
            "callers were serialized: {:?}",
            elapsed
        );

        let stats = group.stats();
        assert_eq!(stats.leaders, 1);
        assert_eq!(stats.followers, 9);
        assert_eq!(stats.completed, 1);
        assert!(group.is_empty());
    }

    #[test]
    fn test_error_reaches_every_caller() {
        init_test_logger();
        let group: Arc<Group> = Arc::new(FlightGroup::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let results = {
            let group_for_op = Arc::clone(&group);
            let runs = Arc::clone(&runs);
            spawn_callers(&group, 5, "y", move || {
                let group = Arc::clone(&group_for_op);
                let runs = Arc::clone(&runs);
                Box::new(move || {
                    runs.fetch_add(1, Ordering::SeqCst);
                    wait_for_followers(&group, 4);
                    Err("boom".to_string())
                })
            })
        };

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_all_eq!(results, Err::<Option<u64>, String>("boom".to_string()));
        assert!(group.is_empty());
    }

    #[test]
    fn test_none_value_is_shared_like_any_other() {
        let group: Arc<Group> = Arc::new(FlightGroup::new());
        let results = {
            let group_for_op = Arc::clone(&group);
            spawn_callers(&group, 3, "empty", move || {
                let group = Arc::clone(&group_for_op);
                Box::new(move || {
                    wait_for_followers(&group, 2);
                    Ok(None)
                })
            })
        };
        assert_all_eq!(results, Ok(None));
    }
}

mod bursts {
    use super::*;

    #[test]
    fn test_sequential_calls_do_not_reuse_results() {
        init_test_logger();
        let group: Group = FlightGroup::new();
        let runs = AtomicUsize::new(0);

        let first = group.do_call("x".to_string(), || {
            runs.fetch_add(1, Ordering::SeqCst);
            Ok(Some(1))
        });
        let second = group.do_call("x".to_string(), || {
            runs.fetch_add(1, Ordering::SeqCst);
            Ok(Some(2))
        });

        assert_eq!(first, Ok(Some(1)));
        assert_eq!(second, Ok(Some(2)));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(group.stats().leaders, 2);
    }

    #[test]
    fn test_reentry_races_never_leak_entries() {
        let group: Arc<Group> = Arc::new(FlightGroup::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let group = Arc::clone(&group);
                let runs = Arc::clone(&runs);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let result = group.do_call("hot".to_string(), || {
                            Ok(Some(runs.fetch_add(1, Ordering::SeqCst) as u64))
                        });
                        assert!(result.is_ok());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = group.stats();
        assert_eq!(stats.leaders as usize, runs.load(Ordering::SeqCst));
        assert_eq!(stats.leaders + stats.followers, 2000);
        assert_eq!(stats.completed, stats.leaders);
        assert!(group.is_empty());
    }
}

mod isolation {
    use super::*;

    #[test]
    fn test_distinct_keys_do_not_block_each_other() {
        init_test_logger();
        let group: Arc<Group> = Arc::new(FlightGroup::new());
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel::<()>();

        let slow = {
            let group = Arc::clone(&group);
            thread::spawn(move || {
                group.do_call("slow".to_string(), move || {
                    started_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok(Some(1))
                })
            })
        };

        started_rx.recv().unwrap();
        assert!(group.in_flight(&"slow".to_string()));

        let start = Instant::now();
        let fast = group.do_call("fast".to_string(), || Ok(Some(2)));
        assert_eq!(fast, Ok(Some(2)));
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(group.in_flight(&"slow".to_string()));

        release_tx.send(()).unwrap();
        assert_eq!(slow.join().unwrap(), Ok(Some(1)));
        assert!(group.is_empty());
    }

    #[test]
    fn test_each_key_gets_its_own_result() {
        let group: Arc<Group> = Arc::new(FlightGroup::new());

        let handles: Vec<_> = (0..32u64)
            .map(|i| {
                let group = Arc::clone(&group);
                thread::spawn(move || {
                    let key = format!("key-{}", i % 8);
                    let value = i % 8;
                    let result = group.do_call(key, move || {
                        thread::sleep(Duration::from_millis(5));
                        Ok(Some(value))
                    });
                    (value, result)
                })
            })
            .collect();

        for handle in handles {
            let (value, result) = handle.join().unwrap();
            assert_eq!(result, Ok(Some(value)));
        }
        assert!(group.is_empty());
    }
}
