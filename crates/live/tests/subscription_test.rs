//! Subscription behavior on a paused clock: change suppression, throttling,
//! retry/backoff, and the one-shot degraded emission.

use live::{subscribe, Health, LiveEvent, QuerySource, SubscribeConfig};
use std::cell::RefCell;
use std::rc::Rc;
use store::HeaderRow;
use tokio::task::LocalSet;
use tokio::time::{Duration, Instant};

/// Returns a scripted result per tick; the last script entry repeats.
struct ScriptedSource {
    script: Vec<Result<Vec<HeaderRow>, String>>,
    ticks: Rc<RefCell<usize>>,
}

impl ScriptedSource {
    fn new(script: Vec<Result<Vec<HeaderRow>, String>>) -> (ScriptedSource, Rc<RefCell<usize>>) {
        let ticks = Rc::new(RefCell::new(0));
        (
            ScriptedSource {
                script,
                ticks: ticks.clone(),
            },
            ticks,
        )
    }
}

impl QuerySource for ScriptedSource {
    fn fetch(&mut self) -> store::Result<Vec<HeaderRow>> {
        let mut ticks = self.ticks.borrow_mut();
        let index = (*ticks).min(self.script.len() - 1);
        *ticks += 1;
        match &self.script[index] {
            Ok(rows) => Ok(rows.clone()),
            Err(detail) => Err(store::Error::QueryShape(detail.clone())),
        }
    }
}

fn rows(folder: &str, count: i64) -> Vec<HeaderRow> {
    vec![HeaderRow::from_pairs(&[("folder", folder)], count)]
}

fn config(poll_ms: u64) -> SubscribeConfig {
    SubscribeConfig {
        poll_interval_ms: poll_ms,
        ..SubscribeConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn unchanged_results_are_suppressed() {
    LocalSet::new()
        .run_until(async {
            let (source, ticks) = ScriptedSource::new(vec![
                Ok(rows("Work", 1)),
                Ok(rows("Work", 1)),
                Ok(rows("Work", 2)),
            ]);
            let mut handle = subscribe(source, "cards:folder", config(100));

            let first = handle.next_event().await.unwrap();
            let second = handle.next_event().await.unwrap();
            handle.close();

            // Three polls happened but only two results differed.
            assert!(*ticks.borrow() >= 3);
            match (first, second) {
                (
                    LiveEvent::Data { rows: a, hash: ha, .. },
                    LiveEvent::Data { rows: b, hash: hb, .. },
                ) => {
                    assert_eq!(1, a[0].get_count());
                    assert_eq!(2, b[0].get_count());
                    assert_ne!(ha, hb);
                }
                other => panic!("expected two data events, got {other:?}"),
            }
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn emissions_respect_the_throttle_floor() {
    LocalSet::new()
        .run_until(async {
            // Every poll returns a different count, so every tick wants to
            // emit; the throttle has to space them out.
            let script: Vec<_> = (0..50).map(|i| Ok(rows("Work", i))).collect();
            let (source, _ticks) = ScriptedSource::new(script);

            let mut cfg = config(100);
            cfg.throttle_ms = Some(5_000);
            let mut handle = subscribe(source, "cards:folder", cfg);

            let _first = handle.next_event().await.unwrap();
            let after_first = Instant::now();
            let _second = handle.next_event().await.unwrap();
            let gap = after_first.elapsed();
            handle.close();

            assert!(
                gap >= Duration::from_millis(5_000),
                "inter-emission gap {gap:?} under the throttle floor"
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn failures_degrade_once_and_recovery_resets() {
    LocalSet::new()
        .run_until(async {
            let script = vec![
                Err("disk gone".to_string()),
                Err("disk gone".to_string()),
                Err("disk gone".to_string()),
                Ok(rows("Work", 7)),
            ];
            let (source, _ticks) = ScriptedSource::new(script);

            let mut cfg = config(100);
            cfg.max_retries = 3;
            let mut handle = subscribe(source, "cards:folder", cfg);

            // The degraded event is emitted exactly once, at the third
            // consecutive failure.
            let degraded = handle.next_event().await.unwrap();
            match &degraded {
                LiveEvent::Degraded {
                    code,
                    detail,
                    retry_count,
                } => {
                    assert_eq!(&"subscription_degraded", code);
                    assert!(detail.contains("disk gone"));
                    assert_eq!(3, *retry_count);
                }
                other => panic!("expected a degraded event, got {other:?}"),
            }
            assert_eq!(Health::Disconnected, handle.health());

            // The next successful poll emits data and restores health.
            let recovered = handle.next_event().await.unwrap();
            assert!(matches!(recovered, LiveEvent::Data { .. }));
            assert_eq!(Health::Healthy, handle.health());
            handle.close();
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn a_single_failure_does_not_emit() {
    LocalSet::new()
        .run_until(async {
            let script = vec![Err("hiccup".to_string()), Ok(rows("Work", 1))];
            let (source, _ticks) = ScriptedSource::new(script);
            let mut handle = subscribe(source, "cards:folder", config(100));

            // The first event through is data; the lone failure was retried
            // silently.
            let event = handle.next_event().await.unwrap();
            assert!(matches!(event, LiveEvent::Data { .. }));
            handle.close();
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn closing_clears_the_next_tick() {
    LocalSet::new()
        .run_until(async {
            let (source, ticks) = ScriptedSource::new(vec![Ok(rows("Work", 1))]);
            let handle = subscribe(source, "cards:folder", config(100));
            handle.close();

            // Give the loop a chance to run if it (wrongly) survived.
            tokio::time::sleep(Duration::from_millis(1_000)).await;
            assert_eq!(0, *ticks.borrow());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn subscriptions_are_independent() {
    LocalSet::new()
        .run_until(async {
            let (a, _) = ScriptedSource::new(vec![Ok(rows("A", 1))]);
            let (b, _) = ScriptedSource::new(vec![Ok(rows("B", 2))]);

            let mut ha = subscribe(a, "a", config(100));
            let mut hb = subscribe(b, "b", config(300));

            let ea = ha.next_event().await.unwrap();
            let eb = hb.next_event().await.unwrap();
            match (ea, eb) {
                (LiveEvent::Data { rows: ra, .. }, LiveEvent::Data { rows: rb, .. }) => {
                    assert_eq!("A", ra[0].get_string("folder"));
                    assert_eq!("B", rb[0].get_string("folder"));
                }
                other => panic!("expected data on both handles, got {other:?}"),
            }
            ha.close();
            hb.close();
        })
        .await;
}
