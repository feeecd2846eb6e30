//! The live-data subscription loop: poll the store on a timer, hash the full
//! ordered result, and emit only when the content actually changed. Each
//! subscription is one local task with one event channel, so emissions are
//! totally ordered and never overlap; subscriptions are independent of each
//! other and nothing coalesces across them.

use crate::config::SubscribeConfig;
use crate::health::{self, Health, LatencyWindow};
use std::rc::Rc;
use store::{run_header_query, HeaderQuery, HeaderRow, DB};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use xxhash_rust::xxh3::Xxh3;

/// The seam between the poller and storage. The production implementation
/// re-runs a header query; tests substitute scripted sources.
pub trait QuerySource {
    fn fetch(&mut self) -> store::Result<Vec<HeaderRow>>;
}

/// Re-executes a fixed header query against the shared connection.
pub struct StoreSource {
    db: Rc<DB>,
    query: HeaderQuery,
}

impl StoreSource {
    pub fn new(db: Rc<DB>, query: HeaderQuery) -> StoreSource {
        StoreSource { db, query }
    }
}

impl QuerySource for StoreSource {
    fn fetch(&mut self) -> store::Result<Vec<HeaderRow>> {
        run_header_query(&self.db, &self.query)
    }
}

#[derive(Debug, Clone)]
pub enum LiveEvent {
    /// The query result changed.
    Data {
        rows: Vec<HeaderRow>,
        hash: u64,
        latency_ms: u64,
    },
    /// The retry budget is spent. Emitted once per outage; polling continues
    /// at the backoff cap.
    Degraded {
        code: &'static str,
        detail: String,
        retry_count: u32,
    },
}

/// Caller's end of one subscription. Dropping or closing the handle stops the
/// polling task; the next scheduled tick is cleared and never fires.
pub struct SubscriptionHandle {
    key: String,
    events: mpsc::Receiver<LiveEvent>,
    health: watch::Receiver<Health>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl SubscriptionHandle {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn next_event(&mut self) -> Option<LiveEvent> {
        self.events.recv().await
    }

    pub fn health(&self) -> Health {
        *self.health.borrow()
    }

    pub fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Starts polling `source` under `key`. Must run inside a
/// `tokio::task::LocalSet`: sources hold the non-`Send` storage connection,
/// so subscription tasks are spawned locally.
pub fn subscribe<S>(source: S, key: impl Into<String>, config: SubscribeConfig) -> SubscriptionHandle
where
    S: QuerySource + 'static,
{
    let key = key.into();
    let (event_tx, event_rx) = mpsc::channel(16);
    let (health_tx, health_rx) = watch::channel(Health::Healthy);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    tokio::task::spawn_local(run(
        source,
        key.clone(),
        config,
        event_tx,
        health_tx,
        shutdown_rx,
    ));

    SubscriptionHandle {
        key,
        events: event_rx,
        health: health_rx,
        shutdown: Some(shutdown_tx),
    }
}

async fn run<S: QuerySource>(
    mut source: S,
    key: String,
    config: SubscribeConfig,
    events: mpsc::Sender<LiveEvent>,
    health: watch::Sender<Health>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let poll = config.poll_interval();
    let throttle = config.throttle();
    let deadline = config.query_deadline();

    let mut retries: u32 = 0;
    let mut degraded_emitted = false;
    let mut last_hash: Option<u64> = None;
    let mut last_emit: Option<Instant> = None;
    let mut latencies = LatencyWindow::new(32);

    loop {
        let delay = if retries == 0 {
            poll
        } else {
            config.backoff(retries)
        };
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(delay) => {}
        }

        let started = Instant::now();
        let result = source.fetch();
        let latency = started.elapsed();

        let failure = match result {
            Ok(rows) if latency <= deadline => {
                retries = 0;
                degraded_emitted = false;
                latencies.push(latency);
                let _ = health.send(health::derive(&latencies, retries, config.max_retries, poll));

                let hash = hash_rows(&rows);
                if last_hash == Some(hash) {
                    continue;
                }
                // Honor the minimum inter-emission interval before pushing.
                if let Some(previous) = last_emit {
                    let since = previous.elapsed();
                    if since < throttle {
                        tokio::select! {
                            _ = &mut shutdown => break,
                            _ = tokio::time::sleep(throttle - since) => {}
                        }
                    }
                }
                let event = LiveEvent::Data {
                    rows,
                    hash,
                    latency_ms: latency.as_millis() as u64,
                };
                if events.send(event).await.is_err() {
                    break;
                }
                last_emit = Some(Instant::now());
                last_hash = Some(hash);
                continue;
            }
            Ok(_) => format!("query exceeded {}ms", deadline.as_millis()),
            Err(err) => err.to_string(),
        };

        retries += 1;
        tracing::warn!(key = %key, retries, detail = %failure, "subscription query failed");
        let _ = health.send(health::derive(&latencies, retries, config.max_retries, poll));

        if retries >= config.max_retries && !degraded_emitted {
            degraded_emitted = true;
            let event = LiveEvent::Degraded {
                code: "subscription_degraded",
                detail: failure,
                retry_count: retries,
            };
            if events.send(event).await.is_err() {
                break;
            }
        }
    }
    tracing::debug!(key = %key, "subscription closed");
}

/// Stable content hash over the full ordered row list, values and counts
/// both. Anything weaker (row counts alone, say) would let an update slip
/// through unnoticed.
pub fn hash_rows(rows: &[HeaderRow]) -> u64 {
    let mut hasher = Xxh3::new();
    for row in rows {
        for (key, value) in row.iter() {
            hasher.update(key.as_bytes());
            hasher.update(&[0xff]);
            hasher.update(value.as_bytes());
            hasher.update(&[0xfe]);
        }
        hasher.update(&row.get_count().to_le_bytes());
    }
    hasher.digest()
}
