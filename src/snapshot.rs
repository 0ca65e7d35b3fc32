use std::{
    io::BufRead,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc, Mutex, MutexGuard,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::ScopeError;

/// Backend zone label. Parsed case-insensitively; unknown labels are kept
/// as `Unknown` rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Zone {
    Calm,
    Active,
    Flowing,
    Stable,
    Surge,
    Fragile,
    #[default]
    Unknown,
}

impl From<String> for Zone {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "calm" => Zone::Calm,
            "active" => Zone::Active,
            "flowing" => Zone::Flowing,
            "stable" => Zone::Stable,
            "surge" => Zone::Surge,
            "fragile" => Zone::Fragile,
            _ => Zone::Unknown,
        }
    }
}

impl Zone {
    pub fn label(&self) -> &'static str {
        match self {
            Zone::Calm => "CALM",
            Zone::Active => "ACTIVE",
            Zone::Flowing => "FLOWING",
            Zone::Stable => "STABLE",
            Zone::Surge => "SURGE",
            Zone::Fragile => "FRAGILE",
            Zone::Unknown => "-",
        }
    }
}

/// One reading of the backend's state. Owned by the producer; the
/// pipeline only ever reads a copy.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StateSnapshot {
    #[serde(alias = "tick")]
    pub tick_number: u64,
    pub entropy: f64,
    pub scup: f64,
    pub heat: f64,
    pub mood: Option<String>,
    pub zone: Zone,
    pub rebloom_count: u64,
}

pub fn parse_line(line: &str) -> Result<StateSnapshot, ScopeError> {
    Ok(serde_json::from_str(line)?)
}

/// Read access to the current telemetry.
pub trait SnapshotSource {
    /// `None` while the backend is disconnected.
    fn snapshot(&self) -> Option<StateSnapshot>;

    /// Channel that receives the tick number of every published snapshot.
    fn subscribe(&self) -> Option<Receiver<u64>> {
        None
    }
}

#[derive(Default)]
struct SharedState {
    current: Option<StateSnapshot>,
    subscribers: Vec<Sender<u64>>,
}

/// Cloneable handle producers publish into and panels read from.
#[derive(Clone, Default)]
pub struct SharedSource {
    inner: Arc<Mutex<SharedState>>,
}

impl SharedSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SharedState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn publish(&self, snapshot: StateSnapshot) {
        let mut state = self.state();
        let tick = snapshot.tick_number;
        state.current = Some(snapshot);
        state.subscribers.retain(|tx| tx.send(tick).is_ok());
    }

    pub fn disconnect(&self) {
        self.state().current = None;
    }

    pub fn is_connected(&self) -> bool {
        self.state().current.is_some()
    }
}

impl SnapshotSource for SharedSource {
    fn snapshot(&self) -> Option<StateSnapshot> {
        self.state().current.clone()
    }

    fn subscribe(&self) -> Option<Receiver<u64>> {
        let (tx, rx) = mpsc::channel();
        self.state().subscribers.push(tx);
        Some(rx)
    }
}

/// Background thread that publishes one snapshot per JSON line.
/// Bad lines are skipped; end of input disconnects the source.
pub fn spawn_json_reader<R>(reader: R, source: SharedSource) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for (lineno, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!(error = %e, "telemetry input failed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line) {
                Ok(snapshot) => source.publish(snapshot),
                Err(e) => debug!(line = lineno + 1, error = %e, "skipping malformed telemetry line"),
            }
        }
        info!("telemetry input closed");
        source.disconnect();
    })
}

/// Synthetic telemetry: oscillating metrics and a tick counter whose
/// rate drifts, with a periodic counter reset.
#[derive(Debug, Default)]
pub struct DemoFeed {
    step: u64,
    tick: u64,
}

const DEMO_RESET_EVERY: u64 = 600;

impl DemoFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_snapshot(&mut self) -> StateSnapshot {
        self.step += 1;
        let t = self.step as f64;
        if self.step % DEMO_RESET_EVERY == 0 {
            self.tick = 0;
        } else {
            self.tick += 1 + ((t * 0.02).sin().abs() * 2.0).round() as u64;
        }

        let entropy = 0.5 + 0.35 * (t * 0.03).sin() + 0.1 * (t * 0.17).sin();
        let scup = 55.0 + 30.0 * (t * 0.011).cos();
        let heat = 0.3 + 0.1 * (t * 0.04).cos();
        let zone = if entropy > 0.8 {
            Zone::Surge
        } else if entropy > 0.55 {
            Zone::Active
        } else {
            Zone::Calm
        };

        StateSnapshot {
            tick_number: self.tick,
            entropy,
            scup,
            heat,
            mood: Some(if scup > 60.0 { "contemplative" } else { "curious" }.to_string()),
            zone,
            rebloom_count: self.step / 50,
        }
    }
}

pub fn spawn_demo_feed(source: SharedSource, period: Duration, shutdown: Arc<AtomicBool>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut feed = DemoFeed::new();
        while !shutdown.load(Ordering::Relaxed) {
            source.publish(feed.next_snapshot());
            thread::sleep(period);
        }
        source.disconnect();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_full_line() {
        let snap = parse_line(
            r#"{"tick_number": 42, "entropy": 0.7, "scup": 61.5, "heat": 0.2, "mood": "curious", "zone": "SURGE"}"#,
        )
        .unwrap();
        assert_eq!(snap.tick_number, 42);
        assert_eq!(snap.zone, Zone::Surge);
        assert_eq!(snap.mood.as_deref(), Some("curious"));
    }

    #[test]
    fn missing_fields_default_and_tick_alias() {
        let snap = parse_line(r#"{"tick": 7, "zone": "somewhere"}"#).unwrap();
        assert_eq!(snap.tick_number, 7);
        assert_eq!(snap.entropy, 0.0);
        assert_eq!(snap.zone, Zone::Unknown);
    }

    #[test]
    fn malformed_line_is_parse_error() {
        assert!(matches!(parse_line("{not json"), Err(ScopeError::Parse(_))));
    }

    #[test]
    fn shared_source_publish_and_disconnect() {
        let source = SharedSource::new();
        assert!(source.snapshot().is_none());
        let rx = source.subscribe().unwrap();

        source.publish(StateSnapshot { tick_number: 3, ..Default::default() });
        assert_eq!(source.snapshot().map(|s| s.tick_number), Some(3));
        assert_eq!(rx.try_recv().ok(), Some(3));

        source.disconnect();
        assert!(!source.is_connected());
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let source = SharedSource::new();
        drop(source.subscribe());
        source.publish(StateSnapshot::default());
        assert!(source.state().subscribers.is_empty());
    }

    #[test]
    fn json_reader_publishes_then_disconnects() {
        let source = SharedSource::new();
        let rx = source.subscribe().unwrap();
        let input = "{\"tick\": 1}\ngarbage\n\n{\"tick\": 2}\n";
        spawn_json_reader(Cursor::new(input), source.clone()).join().unwrap();

        let ticks: Vec<u64> = rx.try_iter().collect();
        assert_eq!(ticks, vec![1, 2]);
        assert!(!source.is_connected());
    }

    #[test]
    fn demo_feed_resets_counter() {
        let mut feed = DemoFeed::new();
        let mut last = 0;
        for _ in 1..DEMO_RESET_EVERY {
            let snap = feed.next_snapshot();
            assert!(snap.tick_number > last);
            last = snap.tick_number;
        }
        assert_eq!(feed.next_snapshot().tick_number, 0);
    }
}
