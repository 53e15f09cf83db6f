//! Counters for one mirror synchronization run.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Thread-safe counters updated by the sync loop and read by the runner.
#[derive(Debug)]
pub struct SyncMetrics {
    frames_received: AtomicU64,
    deltas_applied: AtomicU64,
    malformed_frames: AtomicU64,
    stale_deltas: AtomicU64,
    sequence_gaps: AtomicU64,
    websocket_errors: AtomicU64,
    connection_failures: AtomicU64,
    reconnect_attempts: AtomicU64,
    snapshots_loaded: AtomicU64,

    started: Instant,
    events: RwLock<LastEvents>,
}

#[derive(Debug, Default)]
struct LastEvents {
    delta: Option<Instant>,
    error: Option<Instant>,
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

fn read(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::Relaxed)
}

fn secs_since(at: Option<Instant>) -> Option<f64> {
    at.map(|t| t.elapsed().as_secs_f64())
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            frames_received: AtomicU64::new(0),
            deltas_applied: AtomicU64::new(0),
            malformed_frames: AtomicU64::new(0),
            stale_deltas: AtomicU64::new(0),
            sequence_gaps: AtomicU64::new(0),
            websocket_errors: AtomicU64::new(0),
            connection_failures: AtomicU64::new(0),
            reconnect_attempts: AtomicU64::new(0),
            snapshots_loaded: AtomicU64::new(0),
            started: Instant::now(),
            events: RwLock::new(LastEvents::default()),
        }
    }

    fn mark_error(&self) {
        self.events.write().error = Some(Instant::now());
    }

    pub fn inc_frames_received(&self) {
        bump(&self.frames_received);
    }

    pub fn inc_deltas_applied(&self) {
        bump(&self.deltas_applied);
        self.events.write().delta = Some(Instant::now());
    }

    pub fn inc_malformed_frames(&self) {
        bump(&self.malformed_frames);
        self.mark_error();
    }

    pub fn inc_stale_deltas(&self) {
        bump(&self.stale_deltas);
    }

    /// Record a jump in sequence numbers of `missing` updates.
    pub fn add_sequence_gap(&self, missing: u64) {
        self.sequence_gaps.fetch_add(missing, Ordering::Relaxed);
    }

    pub fn inc_websocket_errors(&self) {
        bump(&self.websocket_errors);
        self.mark_error();
    }

    pub fn inc_connection_failures(&self) {
        bump(&self.connection_failures);
        self.mark_error();
    }

    pub fn inc_reconnect_attempts(&self) {
        bump(&self.reconnect_attempts);
    }

    pub fn inc_snapshots_loaded(&self) {
        bump(&self.snapshots_loaded);
    }

    pub fn frames_received(&self) -> u64 {
        read(&self.frames_received)
    }

    pub fn deltas_applied(&self) -> u64 {
        read(&self.deltas_applied)
    }

    pub fn malformed_frames(&self) -> u64 {
        read(&self.malformed_frames)
    }

    pub fn stale_deltas(&self) -> u64 {
        read(&self.stale_deltas)
    }

    /// Total sequence numbers skipped by the feed.
    pub fn sequence_gaps(&self) -> u64 {
        read(&self.sequence_gaps)
    }

    pub fn websocket_errors(&self) -> u64 {
        read(&self.websocket_errors)
    }

    pub fn connection_failures(&self) -> u64 {
        read(&self.connection_failures)
    }

    pub fn reconnect_attempts(&self) -> u64 {
        read(&self.reconnect_attempts)
    }

    pub fn snapshots_loaded(&self) -> u64 {
        read(&self.snapshots_loaded)
    }

    pub fn uptime_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn secs_since_last_delta(&self) -> Option<f64> {
        secs_since(self.events.read().delta)
    }

    pub fn secs_since_last_error(&self) -> Option<f64> {
        secs_since(self.events.read().error)
    }

    /// Applied deltas per second since start.
    pub fn deltas_per_second(&self) -> f64 {
        match self.uptime_secs() {
            uptime if uptime > 0.0 => self.deltas_applied() as f64 / uptime,
            _ => 0.0,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received(),
            deltas_applied: self.deltas_applied(),
            malformed_frames: self.malformed_frames(),
            stale_deltas: self.stale_deltas(),
            sequence_gaps: self.sequence_gaps(),
            websocket_errors: self.websocket_errors(),
            connection_failures: self.connection_failures(),
            reconnect_attempts: self.reconnect_attempts(),
            snapshots_loaded: self.snapshots_loaded(),
            uptime_secs: self.uptime_secs(),
            deltas_per_second: self.deltas_per_second(),
            secs_since_last_delta: self.secs_since_last_delta(),
            secs_since_last_error: self.secs_since_last_error(),
        }
    }
}

/// A point-in-time copy of [`SyncMetrics`].
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub deltas_applied: u64,
    pub malformed_frames: u64,
    pub stale_deltas: u64,
    pub sequence_gaps: u64,
    pub websocket_errors: u64,
    pub connection_failures: u64,
    pub reconnect_attempts: u64,
    pub snapshots_loaded: u64,
    pub uptime_secs: f64,
    pub deltas_per_second: f64,
    pub secs_since_last_delta: Option<f64>,
    pub secs_since_last_error: Option<f64>,
}

impl MetricsSnapshot {
    /// True when the feed skipped sequence numbers at any point.
    ///
    /// A run with gaps may still validate if the skipped updates were
    /// superseded, but the result deserves a second look.
    pub fn has_gaps(&self) -> bool {
        self.sequence_gaps > 0
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Sync Metrics ===")?;
        writeln!(f, "Uptime:              {:.1}s", self.uptime_secs)?;
        writeln!(f, "Frames received:     {}", self.frames_received)?;
        writeln!(f, "Deltas applied:      {}", self.deltas_applied)?;
        writeln!(f, "Deltas/sec:          {:.2}", self.deltas_per_second)?;
        writeln!(f, "Malformed frames:    {}", self.malformed_frames)?;
        writeln!(f, "Stale deltas:        {}", self.stale_deltas)?;
        writeln!(f, "Sequence gaps:       {}", self.sequence_gaps)?;
        writeln!(f, "WebSocket errors:    {}", self.websocket_errors)?;
        writeln!(f, "Connection failures: {}", self.connection_failures)?;
        writeln!(f, "Reconnect attempts:  {}", self.reconnect_attempts)?;
        writeln!(f, "Snapshots loaded:    {}", self.snapshots_loaded)?;
        if let Some(secs) = self.secs_since_last_delta {
            writeln!(f, "Since last delta:    {:.1}s", secs)?;
        }
        if let Some(secs) = self.secs_since_last_error {
            writeln!(f, "Since last error:    {:.1}s", secs)?;
        }
        Ok(())
    }
}

/// Shared handle to metrics.
pub type SharedMetrics = Arc<SyncMetrics>;

pub fn create_metrics() -> SharedMetrics {
    Arc::new(SyncMetrics::new())
}
