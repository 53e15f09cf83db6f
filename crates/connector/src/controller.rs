//! Sync controller: drives the snapshot + delta protocol to validation.
//!
//! ```text
//! Idle -> ServerStarting -> SnapshotLoading -> StreamConnecting -> Streaming -> Validating -> Done
//!                                 ^                    ^               |
//!                                 |                    +-- Reconnecting <--+
//!                                 +---- (Resnapshot) ------+
//! ```

use book_server::{BookServer, Verdict};
use common::Backoff;
use metrics::SharedMetrics;
use model::{BookSnapshot, DeltaMessage};
use orderbook::OrderBookMirror;
use std::fmt;
use std::future::Future;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{ConnectorError, SyncError};
use crate::feed::DeltaFeed;
use crate::frame::decode_frame;

/// Default number of levels fetched and reported per side.
pub const DEFAULT_DEPTH: usize = 100;

/// Default spacing, in sequence numbers, between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// What to do with mirror state when the delta feed reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    /// Keep the mirror and continue from the next newer sequence.
    #[default]
    Resume,
    /// Reload a fresh snapshot before reopening the feed.
    Resnapshot,
}

/// Parameters of one sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Sequence number at which the mirror is submitted for assertion.
    pub target_sequence: u64,
    /// Levels per side, for both the snapshot request and the submitted view.
    pub depth: usize,
    /// Delay schedule between feed reconnects.
    pub backoff: Backoff,
    pub reconnect_policy: ReconnectPolicy,
    /// Log progress each time the sequence crosses a multiple of this; 0 disables.
    pub progress_interval: u64,
}

impl SyncConfig {
    pub fn new(target_sequence: u64, depth: usize) -> Self {
        Self {
            target_sequence,
            depth,
            backoff: Backoff::default(),
            reconnect_policy: ReconnectPolicy::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Protocol phase of a [`SyncController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    ServerStarting,
    SnapshotLoading,
    StreamConnecting,
    Streaming,
    Reconnecting,
    Validating,
    Done,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Idle => "idle",
            SyncState::ServerStarting => "server_starting",
            SyncState::SnapshotLoading => "snapshot_loading",
            SyncState::StreamConnecting => "stream_connecting",
            SyncState::Streaming => "streaming",
            SyncState::Reconnecting => "reconnecting",
            SyncState::Validating => "validating",
            SyncState::Done => "done",
        };
        f.write_str(name)
    }
}

/// How a run that did not fail at startup ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The target was reached and the book was submitted.
    Validated(Verdict),
    /// Shutdown was requested before validation.
    Interrupted,
}

/// How one feed session ended.
enum SessionEnd {
    TargetReached,
    Shutdown,
    ConnectFailed(ConnectorError),
    Disconnected { error: ConnectorError, frames: u64 },
}

/// Owns the mirror and is its only writer.
pub struct SyncController<S, F> {
    config: SyncConfig,
    server: S,
    feed: F,
    mirror: OrderBookMirror,
    state: SyncState,
    backoff: Backoff,
    metrics: SharedMetrics,
}

impl<S: BookServer, F: DeltaFeed> SyncController<S, F> {
    pub fn new(config: SyncConfig, server: S, feed: F, metrics: SharedMetrics) -> Self {
        let backoff = config.backoff.clone();
        Self {
            config,
            server,
            feed,
            mirror: OrderBookMirror::new(),
            state: SyncState::Idle,
            backoff,
            metrics,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn mirror(&self) -> &OrderBookMirror {
        &self.mirror
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run the protocol to completion.
    ///
    /// Returns an error only for startup failures (server start or initial
    /// snapshot). A rejected assertion is still `Ok`.
    pub async fn run(
        &mut self,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<SyncOutcome, SyncError> {
        info!(
            target_sequence = self.config.target_sequence,
            depth = self.config.depth,
            policy = ?self.config.reconnect_policy,
            "Starting order book sync"
        );

        self.transition(SyncState::ServerStarting);
        let started = or_shutdown(&mut shutdown_rx, self.server.start()).await;
        let Some(started) = started else {
            return Ok(self.interrupt().await);
        };
        started.map_err(SyncError::Start)?;

        self.transition(SyncState::SnapshotLoading);
        let snapshot = or_shutdown(&mut shutdown_rx, self.server.snapshot(self.config.depth)).await;
        let Some(snapshot) = snapshot else {
            return Ok(self.interrupt().await);
        };
        self.load_snapshot(snapshot.map_err(SyncError::Snapshot)?);

        while !self.target_reached() {
            match self.stream_session(&mut shutdown_rx).await {
                SessionEnd::TargetReached => break,
                SessionEnd::Shutdown => return Ok(self.interrupt().await),
                SessionEnd::ConnectFailed(e) => {
                    self.metrics.inc_connection_failures();
                    warn!(error = %e, "Delta feed connection failed");
                }
                SessionEnd::Disconnected { error, frames } => {
                    if frames > 0 {
                        self.backoff.reset();
                    }
                    warn!(
                        error = %error,
                        frames,
                        last_sequence = self.mirror.last_sequence(),
                        "Delta feed disconnected"
                    );
                }
            }

            if !self.pause_before_retry(&mut shutdown_rx).await {
                return Ok(self.interrupt().await);
            }
            if self.config.reconnect_policy == ReconnectPolicy::Resnapshot
                && !self.refresh_snapshot(&mut shutdown_rx).await
            {
                return Ok(self.interrupt().await);
            }
        }

        self.transition(SyncState::Validating);
        let verdict = or_shutdown(&mut shutdown_rx, self.validate()).await;
        let Some(verdict) = verdict else {
            return Ok(self.interrupt().await);
        };

        self.feed.close().await;
        self.transition(SyncState::Done);
        Ok(SyncOutcome::Validated(verdict))
    }

    /// Reload the snapshot, retrying with backoff until it succeeds.
    /// Returns false if shutdown arrived first.
    async fn refresh_snapshot(&mut self, shutdown_rx: &mut watch::Receiver<bool>) -> bool {
        loop {
            self.transition(SyncState::SnapshotLoading);
            let refreshed = or_shutdown(shutdown_rx, self.server.snapshot(self.config.depth)).await;
            match refreshed {
                None => return false,
                Some(Ok(snapshot)) => {
                    self.load_snapshot(snapshot);
                    return true;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Snapshot refresh failed");
                    if !self.pause_before_retry(shutdown_rx).await {
                        return false;
                    }
                }
            }
        }
    }

    /// One connect + read cycle. Leaves the feed open when the target is reached.
    async fn stream_session(&mut self, shutdown_rx: &mut watch::Receiver<bool>) -> SessionEnd {
        self.transition(SyncState::StreamConnecting);
        match or_shutdown(shutdown_rx, self.feed.connect()).await {
            None => return SessionEnd::Shutdown,
            Some(Err(e)) => return SessionEnd::ConnectFailed(e),
            Some(Ok(())) => {}
        }

        self.transition(SyncState::Streaming);
        let mut frames = 0u64;

        loop {
            let next = tokio::select! {
                biased;

                _ = wait_for_shutdown(shutdown_rx) => return SessionEnd::Shutdown,
                next = self.feed.next_frame() => next,
            };

            let payload = match next {
                Some(Ok(payload)) => payload,
                Some(Err(error)) => {
                    self.metrics.inc_websocket_errors();
                    error!(error = %error, "Delta feed error");
                    return SessionEnd::Disconnected { error, frames };
                }
                None => {
                    return SessionEnd::Disconnected {
                        error: ConnectorError::ConnectionClosed,
                        frames,
                    };
                }
            };

            frames += 1;
            if self.handle_frame(&payload) {
                return SessionEnd::TargetReached;
            }
        }
    }

    /// Decode and apply one frame. Returns true once the target is reached.
    fn handle_frame(&mut self, payload: &[u8]) -> bool {
        self.metrics.inc_frames_received();

        match decode_frame(payload) {
            Ok(message) => self.apply(message),
            Err(e) => {
                self.metrics.inc_malformed_frames();
                warn!(error = %e, "Discarding malformed delta frame");
                false
            }
        }
    }

    fn apply(&mut self, message: DeltaMessage) -> bool {
        let last = self.mirror.last_sequence();

        if message.sequence <= last {
            self.metrics.inc_stale_deltas();
            debug!(
                sequence = message.sequence,
                last_sequence = last,
                "Dropping stale delta"
            );
            return false;
        }

        if message.sequence > last + 1 {
            let missing = message.sequence - last - 1;
            self.metrics.add_sequence_gap(missing);
            warn!(
                expected = last + 1,
                got = message.sequence,
                missing,
                "Delta sequence gap detected"
            );
        }

        self.mirror.apply_delta(&message);
        self.metrics.inc_deltas_applied();

        if crosses_interval(last, message.sequence, self.config.progress_interval) {
            info!(
                sequence = message.sequence,
                bid_levels = self.mirror.bid_levels(),
                ask_levels = self.mirror.ask_levels(),
                "Sync progress"
            );
        }

        if self.target_reached() {
            info!(
                target_sequence = self.config.target_sequence,
                sequence = message.sequence,
                "Reached target sequence"
            );
            return true;
        }
        false
    }

    fn load_snapshot(&mut self, snapshot: BookSnapshot) {
        self.mirror
            .load_snapshot(snapshot.last_update_id, &snapshot.bids, &snapshot.asks);
        self.metrics.inc_snapshots_loaded();

        info!(
            last_update_id = snapshot.last_update_id,
            bid_levels = self.mirror.bid_levels(),
            ask_levels = self.mirror.ask_levels(),
            "Snapshot processed"
        );
    }

    async fn validate(&self) -> Verdict {
        let view = self.mirror.serialize(self.config.depth);
        info!(
            last_update_id = view.last_update_id,
            bids = view.bids.len(),
            asks = view.asks.len(),
            "Submitting order book for validation"
        );

        let verdict = self.server.submit_assertion(&view).await;
        match &verdict {
            Verdict::Passed => info!("Order book validation PASSED"),
            Verdict::Rejected { status, body } => {
                error!(status, details = %body, "Order book validation FAILED")
            }
            Verdict::Undelivered(reason) => {
                error!(reason = %reason, "Order book validation could not be delivered")
            }
        }
        verdict
    }

    /// Wait out the next backoff delay. Returns false if shutdown arrived first.
    async fn pause_before_retry(&mut self, shutdown_rx: &mut watch::Receiver<bool>) -> bool {
        self.transition(SyncState::Reconnecting);
        self.metrics.inc_reconnect_attempts();

        let delay = self.backoff.next_delay();
        info!(
            attempt = self.backoff.attempt(),
            delay_ms = delay.as_millis() as u64,
            "Reconnecting to delta feed"
        );

        or_shutdown(shutdown_rx, tokio::time::sleep(delay))
            .await
            .is_some()
    }

    async fn interrupt(&mut self) -> SyncOutcome {
        info!(state = %self.state, "Shutdown requested, stopping sync");
        self.feed.close().await;
        self.transition(SyncState::Done);
        SyncOutcome::Interrupted
    }

    fn target_reached(&self) -> bool {
        self.mirror.last_sequence() >= self.config.target_sequence
    }

    fn transition(&mut self, next: SyncState) {
        if self.state != next {
            info!(from = %self.state, to = %next, "Sync state transition");
            self.state = next;
        }
    }
}

/// True when moving from `prev` to `next` passes a multiple of `interval`.
fn crosses_interval(prev: u64, next: u64, interval: u64) -> bool {
    interval > 0 && next / interval > prev / interval
}

/// Resolves once the shutdown flag is set. Never resolves if the sender is gone.
async fn wait_for_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown_rx.borrow() {
            return;
        }
        if shutdown_rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Run `fut` unless shutdown is signalled first.
async fn or_shutdown<T>(
    shutdown_rx: &mut watch::Receiver<bool>,
    fut: impl Future<Output = T>,
) -> Option<T> {
    tokio::select! {
        biased;

        _ = wait_for_shutdown(shutdown_rx) => None,
        out = fut => Some(out),
    }
}
