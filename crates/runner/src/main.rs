use book_server::{BookServerClient, Verdict};
use clap::Parser;
use common::{Backoff, Endpoints};
use connector::{ReconnectPolicy, SyncConfig, SyncController, SyncOutcome, WebSocketFeed};
use metrics::create_metrics;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Interval for periodic sync status logging.
const STATUS_LOG_INTERVAL: Duration = Duration::from_secs(30);

/// Random spread applied when the reconnect delay is allowed to grow.
const RECONNECT_JITTER: f64 = 0.1;

/// Mirror an order book from a snapshot plus delta stream and validate it
/// against the server at a target sequence.
#[derive(Parser, Debug)]
#[command(name = "orderbook-mirror", version)]
struct Cli {
    /// Target order book sequence number
    #[arg(long = "ob-id", default_value_t = 10_000)]
    ob_id: u64,

    /// Levels per side to fetch and to submit
    #[arg(long, default_value_t = connector::DEFAULT_DEPTH)]
    depth: usize,

    /// Base URL of the order book server [env: ORDER_BOOK_SERVER_URL]
    #[arg(long)]
    server_url: Option<String>,

    /// WebSocket URL of the delta feed [env: ORDER_BOOK_FEED_URL]
    #[arg(long)]
    feed_url: Option<String>,

    /// Delay before the first reconnect attempt
    #[arg(long, default_value_t = 1000)]
    reconnect_delay_ms: u64,

    /// Upper bound for the reconnect delay; defaults to the base delay
    #[arg(long)]
    max_reconnect_delay_ms: Option<u64>,

    /// Reload the snapshot before every reconnect instead of resuming
    #[arg(long)]
    resnapshot_on_reconnect: bool,

    /// Log progress every N sequence numbers (0 disables)
    #[arg(long, default_value_t = connector::DEFAULT_PROGRESS_INTERVAL)]
    progress_interval: u64,
}

impl Cli {
    fn endpoints(&self) -> Endpoints {
        let defaults = Endpoints::from_env();
        Endpoints::new(
            self.server_url.clone().unwrap_or(defaults.server_url),
            self.feed_url.clone().unwrap_or(defaults.feed_url),
        )
    }

    fn backoff(&self) -> Backoff {
        let base = Duration::from_millis(self.reconnect_delay_ms);
        let max = self
            .max_reconnect_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(base);
        let jitter = if max > base { RECONNECT_JITTER } else { 0.0 };
        Backoff::new(base, max, jitter)
    }

    fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig::new(self.ob_id, self.depth);
        config.backoff = self.backoff();
        config.progress_interval = self.progress_interval;
        if self.resnapshot_on_reconnect {
            config.reconnect_policy = ReconnectPolicy::Resnapshot;
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    common::init_logging();

    let cli = Cli::parse();
    let endpoints = cli.endpoints();
    let config = cli.sync_config();

    info!(
        server_url = %endpoints.server_url,
        feed_url = %endpoints.feed_url,
        target_sequence = config.target_sequence,
        depth = config.depth,
        "Starting order book mirror"
    );

    let server = match BookServerClient::with_default_timeout(&endpoints.server_url) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Failed to create order book server client");
            return ExitCode::FAILURE;
        }
    };
    let feed = WebSocketFeed::new(endpoints.feed_url.clone());

    let metrics = create_metrics();

    // Create shutdown signal channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn ctrl_c handler
    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, initiating shutdown");
            let _ = ctrl_c_tx.send(true);
        }
    });

    // Spawn periodic status reporter
    let status_metrics = metrics.clone();
    let mut status_shutdown_rx = shutdown_tx.subscribe();
    let status_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATUS_LOG_INTERVAL);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let snapshot = status_metrics.snapshot();
                    info!(
                        deltas = snapshot.deltas_applied,
                        deltas_per_sec = format!("{:.1}", snapshot.deltas_per_second),
                        stale = snapshot.stale_deltas,
                        gaps = snapshot.sequence_gaps,
                        reconnects = snapshot.reconnect_attempts,
                        "Sync status"
                    );
                }
                _ = status_shutdown_rx.changed() => {
                    if *status_shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    let mut controller = SyncController::new(config, server, feed, metrics.clone());
    let result = controller.run(shutdown_rx).await;
    info!(
        target_sequence = controller.config().target_sequence,
        last_sequence = controller.mirror().last_sequence(),
        state = %controller.state(),
        "Sync finished"
    );

    // Stop the status reporter
    let _ = shutdown_tx.send(true);
    let _ = status_handle.await;

    let snapshot = metrics.snapshot();
    println!("\n{}", snapshot);
    if snapshot.has_gaps() {
        warn!(
            missing = snapshot.sequence_gaps,
            "Delta feed skipped sequence numbers during this run"
        );
    }

    match result {
        Ok(SyncOutcome::Validated(verdict)) => {
            match verdict {
                Verdict::Passed => info!("Run complete, order book matched the server"),
                _ => warn!("Run complete, order book did not validate"),
            }
            ExitCode::SUCCESS
        }
        Ok(SyncOutcome::Interrupted) => {
            info!("Interrupted by user");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Order book sync failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["orderbook-mirror"]).unwrap();

        assert_eq!(cli.ob_id, 10_000);
        assert_eq!(cli.depth, 100);
        assert!(cli.server_url.is_none());
        assert!(!cli.resnapshot_on_reconnect);

        let config = cli.sync_config();
        assert_eq!(config.target_sequence, 10_000);
        assert_eq!(config.reconnect_policy, ReconnectPolicy::Resume);
        assert_eq!(config.progress_interval, 1000);
        assert!(config.backoff.is_fixed());
    }

    #[test]
    fn test_explicit_flags() {
        let cli = Cli::try_parse_from([
            "orderbook-mirror",
            "--ob-id",
            "5",
            "--depth",
            "10",
            "--server-url",
            "http://book:8080/",
            "--feed-url",
            "ws://book:8081/delta",
            "--reconnect-delay-ms",
            "250",
            "--max-reconnect-delay-ms",
            "4000",
            "--resnapshot-on-reconnect",
            "--progress-interval",
            "0",
        ])
        .unwrap();

        let endpoints = cli.endpoints();
        assert_eq!(endpoints.server_url, "http://book:8080");
        assert_eq!(endpoints.feed_url, "ws://book:8081/delta");

        let config = cli.sync_config();
        assert_eq!(config.target_sequence, 5);
        assert_eq!(config.depth, 10);
        assert_eq!(config.reconnect_policy, ReconnectPolicy::Resnapshot);
        assert_eq!(config.progress_interval, 0);
        assert!(!config.backoff.is_fixed());
    }

    #[test]
    fn test_rejects_non_numeric_target() {
        assert!(Cli::try_parse_from(["orderbook-mirror", "--ob-id", "latest"]).is_err());
    }
}
