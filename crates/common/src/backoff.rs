use rand::Rng;
use std::time::Duration;

/// Reconnect delay schedule for the delta stream.
///
/// The delay doubles per attempt from `base` up to `max_delay`, plus up to
/// `jitter_factor` of random spread. With `max_delay == base` and no jitter
/// every attempt waits exactly `base`, which is the default one-second wait
/// between stream reconnects.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max_delay: Duration,
    jitter_factor: f64,
    attempt: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(1))
    }
}

impl Backoff {
    /// Create a backoff schedule.
    ///
    /// `max_delay` below `base` is raised to `base`; negative jitter is treated as none.
    pub fn new(base: Duration, max_delay: Duration, jitter_factor: f64) -> Self {
        Self {
            base,
            max_delay: max_delay.max(base),
            jitter_factor: jitter_factor.max(0.0),
            attempt: 0,
        }
    }

    /// A schedule that always waits `delay`.
    pub fn fixed(delay: Duration) -> Self {
        Self::new(delay, delay, 0.0)
    }

    /// True when every attempt yields the same delay.
    pub fn is_fixed(&self) -> bool {
        self.base == self.max_delay && self.jitter_factor == 0.0
    }

    /// Delay before the next attempt; advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let exp_delay = self.base.saturating_mul(2u32.saturating_pow(self.attempt));
        let capped = exp_delay.min(self.max_delay);

        let jitter_range = capped.as_secs_f64() * self.jitter_factor;
        let jitter = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };

        self.attempt = self.attempt.saturating_add(1);

        if jitter == 0.0 {
            capped
        } else {
            Duration::from_secs_f64((capped.as_secs_f64() + jitter).max(0.0))
        }
    }

    /// Forget previous attempts, e.g. after a session that delivered data.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of delays handed out since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
