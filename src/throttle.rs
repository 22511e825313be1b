use std::time::Duration;

use rand::Rng as _;

/// Minimum pause between two consecutive invocations, optionally with random jitter on top.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ThrottlePolicy {
    min_delay: Duration,
    jitter: Duration,
}

impl ThrottlePolicy {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Never shorter than `min_delay`.
    pub fn next_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.min_delay;
        }

        self.min_delay + self.jitter.mul_f64(rand::thread_rng().gen_range(0.0..=1.0))
    }

    pub async fn wait(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }

        tracing::debug!(delay_ms = delay.as_millis() as u64, "throttling");
        tokio::time::sleep(delay).await;
    }
}
