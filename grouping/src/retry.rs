use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

impl RetryConfig {
    /// Wait before retry number `retry` (zero-based), jitter included.
    pub fn delay<R: Rng>(&self, retry: u32, rng: &mut R) -> Duration {
        let base = self.backoff_secs(retry);
        let jitter = if self.jitter > 0.0 && base > 0.0 {
            rng.r#gen::<f64>() * self.jitter.min(1.0) * base
        } else {
            0.0
        };
        Duration::from_secs_f64(base + jitter)
    }

    /// Backoff without jitter: `min(base * 2^retry, max)`.
    pub fn backoff_secs(&self, retry: u32) -> f64 {
        let factor = 2f64.powi(retry.min(62) as i32);
        (self.base_delay_secs.max(0.0) * factor).min(self.max_delay_secs.max(0.0))
    }
}
