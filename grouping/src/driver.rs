use atlas_layout::Grouping;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RetryConfig;
use crate::error::GroupingError;
use crate::grouper::{Grouper, GroupingRequest};

/// Which grouper produced the final grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Primary,
    Fallback,
}

/// Outcome of [`GroupingDriver::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub grouping: Grouping,
    pub source: Source,

    /// Calls made to the primary grouper, the undercount retry included.
    pub attempts: u32,
}

/// Retries a primary grouper with exponential backoff, then falls back.
#[derive(Debug, Clone, Default)]
pub struct GroupingDriver {
    retry: RetryConfig,
}

impl GroupingDriver {
    pub fn new(retry: RetryConfig) -> Self {
        Self { retry }
    }

    /// Resolves a grouping for `req`.
    ///
    /// The primary gets up to `max_attempts` tries. Overload, transport
    /// failures and malformed replies are retried after a backoff; any
    /// other error (auth, bad request) goes straight to the fallback. When
    /// the primary gives up the fallback's answer is used, and only a
    /// fallback error is returned to the caller. A result with fewer than
    /// `min_groups` groups earns a working primary exactly one more call;
    /// if that does not help, the undercount is accepted.
    pub async fn resolve(
        &self,
        primary: &dyn Grouper,
        fallback: &dyn Grouper,
        req: &GroupingRequest,
        min_groups: usize,
    ) -> Result<Resolved, GroupingError> {
        if req.items.is_empty() {
            return Err(GroupingError::EmptyInput);
        }

        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempts = 0u32;
        let mut primary_result = None;
        let mut rejected = false;
        while attempts < max_attempts {
            if attempts > 0 {
                let delay = self.retry.delay(attempts - 1, &mut rand::thread_rng());
                warn!(
                    grouper = primary.name(),
                    attempt = attempts + 1,
                    max_attempts,
                    delay_secs = delay.as_secs_f64(),
                    "grouping: retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }
            attempts += 1;

            match primary.group(req).await {
                Ok(grouping) => {
                    primary_result = Some(grouping);
                    break;
                }
                Err(e) if should_retry(&e) => warn!(
                    grouper = primary.name(),
                    attempt = attempts,
                    error = %e,
                    "grouping: attempt failed"
                ),
                Err(e) => {
                    warn!(
                        grouper = primary.name(),
                        error = %e,
                        "grouping: primary rejected the request, not retrying"
                    );
                    rejected = true;
                    break;
                }
            }
        }

        let (mut grouping, mut source) = match primary_result {
            Some(grouping) => (grouping, Source::Primary),
            None => {
                warn!(
                    primary = primary.name(),
                    fallback = fallback.name(),
                    attempts,
                    "grouping: primary exhausted, using fallback"
                );
                (fallback.group(req).await?, Source::Fallback)
            }
        };

        let count = grouping.group_count();
        if count < min_groups && !rejected {
            warn!(
                groups = count,
                min_groups, "grouping: too few groups, asking primary once more"
            );
            attempts += 1;
            match primary.group(req).await {
                Ok(regrouped) if regrouped.group_count() > count => {
                    grouping = regrouped;
                    source = Source::Primary;
                }
                Ok(regrouped) => warn!(
                    groups = regrouped.group_count(),
                    "grouping: undercount persists, keeping first result"
                ),
                Err(e) => warn!(error = %e, "grouping: regroup call failed"),
            }
        }

        info!(
            source = ?source,
            attempts,
            groups = grouping.group_count(),
            "grouping: resolved"
        );
        Ok(Resolved {
            grouping,
            source,
            attempts,
        })
    }
}

/// Errors worth another attempt after a backoff.
fn should_retry(err: &GroupingError) -> bool {
    err.is_retryable() || matches!(err, GroupingError::Malformed(_))
}
