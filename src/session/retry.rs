use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::item::ItemResult;
use crate::lookup::{FailureKind, LookupError, ProfileSource};

/// Upper bound applied to a server-provided `Retry-After`.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Configuration for retry behavior around a single lookup.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per identifier, including the first.
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Upper bound of the random jitter added to each backoff.
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            jitter_ms: 500,
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp(String),
}

impl RetryPolicy {
    /// Deterministic part of the backoff after `attempt` failed attempts.
    /// delay = base_delay_ms * 2^(attempt - 1)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_millis(
            self.base_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1))),
        )
    }

    /// Full wait before the next attempt: exponential delay plus jitter, raised
    /// to the server's `Retry-After` when that is longer.
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let jitter = if self.jitter_ms > 0 {
            Duration::from_millis(rand::thread_rng().gen_range(0..=self.jitter_ms))
        } else {
            Duration::ZERO
        };
        let computed = self.delay_for_attempt(attempt) + jitter;
        match retry_after {
            Some(hint) => computed.max(hint.min(MAX_RETRY_AFTER)),
            None => computed,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn decide(&self, attempt: u32, err: &LookupError) -> RetryDecision {
        let kind = err.kind();
        if kind == FailureKind::Permanent {
            return RetryDecision::GiveUp(err.result_message());
        }
        if attempt >= self.attempts() {
            let message = match kind {
                FailureKind::RateLimited => {
                    format!("Error: Rate limited after {attempt} attempts")
                }
                _ => format!("Error: Network failure after {attempt} attempts ({err})"),
            };
            return RetryDecision::GiveUp(message);
        }
        let retry_after = match err {
            LookupError::RateLimited { retry_after } => *retry_after,
            _ => None,
        };
        RetryDecision::Retry(self.backoff(attempt, retry_after))
    }
}

/// A finished lookup for one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLookup {
    pub result: ItemResult,
    pub attempts: u32,
    /// Backoff waits applied between attempts, in order.
    pub backoffs: Vec<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Finished(ItemLookup),
    /// Cancellation arrived during a backoff wait; nothing should be recorded.
    Cancelled,
}

/// Look up one identifier, retrying rate-limited and transport failures.
///
/// Ordinary failures come back as a failed [`ItemResult`]. An attempt that is
/// already in flight always runs to completion; cancellation is only observed
/// while waiting between attempts.
pub async fn lookup<S: ProfileSource>(
    source: &S,
    policy: &RetryPolicy,
    identifier: &str,
    cancel: &CancellationToken,
) -> LookupOutcome {
    let mut attempt = 0;
    let mut backoffs = Vec::new();

    loop {
        attempt += 1;
        let err = match source.fetch_profile(identifier).await {
            Ok(profile) => {
                let result = match profile.latest_post() {
                    Some(latest) => ItemResult::success(identifier, latest.into_value()),
                    None => ItemResult::failure(
                        identifier,
                        LookupError::InvalidPayload("timestamp out of range".into())
                            .result_message(),
                    ),
                };
                return LookupOutcome::Finished(ItemLookup {
                    result,
                    attempts: attempt,
                    backoffs,
                });
            }
            Err(err) => err,
        };

        match policy.decide(attempt, &err) {
            RetryDecision::GiveUp(message) => {
                debug!(%identifier, attempt, %err, "giving up");
                return LookupOutcome::Finished(ItemLookup {
                    result: ItemResult::failure(identifier, message),
                    attempts: attempt,
                    backoffs,
                });
            }
            RetryDecision::Retry(wait) => {
                info!(
                    %identifier,
                    attempt,
                    max = policy.attempts(),
                    kind = %err.kind(),
                    wait_ms = wait.as_millis() as u64,
                    "retrying lookup"
                );
                backoffs.push(wait);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return LookupOutcome::Cancelled,
                    _ = sleep(wait) => {}
                }
            }
        }
    }
}
