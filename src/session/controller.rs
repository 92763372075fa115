use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::item::{ItemResult, Session, estimate_remaining, format_eta};
use super::rate_limit::RateLimiter;
use super::retry::{self, LookupOutcome, RetryPolicy};
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::RunConfig;
use crate::error::CheckerError;
use crate::lookup::ProfileSource;

/// Progress notifications, emitted in order while a run advances.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// A saved session was rehydrated; processing continues at `cursor`.
    Resumed { cursor: usize, total: usize },
    ItemStarted {
        index: usize,
        identifier: String,
        total: usize,
    },
    ItemCompleted {
        result: ItemResult,
        cursor: usize,
        total: usize,
        fraction: f64,
        eta: Option<Duration>,
        attempts: u32,
        backoffs: Vec<Duration>,
    },
    /// Cancellation was honored; the session was saved and can be resumed.
    Stopped { cursor: usize, total: usize },
    Completed { total: usize, failed: usize },
}

impl RunEvent {
    /// One human-readable line describing this transition.
    pub fn status_line(&self) -> String {
        match self {
            RunEvent::Resumed { cursor, total } => {
                format!("Resuming previous session: {cursor}/{total} processed.")
            }
            RunEvent::ItemStarted {
                index,
                identifier,
                total,
            } => format!("Processing: {identifier} ({}/{total})", index + 1),
            RunEvent::ItemCompleted {
                cursor,
                total,
                fraction,
                eta,
                ..
            } => {
                let pct = (fraction * 100.0).round() as u32;
                match eta {
                    Some(eta) => {
                        format!("{cursor}/{total} checked ({pct}%), ETA {}", format_eta(*eta))
                    }
                    None => format!("{cursor}/{total} checked ({pct}%)"),
                }
            }
            RunEvent::Stopped { cursor, total } => {
                format!("Stopped at {cursor}/{total}. Run again to resume.")
            }
            RunEvent::Completed { total, failed } => {
                format!("Completed: {total} profiles checked ({failed} failed).")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub session: Session,
    pub outcome: RunOutcome,
}

/// Drives one identifier list through lookups, one item at a time.
pub struct SessionController<'a, S, C> {
    source: &'a S,
    store: &'a C,
    policy: RetryPolicy,
    session_key: String,
    checkpoint_interval: usize,
}

impl<'a, S: ProfileSource, C: CheckpointStore> SessionController<'a, S, C> {
    pub fn new(source: &'a S, store: &'a C, session_key: impl Into<String>) -> Self {
        Self {
            source,
            store,
            policy: RetryPolicy::default(),
            session_key: session_key.into(),
            checkpoint_interval: 10,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_checkpoint_interval(mut self, every: usize) -> Self {
        self.checkpoint_interval = every.max(1);
        self
    }

    /// Process `identifiers` in order, emitting [`RunEvent`]s on `events`.
    ///
    /// Fails only on pre-flight validation; per-item failures are recorded as
    /// failed results. Cancellation is checked before each item and while
    /// waiting between items; a lookup already in flight finishes first.
    pub async fn run(
        &self,
        identifiers: &[String],
        config: &RunConfig,
        events: &UnboundedSender<RunEvent>,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, CheckerError> {
        if identifiers.is_empty() {
            return Err(CheckerError::Input("no identifiers to check".into()));
        }
        config.validate()?;

        let total = identifiers.len();
        let mut session = self.initial_session(total, config.resume);
        let start_cursor = session.cursor;
        if start_cursor > 0 {
            emit(events, RunEvent::Resumed {
                cursor: start_cursor,
                total,
            });
        }

        let limiter = RateLimiter::new(config.min_delay_secs, config.max_delay_secs);
        let started = Instant::now();
        let mut eta = None;

        while !session.is_finished() {
            if cancel.is_cancelled() {
                return Ok(self.stop(session, eta, events));
            }

            let index = session.cursor;
            let identifier = &identifiers[index];
            emit(events, RunEvent::ItemStarted {
                index,
                identifier: identifier.clone(),
                total,
            });

            let lookup = match retry::lookup(self.source, &self.policy, identifier, cancel).await {
                LookupOutcome::Finished(lookup) => lookup,
                LookupOutcome::Cancelled => return Ok(self.stop(session, eta, events)),
            };
            session.record(lookup.result.clone());

            eta = estimate_remaining(
                started.elapsed(),
                session.cursor - start_cursor,
                total - session.cursor,
            );
            emit(events, RunEvent::ItemCompleted {
                result: lookup.result,
                cursor: session.cursor,
                total,
                fraction: session.fraction(),
                eta,
                attempts: lookup.attempts,
                backoffs: lookup.backoffs,
            });

            if session.cursor % self.checkpoint_interval == 0 {
                self.persist(&session, eta);
            }

            if !session.is_finished() && !cancel.is_cancelled() {
                let delay = limiter.next_delay();
                debug!(delay_secs = delay.as_secs(), "waiting before next item");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {}
                    _ = sleep(delay) => {}
                }
            }
        }

        if let Err(e) = self.store.clear(&self.session_key) {
            warn!(error = %e, "failed to clear checkpoint after completion");
        }
        info!(total, failed = session.failed_count(), "run completed");
        emit(events, RunEvent::Completed {
            total,
            failed: session.failed_count(),
        });
        Ok(RunSummary {
            session,
            outcome: RunOutcome::Completed,
        })
    }

    fn initial_session(&self, total: usize, resume: bool) -> Session {
        if resume {
            match self.store.load(&self.session_key) {
                Ok(Some(checkpoint)) => {
                    let session = checkpoint.into_session();
                    if session.total == total && session.is_consistent() {
                        info!(cursor = session.cursor, total, "resuming saved session");
                        return session;
                    }
                    info!(
                        saved_total = session.total,
                        total, "saved session does not match input, starting over"
                    );
                }
                Ok(None) => return Session::new(total),
                Err(e) => warn!(error = %e, "failed to read checkpoint, starting over"),
            }
        }
        if let Err(e) = self.store.clear(&self.session_key) {
            warn!(error = %e, "failed to clear stale checkpoint");
        }
        Session::new(total)
    }

    fn persist(&self, session: &Session, eta: Option<Duration>) {
        let checkpoint = Checkpoint::from_session(session, eta);
        match self.store.save(&self.session_key, &checkpoint) {
            Ok(()) => debug!(cursor = session.cursor, "checkpoint committed"),
            Err(e) => warn!(error = %e, cursor = session.cursor, "failed to save checkpoint"),
        }
    }

    fn stop(
        &self,
        session: Session,
        eta: Option<Duration>,
        events: &UnboundedSender<RunEvent>,
    ) -> RunSummary {
        self.persist(&session, eta);
        info!(cursor = session.cursor, total = session.total, "run stopped");
        emit(events, RunEvent::Stopped {
            cursor: session.cursor,
            total: session.total,
        });
        RunSummary {
            session,
            outcome: RunOutcome::Stopped,
        }
    }
}

// A closed receiver only means nobody is watching; the run carries on.
fn emit(events: &UnboundedSender<RunEvent>, event: RunEvent) {
    let _ = events.send(event);
}
