use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The outcome recorded for one processed identifier.
///
/// Serialized with the field names the checkpoint file uses
/// (`username`, `post_date`, `error`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    #[serde(rename = "username")]
    pub identifier: String,
    /// Formatted date, the no-posts sentinel, or an `Error: ...` message.
    #[serde(rename = "post_date")]
    pub value: String,
    #[serde(rename = "error")]
    pub failed: bool,
}

impl ItemResult {
    pub fn success(identifier: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            value: value.into(),
            failed: false,
        }
    }

    pub fn failure(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            value: message.into(),
            failed: true,
        }
    }
}

/// Durable state of one resumable run.
///
/// `results.len() == cursor` holds at every point the controller hands a
/// session out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub cursor: usize,
    pub total: usize,
    pub results: Vec<ItemResult>,
}

impl Session {
    pub fn new(total: usize) -> Self {
        Self {
            cursor: 0,
            total,
            results: Vec::with_capacity(total),
        }
    }

    /// Append the next result and advance the cursor.
    pub fn record(&mut self, result: ItemResult) {
        self.results.push(result);
        self.cursor += 1;
    }

    pub fn is_consistent(&self) -> bool {
        self.cursor <= self.total && self.results.len() == self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.total
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.cursor as f64 / self.total as f64
    }

    pub fn percentage(&self) -> u32 {
        (self.fraction() * 100.0).round() as u32
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.failed).count()
    }
}

/// Estimate the remaining time from the average pace of this run.
///
/// `completed` counts only items processed since the run began, so a resumed
/// session is not credited with work done in an earlier process.
pub fn estimate_remaining(
    elapsed: Duration,
    completed: usize,
    remaining: usize,
) -> Option<Duration> {
    if completed == 0 {
        return None;
    }
    let per_item = elapsed.as_secs_f64() / completed as f64;
    Some(Duration::from_secs_f64(per_item * remaining as f64))
}

/// Render a duration as `1h 2m 3s`, `2m 3s` or `3s`.
pub fn format_eta(eta: Duration) -> String {
    let total = eta.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
