mod controller;
mod item;
mod rate_limit;
mod retry;
#[cfg(test)]
pub(crate) mod testing;

pub use controller::{RunEvent, RunOutcome, SessionController};
pub use item::{ItemResult, Session, format_eta};
pub use retry::RetryPolicy;
