pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpProfileClient, ProfileSource};
pub use error::{FailureKind, LookupError};
