//! Scripted profile source used by the retry and controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

use crate::lookup::types::{Edge, Post, ProfileData, ProfileResponse, ProfileUser, Timeline};
use crate::lookup::{LookupError, ProfileSource};

type Reply = Result<ProfileResponse, LookupError>;

/// Replays canned replies per identifier; unscripted identifiers get an empty profile.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(self, identifier: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(identifier.to_string(), replies.into());
        self
    }

    /// Trip `token` while serving the `n`-th call, as a user pressing stop mid-request would.
    pub(crate) fn cancel_after(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_for(&self, identifier: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == identifier)
            .count()
    }
}

impl ProfileSource for ScriptedSource {
    async fn fetch_profile(&self, username: &str) -> Result<ProfileResponse, LookupError> {
        let call_count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(username.to_string());
            calls.len()
        };
        if let Some((n, token)) = &self.cancel_after
            && call_count == *n
        {
            token.cancel();
        }
        self.scripts
            .lock()
            .unwrap()
            .get_mut(username)
            .and_then(|replies| replies.pop_front())
            .unwrap_or_else(|| Ok(ProfileResponse::default()))
    }
}

pub(crate) fn profile_at(timestamp: i64) -> ProfileResponse {
    ProfileResponse {
        data: Some(ProfileData {
            user: Some(ProfileUser {
                edge_owner_to_timeline_media: Some(Timeline {
                    edges: vec![Edge {
                        node: Some(Post {
                            taken_at_timestamp: Some(timestamp),
                        }),
                    }],
                }),
            }),
        }),
    }
}

pub(crate) fn rate_limited() -> Reply {
    Err(LookupError::RateLimited { retry_after: None })
}

/// A real transport failure: nothing listens on the discard port.
pub(crate) async fn network_error() -> Reply {
    let err = reqwest::Client::new()
        .get("http://127.0.0.1:9/")
        .send()
        .await
        .expect_err("connection to the discard port must fail");
    Err(LookupError::Network(err))
}

/// A request that cannot even be built, as with a malformed endpoint.
pub(crate) fn builder_error() -> Reply {
    let err = reqwest::Client::new()
        .get("not a url")
        .build()
        .expect_err("invalid url must fail to build");
    Err(LookupError::Network(err))
}
