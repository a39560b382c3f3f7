//! Canned-response transport for unit tests.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::transport::{RawResponse, Transport};

pub(crate) const BASE: &str = "http://hermes.test/v1";

#[derive(Debug, Clone)]
enum Route {
    Respond(RawResponse),
    Fail,
}

#[derive(Debug, Default)]
struct State {
    routes: HashMap<String, Route>,
    calls: HashMap<String, usize>,
    queries: HashMap<String, Vec<(String, String)>>,
}

/// Serves registered URLs, answers 404 for everything else and counts calls per URL.
#[derive(Debug, Default)]
pub(crate) struct StubTransport {
    state: Mutex<State>,
}

impl StubTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn json(self: Arc<Self>, url: &str, body: Value) -> Arc<Self> {
        self.status(url, 200, &body.to_string())
    }

    pub(crate) fn status(self: Arc<Self>, url: &str, status: u16, body: &str) -> Arc<Self> {
        let route = Route::Respond(RawResponse {
            status,
            body: body.to_string(),
        });
        self.state
            .lock()
            .unwrap()
            .routes
            .insert(url.to_string(), route);
        self
    }

    pub(crate) fn fail(self: Arc<Self>, url: &str) -> Arc<Self> {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert(url.to_string(), Route::Fail);
        self
    }

    pub(crate) fn calls(&self, url: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.values().sum()
    }

    pub(crate) fn last_query(&self, url: &str) -> Option<Vec<(String, String)>> {
        self.state.lock().unwrap().queries.get(url).cloned()
    }
}

impl Transport for StubTransport {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(url.to_string()).or_default() += 1;
        state.queries.insert(url.to_string(), query.to_vec());

        match state.routes.get(url) {
            Some(Route::Respond(resp)) => Ok(resp.clone()),
            Some(Route::Fail) => Err(Error::Transport {
                url: url.to_string(),
                source: "connection refused".into(),
            }),
            None => Ok(RawResponse {
                status: 404,
                body: r#"{"detail": "Not Found"}"#.to_string(),
            }),
        }
    }
}
