use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Error, Result, error_body_message};
use crate::transport::Transport;
use crate::util::urljoin;

/// Query parameters for a GET request.
///
/// List values expand to one `key=value` pair per element and `None` values are
/// left out of the request entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    pub fn list<I>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        for v in values {
            self.pairs.push((key.to_string(), v.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

/// GETs JSON resources relative to the service's versioned base URL.
///
/// Cheap to clone: every client tier holds its own copy sharing one transport.
#[derive(Clone)]
pub struct Fetcher {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches `path` and deserializes the body into `T`.
    pub fn fetch<T: DeserializeOwned>(&self, path: &str, query: &Query) -> Result<T> {
        let (url, body) = self.get(path, query)?;
        serde_json::from_str::<T>(&body).map_err(|source| Error::Decode { url, source })
    }

    /// Fetches `path` as untyped JSON.
    pub fn fetch_json(&self, path: &str, query: &Query) -> Result<Value> {
        self.fetch(path, query)
    }

    /// Fetches `path` and returns the body undecoded, e.g. QuakeML documents.
    pub fn fetch_text(&self, path: &str, query: &Query) -> Result<String> {
        self.get(path, query).map(|(_, body)| body)
    }

    fn get(&self, path: &str, query: &Query) -> Result<(String, String)> {
        let url = urljoin(&self.base_url, path);
        debug!(url = %url, query = ?query.pairs(), "GET");

        let resp = self.transport.get(&url, query.pairs()).inspect_err(|e| {
            warn!(url = %url, error = %e, "request failed");
        })?;

        match resp.status {
            // 204 means the resource exists in the URL space but holds nothing.
            404 | 204 => {
                debug!(url = %url, status = resp.status, "no matching resource");
                Err(Error::not_found(url))
            }
            _ if resp.is_success() => Ok((url, resp.body)),
            status => {
                let body = error_body_message(&resp.body);
                warn!(url = %url, status, body = %body, "unexpected status");
                Err(Error::HttpStatus { status, url, body })
            }
        }
    }
}
