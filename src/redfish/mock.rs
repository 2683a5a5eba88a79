//! In-memory BMC used by tests and `--check` dry runs against captured fixtures.
//! Serves JSON documents from a path map and records every request it receives.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{FetchError, SessionClient};

#[derive(Debug, Default)]
pub struct MockBmc {
    resources: HashMap<String, serde_json::Value>,
    /// Paths that exist but answer with a server error
    failing: HashSet<String>,
    requests: Mutex<Vec<String>>,
    sessions_created: AtomicUsize,
    sessions_deleted: AtomicUsize,
}

impl MockBmc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture shaped as `{"<path>": <document>, ...}`.
    pub fn from_fixture(json: &str) -> Result<Self, serde_json::Error> {
        let resources: HashMap<String, serde_json::Value> = serde_json::from_str(json)?;
        Ok(Self {
            resources,
            ..Self::default()
        })
    }

    pub fn with_resource(mut self, path: &str, document: serde_json::Value) -> Self {
        self.resources.insert(path.to_string(), document);
        self
    }

    pub fn without_resource(mut self, path: &str) -> Self {
        self.resources.remove(path);
        self
    }

    pub fn failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Every GET path served so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn sessions_created(&self) -> usize {
        self.sessions_created.load(Ordering::SeqCst)
    }

    pub fn sessions_deleted(&self) -> usize {
        self.sessions_deleted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionClient for MockBmc {
    async fn create_session(&self) -> Result<(), FetchError> {
        self.sessions_created.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_session(&self) -> Result<(), FetchError> {
        self.sessions_deleted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(path.to_string());
        }

        if self.failing.contains(path) {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: 500,
            });
        }

        self.resources
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}
