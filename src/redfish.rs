//! Redfish transport seam: the SessionClient trait, fetch errors, and shared resource models.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub mod mock;
pub mod model;
pub mod session;

pub use mock::MockBmc;
pub use session::RedfishSession;

/// Why a resource could not be fetched.
/// Callers that only care about success treat every variant as "not ok".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("unexpected HTTP status {status} for {path}")]
    Status { path: String, status: u16 },

    #[error("transport error for {path}: {message}")]
    Transport { path: String, message: String },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Open an authenticated session with the BMC
    async fn create_session(&self) -> Result<(), FetchError>;

    /// Tear down the session opened by `create_session` (no-op if none is open)
    async fn delete_session(&self) -> Result<(), FetchError>;

    /// GET a resource by path and return the raw JSON document
    async fn get_json(&self, path: &str) -> Result<serde_json::Value, FetchError>;
}

#[async_trait]
impl<T: SessionClient + ?Sized> SessionClient for Arc<T> {
    async fn create_session(&self) -> Result<(), FetchError> {
        (**self).create_session().await
    }

    async fn delete_session(&self) -> Result<(), FetchError> {
        (**self).delete_session().await
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value, FetchError> {
        (**self).get_json(path).await
    }
}

/// GET a resource and decode it into the requested shape.
pub async fn fetch<T: DeserializeOwned>(
    session: &dyn SessionClient,
    path: &str,
) -> Result<T, FetchError> {
    let document = session.get_json(path).await?;
    serde_json::from_value(document).map_err(|source| FetchError::Decode {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redfish::model::Collection;
    use serde_json::json;

    #[tokio::test]
    async fn fetch_decodes_document() {
        let bmc = MockBmc::new().with_resource(
            "/redfish/v1/Systems",
            json!({"Members": [{"@odata.id": "/redfish/v1/Systems/1"}]}),
        );

        let collection: Collection = fetch(&bmc, "/redfish/v1/Systems").await.unwrap();
        assert_eq!(collection.members.links(), vec!["/redfish/v1/Systems/1"]);
    }

    #[tokio::test]
    async fn fetch_reports_decode_failures() {
        let bmc = MockBmc::new().with_resource("/redfish/v1/Systems", json!({"Members": 42}));

        let err = fetch::<Collection>(&bmc, "/redfish/v1/Systems").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn fetch_reports_missing_resources() {
        let bmc = MockBmc::new();

        let err = fetch::<Collection>(&bmc, "/redfish/v1/Nowhere").await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound(path) if path == "/redfish/v1/Nowhere"));
    }
}
