//! GPU collection engine: discovery, vendor dispatch, and the per-vendor adapters.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::metrics::MetricSink;
use crate::redfish::{FetchError, SessionClient};

pub mod dell;
pub mod emit;
pub mod endpoints;
pub mod normalize;
pub mod supermicro;
pub mod vendor;

pub use endpoints::{Endpoints, ResolveError};
pub use vendor::Vendor;

/// Identity of one physical GPU, rebuilt on every scrape
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpuInfo {
    pub id: String,
    pub manufacturer: String,
    pub model: String,
    pub part_number: String,
    pub serial_number: String,
    pub guid: String,
    pub slot: Option<u32>,
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to fetch {resource}: {source}")]
    Fetch {
        resource: &'static str,
        #[source]
        source: FetchError,
    },

    #[error("GPU collection is not implemented for {0} BMCs")]
    UnsupportedVendor(Vendor),
}

/// One BMC: an open session plus the endpoint set and vendor found at connect time.
/// Scrapes borrow this state; a client must not run two scrapes at once.
pub struct Client {
    session: Box<dyn SessionClient>,
    endpoints: Endpoints,
    vendor: Vendor,
}

impl Client {
    /// Open a session, resolve endpoints and classify the vendor.
    /// The session is deleted again if discovery fails.
    pub async fn connect(session: Box<dyn SessionClient>) -> Result<Self, ResolveError> {
        if let Err(e) = session.create_session().await {
            warn!("Could not open Redfish session ({}), using basic auth", e);
        }

        match endpoints::resolve(session.as_ref()).await {
            Ok(discovery) => {
                let vendor = Vendor::classify(&discovery.manufacturer);
                info!(
                    "Discovered {} BMC (manufacturer '{}', system {})",
                    vendor, discovery.manufacturer, discovery.endpoints.system
                );
                Ok(Self {
                    session,
                    endpoints: discovery.endpoints,
                    vendor,
                })
            }
            Err(e) => {
                if let Err(delete_err) = session.delete_session().await {
                    debug!("Session teardown after failed discovery: {}", delete_err);
                }
                Err(e)
            }
        }
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Run one scrape with the adapter for this BMC's vendor.
    pub async fn refresh_gpus(&self, sink: &mut dyn MetricSink) -> Result<(), CollectError> {
        let session = self.session.as_ref();
        match self.vendor {
            Vendor::Dell => dell::collect(session, &self.endpoints, sink).await,
            Vendor::Supermicro => supermicro::collect(session, &self.endpoints, sink).await,
            other => Err(CollectError::UnsupportedVendor(other)),
        }
    }

    /// Delete the BMC session.
    pub async fn close(self) {
        if let Err(e) = self.session.delete_session().await {
            warn!("Failed to delete Redfish session: {}", e);
        }
    }
}
