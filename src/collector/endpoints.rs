//! Endpoint discovery: walks the Redfish service root once per host to find the
//! chassis, system, processor, PCIe device and thermal resources.

use thiserror::Error;
use tracing::debug;

use crate::redfish::model::{Chassis, Collection, ComputerSystem, Odata, ServiceRoot};
use crate::redfish::{fetch, FetchError, SessionClient};

pub const SERVICE_ROOT: &str = "/redfish/v1";

/// The five resource paths every scrape works from. Resolved once, never re-resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub chassis: String,
    pub system: String,
    pub processors: String,
    pub pcie_devices: String,
    pub thermal: String,
}

/// Result of discovery: the endpoint set plus the system manufacturer used for classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub endpoints: Endpoints,
    pub manufacturer: String,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to fetch {resource}: {source}")]
    Fetch {
        resource: &'static str,
        #[source]
        source: FetchError,
    },

    #[error("{0} collection has no members")]
    EmptyCollection(&'static str),

    #[error("{resource} does not link to {link}")]
    MissingLink {
        resource: &'static str,
        link: &'static str,
    },
}

async fn get<T: serde::de::DeserializeOwned>(
    session: &dyn SessionClient,
    resource: &'static str,
    path: &str,
) -> Result<T, ResolveError> {
    fetch(session, path)
        .await
        .map_err(|source| ResolveError::Fetch { resource, source })
}

fn link(odata: &Odata, resource: &'static str, link: &'static str) -> Result<String, ResolveError> {
    odata
        .path()
        .map(str::to_string)
        .ok_or(ResolveError::MissingLink { resource, link })
}

/// Member selection policy: the first member of a collection is *the* chassis or system.
/// Multi-chassis and multi-system BMCs are not disambiguated.
fn first_member(collection: &Collection, name: &'static str) -> Result<String, ResolveError> {
    collection
        .members
        .links()
        .first()
        .filter(|path| !path.is_empty())
        .map(|path| path.to_string())
        .ok_or(ResolveError::EmptyCollection(name))
}

/// Resolve all five endpoints; any failure aborts resolution with no partial result.
pub async fn resolve(session: &dyn SessionClient) -> Result<Discovery, ResolveError> {
    let root: ServiceRoot = get(session, "service root", SERVICE_ROOT).await?;

    let chassis_collection: Collection =
        get(session, "chassis collection", &link(&root.chassis, "service root", "Chassis")?).await?;
    let chassis_path = first_member(&chassis_collection, "Chassis")?;
    let chassis: Chassis = get(session, "chassis", &chassis_path).await?;

    let system_collection: Collection =
        get(session, "systems collection", &link(&root.systems, "service root", "Systems")?).await?;
    let system_path = first_member(&system_collection, "Systems")?;
    let system: ComputerSystem = get(session, "system", &system_path).await?;

    let endpoints = Endpoints {
        processors: link(&system.processors, "system", "Processors")?,
        pcie_devices: link(&chassis.pcie_devices, "chassis", "PCIeDevices")?,
        thermal: link(&chassis.thermal, "chassis", "Thermal")?,
        chassis: chassis_path,
        system: system_path,
    };

    debug!("Resolved Redfish endpoints: {:?}", endpoints);
    Ok(Discovery {
        endpoints,
        manufacturer: system.manufacturer,
    })
}
