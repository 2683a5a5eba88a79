//! Serde structs for the standard Redfish resources walked during discovery.
//! Every struct tolerates missing fields; vendor-specific shapes live with their adapters.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer};

/// Decode `null` as the type's default. BMC firmware reports absent readings as `null`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A hypermedia reference (`{"@odata.id": "/redfish/v1/..."}`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Odata {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
}

impl Odata {
    /// The linked path, or `None` when the reference is absent or empty
    pub fn path(&self) -> Option<&str> {
        let path = self.odata_id.trim();
        (!path.is_empty()).then_some(path)
    }
}

/// Ordered list of references as found in a collection's `Members`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Links(pub Vec<Odata>);

impl Links {
    /// Paths in document order with exact duplicates removed (first occurrence wins).
    pub fn links(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .map(|member| member.odata_id.as_str())
            .filter(|path| seen.insert(*path))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Status {
    #[serde(rename = "Health", deserialize_with = "nullable")]
    pub health: String,
    #[serde(rename = "State", deserialize_with = "nullable")]
    pub state: String,
}

/// `/redfish/v1`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ServiceRoot {
    pub chassis: Odata,
    pub systems: Odata,
}

/// Any Redfish resource collection
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Collection {
    pub name: String,
    pub members: Links,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Chassis {
    #[serde(rename = "Id", deserialize_with = "nullable")]
    pub id: String,
    #[serde(rename = "PCIeDevices")]
    pub pcie_devices: Odata,
    #[serde(rename = "Thermal")]
    pub thermal: Odata,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ComputerSystem {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub manufacturer: String,
    #[serde(deserialize_with = "nullable")]
    pub model: String,
    pub processors: Odata,
}
