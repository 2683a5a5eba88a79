//! Resource shapes read by the Supermicro adapter: PCIe devices with the
//! `Oem.Supermicro` GPU block and the chassis Thermal resource.

use serde::Deserialize;

use crate::redfish::model::{nullable, Status};

/// `Chassis/<id>/PCIeDevices/<GPU...>`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PcieDevice {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub model: String,
    #[serde(deserialize_with = "nullable")]
    pub part_number: String,
    #[serde(deserialize_with = "nullable")]
    pub serial_number: String,
    pub status: Status,
    pub oem: Option<PcieDeviceOem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PcieDeviceOem {
    pub supermicro: Option<SupermicroGpu>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SupermicroGpu {
    #[serde(rename = "GPUVendor", deserialize_with = "nullable")]
    pub gpu_vendor: String,
    /// Newer firmware spelling; preferred when non-empty
    #[serde(rename = "GPUGUID", deserialize_with = "nullable")]
    pub gpu_guid: String,
    #[serde(rename = "GPUGuid", deserialize_with = "nullable")]
    pub gpu_guid_legacy: String,
    /// Some firmware reports -1 for an unpopulated slot
    #[serde(rename = "GPUSlot")]
    pub gpu_slot: Option<i64>,
}

impl SupermicroGpu {
    pub fn guid(&self) -> &str {
        if self.gpu_guid.is_empty() {
            &self.gpu_guid_legacy
        } else {
            &self.gpu_guid
        }
    }
}

/// `Chassis/<id>/Thermal`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Thermal {
    pub temperatures: Vec<Temperature>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Temperature {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    pub reading_celsius: Option<f64>,
    pub oem: Option<TemperatureOem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TemperatureOem {
    pub supermicro: Option<SupermicroTemperature>,
}

/// Per-GPU breakdown of an aggregate reading, e.g. `{"GPU 1 Temp": "45.5"}`, in document order
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SupermicroTemperature {
    pub details: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Temperature {
    pub fn supermicro_details(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.oem
            .as_ref()
            .and_then(|oem| oem.supermicro.as_ref())
            .and_then(|smc| smc.details.as_ref())
    }
}
