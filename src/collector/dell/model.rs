//! Resource shapes read by the Dell adapter: standard processor and metrics
//! resources plus the iDRAC `Oem/Dell` inventory and sensor collections.

use serde::Deserialize;

use crate::redfish::model::{nullable, Odata, Status};

/// `Processors/<id>` for a GPU
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Processor {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub manufacturer: String,
    #[serde(deserialize_with = "nullable")]
    pub model: String,
    #[serde(deserialize_with = "nullable")]
    pub part_number: String,
    #[serde(deserialize_with = "nullable")]
    pub processor_type: String,
    pub status: Status,
    pub metrics: Odata,
    pub memory_summary: MemorySummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct MemorySummary {
    pub metrics: Odata,
}

/// `Systems/<id>/Oem/Dell/DellVideo`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DellVideo {
    pub members: Vec<DellVideoMember>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DellVideoMember {
    #[serde(rename = "Id", deserialize_with = "nullable")]
    pub id: String,
    #[serde(rename = "GPUGUID", deserialize_with = "nullable")]
    pub gpu_guid: String,
    #[serde(rename = "GPUHealth", deserialize_with = "nullable")]
    pub gpu_health: String,
    #[serde(rename = "GPUState", deserialize_with = "nullable")]
    pub gpu_state: String,
    #[serde(rename = "SerialNumber", deserialize_with = "nullable")]
    pub serial_number: String,
}

/// `Systems/<id>/Oem/Dell/DellGPUSensors`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DellGpuSensors {
    pub members: Vec<DellGpuSensor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DellGpuSensor {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub board_power_supply_status: String,
    pub memory_temperature_celsius: Option<f64>,
    #[serde(deserialize_with = "nullable")]
    pub power_brake_status: String,
    #[serde(rename = "PrimaryGPUTemperatureCelsius")]
    pub primary_gpu_temperature_celsius: Option<f64>,
    #[serde(deserialize_with = "nullable")]
    pub thermal_alert_status: String,
}

/// `Processors/<id>/ProcessorMetrics`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GpuMetrics {
    #[serde(rename = "Id", deserialize_with = "nullable")]
    pub id: String,
    #[serde(rename = "ConsumedPowerWatt")]
    pub consumed_power_watt: Option<f64>,
    #[serde(rename = "OperatingSpeedMHz")]
    pub operating_speed_mhz: Option<f64>,
    #[serde(rename = "BandwidthPercent")]
    pub bandwidth_percent: Option<f64>,
    #[serde(rename = "Oem")]
    pub oem: Option<GpuMetricsOem>,
    #[serde(rename = "PCIeErrors")]
    pub pcie_errors: Option<PcieErrors>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct GpuMetricsOem {
    pub nvidia: Option<NvidiaGpuMetrics>,
    pub dell: Option<DellGpuMetrics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NvidiaGpuMetrics {
    #[serde(rename = "ThrottleReasons", deserialize_with = "nullable")]
    pub throttle_reasons: Vec<String>,
    #[serde(rename = "SMUtilizationPercent")]
    pub sm_utilization_percent: Option<f64>,
    #[serde(rename = "SMActivityPercent")]
    pub sm_activity_percent: Option<f64>,
    #[serde(rename = "SMOccupancyPercent")]
    pub sm_occupancy_percent: Option<f64>,
    #[serde(rename = "TensorCoreActivityPercent")]
    pub tensor_core_activity_percent: Option<f64>,
    #[serde(rename = "HMMAUtilizationPercent")]
    pub hmma_utilization_percent: Option<f64>,
    #[serde(rename = "PCIeRawTxBandwidthGbps")]
    pub pcie_raw_tx_bandwidth_gbps: Option<f64>,
    #[serde(rename = "PCIeRawRxBandwidthGbps")]
    pub pcie_raw_rx_bandwidth_gbps: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DellGpuMetrics {
    #[serde(rename = "CurrentPCIeLinkSpeed")]
    pub current_pcie_link_speed: Option<f64>,
    #[serde(rename = "MaxSupportedPCIeLinkSpeed")]
    pub max_supported_pcie_link_speed: Option<f64>,
    #[serde(rename = "DRAMUtilizationPercent")]
    pub dram_utilization_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PcieErrors {
    pub correctable_error_count: Option<f64>,
}

/// `Processors/<id>/MemorySummary/MemoryMetrics`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct GpuMemoryMetrics {
    pub bandwidth_percent: Option<f64>,
    #[serde(rename = "OperatingSpeedMHz")]
    pub operating_speed_mhz: Option<f64>,
}
