//! Supermicro adapter.
//!
//! GPUs are found among the chassis PCIe devices by path name; identity comes from the
//! standard fields plus the `Oem.Supermicro` block. Temperatures come from the chassis
//! Thermal resource, where aggregate "GPU Temp" / "HBM Temp" readings carry a per-GPU
//! breakdown under `Oem.Supermicro.Details`.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::emit;
use super::normalize::{health_code, state_code};
use super::{CollectError, Endpoints, GpuInfo};
use crate::metrics::{Metric, MetricSink};
use crate::redfish::model::Collection;
use crate::redfish::{fetch, SessionClient};

pub mod model;

use model::{PcieDevice, Thermal};

const GPU_PATH_MARKER: &str = "GPU";
const GPU_AGGREGATE_SENSOR: &str = "GPU Temp";
const HBM_AGGREGATE_SENSOR: &str = "HBM Temp";

fn gpu_detail_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"GPU (\S+) Temp").expect("valid GPU detail pattern"))
}

fn hbm_detail_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"HBM (\S+) Temp").expect("valid HBM detail pattern"))
}

fn gpu_sensor_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(GPU\d+) Temp").expect("valid GPU sensor pattern"))
}

pub async fn collect(
    session: &dyn SessionClient,
    endpoints: &Endpoints,
    sink: &mut dyn MetricSink,
) -> Result<(), CollectError> {
    let devices: Collection = fetch(session, &endpoints.pcie_devices)
        .await
        .map_err(|source| CollectError::Fetch {
            resource: "PCIe device collection",
            source,
        })?;

    for path in devices.members.links() {
        if !path.contains(GPU_PATH_MARKER) {
            continue;
        }

        let device: PcieDevice = match fetch(session, path).await {
            Ok(device) => device,
            Err(e) => {
                debug!("Skipping PCIe device {}: {}", path, e);
                continue;
            }
        };

        emit_device(sink, &device);
    }

    match fetch::<Thermal>(session, &endpoints.thermal).await {
        Ok(thermal) => emit_temperatures(sink, &thermal),
        Err(e) => debug!("Supermicro thermal resource unavailable: {}", e),
    }

    Ok(())
}

/// Identity, health and state for one GPU device. A device without the OEM block still
/// reports, with the vendor-specific identity fields left empty.
fn emit_device(sink: &mut dyn MetricSink, device: &PcieDevice) {
    let mut info = GpuInfo {
        id: device.id.clone(),
        model: device.model.clone(),
        part_number: device.part_number.clone(),
        serial_number: device.serial_number.clone(),
        ..GpuInfo::default()
    };

    if let Some(smc) = device.oem.as_ref().and_then(|oem| oem.supermicro.as_ref()) {
        info.manufacturer = smc.gpu_vendor.clone();
        info.guid = smc.guid().to_string();
        info.slot = smc.gpu_slot.and_then(|slot| u32::try_from(slot).ok());
    }

    let status = &device.status;
    emit::gpu_info(sink, &info);
    emit::status(sink, Metric::Health, &device.id, &status.health, health_code(&status.health));
    emit::status(sink, Metric::State, &device.id, &status.state, state_code(&status.state));
}

/// Parse a detail value that firmware reports either as a string or a number.
fn detail_reading(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        other => other.as_f64(),
    }
}

/// Emit one record per detail entry matching `pattern`, keyed `GPU<index>`.
fn emit_details(
    sink: &mut dyn MetricSink,
    metric: Metric,
    pattern: &Regex,
    details: &serde_json::Map<String, serde_json::Value>,
) {
    for (name, value) in details {
        let Some(index) = pattern.captures(name).and_then(|c| c.get(1)) else {
            continue;
        };
        match detail_reading(value) {
            Some(reading) => emit::gauge(sink, metric, &format!("GPU{}", index.as_str()), reading),
            None => debug!("Ignoring unparsable thermal detail {} = {}", name, value),
        }
    }
}

fn emit_temperatures(sink: &mut dyn MetricSink, thermal: &Thermal) {
    for temperature in &thermal.temperatures {
        match (temperature.name.as_str(), temperature.supermicro_details()) {
            (GPU_AGGREGATE_SENSOR, Some(details)) => {
                emit_details(sink, Metric::Temperature, gpu_detail_pattern(), details)
            }
            (HBM_AGGREGATE_SENSOR, Some(details)) => {
                emit_details(sink, Metric::MemoryTemperature, hbm_detail_pattern(), details)
            }
            (name, _) => {
                if let Some(id) = gpu_sensor_pattern().captures(name).and_then(|c| c.get(1)) {
                    emit::optional_gauge(sink, Metric::Temperature, id.as_str(), temperature.reading_celsius);
                }
            }
        }
    }
}
