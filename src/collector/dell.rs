//! Dell iDRAC adapter.
//!
//! Standard `Processors` members carry GPU identity and per-GPU metrics links; iDRAC's
//! `Oem/Dell/DellVideo` inventory adds GUID, serial, health and state, and
//! `Oem/Dell/DellGPUSensors` adds board-level sensor readings. Both OEM resources are
//! optional enrichment.

use tracing::{debug, warn};

use super::emit;
use super::normalize::{
    board_power_supply_code, health_code, power_brake_code, state_code, thermal_alert_code,
};
use super::{CollectError, Endpoints, GpuInfo};
use crate::metrics::{Metric, MetricSink};
use crate::redfish::model::Collection;
use crate::redfish::{fetch, SessionClient};

pub mod model;

use model::{DellGpuSensor, DellGpuSensors, DellVideo, GpuMemoryMetrics, GpuMetrics, Processor};

const VIDEO_INVENTORY_PATH: &str = "Oem/Dell/DellVideo";
const GPU_SENSORS_PATH: &str = "Oem/Dell/DellGPUSensors";

const PROCESSOR_TYPE_GPU: &str = "GPU";
const STATE_ENABLED: &str = "Enabled";

fn oem_path(system: &str, suffix: &str) -> String {
    format!("{}/{}", system.trim_end_matches('/'), suffix)
}

pub async fn collect(
    session: &dyn SessionClient,
    endpoints: &Endpoints,
    sink: &mut dyn MetricSink,
) -> Result<(), CollectError> {
    let processors: Collection = fetch(session, &endpoints.processors)
        .await
        .map_err(|source| CollectError::Fetch {
            resource: "processor collection",
            source,
        })?;

    let inventory: DellVideo = match fetch(session, &oem_path(&endpoints.system, VIDEO_INVENTORY_PATH)).await {
        Ok(inventory) => inventory,
        Err(e) => {
            debug!("Dell video inventory unavailable: {}", e);
            DellVideo::default()
        }
    };
    emit::gpu_count(sink, inventory.members.len());

    match fetch::<DellGpuSensors>(session, &oem_path(&endpoints.system, GPU_SENSORS_PATH)).await {
        Ok(sensors) => {
            for sensor in &sensors.members {
                emit_sensor(sink, sensor);
            }
        }
        Err(e) => debug!("Dell GPU sensors unavailable: {}", e),
    }

    for path in processors.members.links() {
        let processor: Processor = match fetch(session, path).await {
            Ok(processor) => processor,
            Err(e) => {
                debug!("Skipping processor {}: {}", path, e);
                continue;
            }
        };

        if processor.processor_type != PROCESSOR_TYPE_GPU || processor.status.state != STATE_ENABLED {
            continue;
        }

        // Sub-resources are fetched before anything is emitted for this GPU, so a failure
        // leaves no partial records. It also ends the GPU loop; earlier GPUs stand.
        let metrics = match processor.metrics.path() {
            Some(metrics_path) => match fetch::<GpuMetrics>(session, metrics_path).await {
                Ok(metrics) => Some(metrics),
                Err(e) => {
                    warn!("Stopping Dell GPU collection at {}: {}", metrics_path, e);
                    break;
                }
            },
            None => None,
        };
        let memory = match processor.memory_summary.metrics.path() {
            Some(memory_path) => match fetch::<GpuMemoryMetrics>(session, memory_path).await {
                Ok(memory) => Some(memory),
                Err(e) => {
                    warn!("Stopping Dell GPU collection at {}: {}", memory_path, e);
                    break;
                }
            },
            None => None,
        };

        let mut info = GpuInfo {
            id: processor.id.clone(),
            manufacturer: processor.manufacturer.clone(),
            model: processor.model.clone(),
            part_number: processor.part_number.clone(),
            ..GpuInfo::default()
        };

        // First inventory member with the same id wins
        if let Some(member) = inventory.members.iter().find(|m| m.id == processor.id) {
            info.guid = member.gpu_guid.clone();
            info.serial_number = member.serial_number.clone();
            emit::status(sink, Metric::State, &member.id, &member.gpu_state, state_code(&member.gpu_state));
            emit::status(sink, Metric::Health, &member.id, &member.gpu_health, health_code(&member.gpu_health));
        }

        emit::gpu_info(sink, &info);

        if let Some(metrics) = &metrics {
            emit_metrics(sink, &processor.id, metrics);
        }
        if let Some(memory) = &memory {
            emit::optional_gauge(sink, Metric::MemoryBandwidthPercent, &processor.id, memory.bandwidth_percent);
            emit::optional_gauge(sink, Metric::MemoryOperatingSpeed, &processor.id, memory.operating_speed_mhz);
        }
    }

    Ok(())
}

fn emit_sensor(sink: &mut dyn MetricSink, sensor: &DellGpuSensor) {
    let id = sensor.id.as_str();
    emit::status(
        sink,
        Metric::BoardPowerSupplyStatus,
        id,
        &sensor.board_power_supply_status,
        board_power_supply_code(&sensor.board_power_supply_status),
    );
    emit::optional_gauge(sink, Metric::MemoryTemperature, id, sensor.memory_temperature_celsius);
    emit::status(
        sink,
        Metric::PowerBrakeStatus,
        id,
        &sensor.power_brake_status,
        power_brake_code(&sensor.power_brake_status),
    );
    emit::optional_gauge(sink, Metric::Temperature, id, sensor.primary_gpu_temperature_celsius);
    emit::status(
        sink,
        Metric::ThermalAlertStatus,
        id,
        &sensor.thermal_alert_status,
        thermal_alert_code(&sensor.thermal_alert_status),
    );
}

/// Samples from one GPU's metrics resource, labeled with the processor id.
fn emit_metrics(sink: &mut dyn MetricSink, id: &str, metrics: &GpuMetrics) {
    emit::optional_gauge(sink, Metric::BandwidthPercent, id, metrics.bandwidth_percent);
    emit::optional_gauge(sink, Metric::ConsumedPower, id, metrics.consumed_power_watt);
    emit::optional_gauge(sink, Metric::OperatingSpeed, id, metrics.operating_speed_mhz);

    if let Some(oem) = &metrics.oem {
        if let Some(nvidia) = &oem.nvidia {
            emit::throttle_reasons(sink, id, &nvidia.throttle_reasons);
            emit::optional_gauge(sink, Metric::SmUtilization, id, nvidia.sm_utilization_percent);
            emit::optional_gauge(sink, Metric::SmActivity, id, nvidia.sm_activity_percent);
            emit::optional_gauge(sink, Metric::SmOccupancy, id, nvidia.sm_occupancy_percent);
            emit::optional_gauge(sink, Metric::TensorCoreActivity, id, nvidia.tensor_core_activity_percent);
            emit::optional_gauge(sink, Metric::HmmaUtilization, id, nvidia.hmma_utilization_percent);
            emit::optional_gauge(sink, Metric::PcieRawTxBandwidth, id, nvidia.pcie_raw_tx_bandwidth_gbps);
            emit::optional_gauge(sink, Metric::PcieRawRxBandwidth, id, nvidia.pcie_raw_rx_bandwidth_gbps);
        }
        if let Some(dell) = &oem.dell {
            emit::optional_gauge(sink, Metric::CurrentPcieLinkSpeed, id, dell.current_pcie_link_speed);
            emit::optional_gauge(sink, Metric::MaxPcieLinkSpeed, id, dell.max_supported_pcie_link_speed);
            emit::optional_gauge(sink, Metric::DramUtilization, id, dell.dram_utilization_percent);
        }
    }

    if let Some(errors) = &metrics.pcie_errors {
        emit::optional_gauge(sink, Metric::PcieCorrectableErrors, id, errors.correctable_error_count);
    }
}
