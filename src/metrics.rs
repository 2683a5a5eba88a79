//! Canonical GPU metric vocabulary, metric records, and the sinks that receive them.

use tokio::sync::mpsc::UnboundedSender;

pub mod exposition;

pub use exposition::PrometheusSink;

pub const NAMESPACE: &str = "oob_gpu";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

/// Fixed description of one semantic quantity
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
    pub kind: MetricKind,
}

const NO_LABELS: &[&str] = &[];
const ID: &[&str] = &["id"];
const HEALTH_LABELS: &[&str] = &["id", "health"];
const STATE_LABELS: &[&str] = &["id", "state"];
const STATUS_LABELS: &[&str] = &["id", "status"];
const REASON_LABELS: &[&str] = &["id", "reason"];
const INFO_LABELS: &[&str] = &["id", "manufacturer", "model", "part_number", "serial_number", "uuid", "slot"];

/// Every quantity the collectors can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    GpuCount,
    Info,
    Health,
    State,
    BoardPowerSupplyStatus,
    PowerBrakeStatus,
    ThermalAlertStatus,
    MemoryTemperature,
    Temperature,
    OperatingSpeed,
    BandwidthPercent,
    ConsumedPower,
    ThrottleReason,
    SmUtilization,
    SmActivity,
    SmOccupancy,
    TensorCoreActivity,
    HmmaUtilization,
    PcieRawTxBandwidth,
    PcieRawRxBandwidth,
    CurrentPcieLinkSpeed,
    MaxPcieLinkSpeed,
    DramUtilization,
    PcieCorrectableErrors,
    MemoryBandwidthPercent,
    MemoryOperatingSpeed,
}

impl Metric {
    pub fn descriptor(self) -> Descriptor {
        use MetricKind::{Counter, Gauge};

        let (name, help, labels, kind) = match self {
            Metric::GpuCount => ("oob_gpu_count", "Number of GPUs reported by the BMC inventory", NO_LABELS, Gauge),
            Metric::Info => ("oob_gpu_info", "GPU identity", INFO_LABELS, Gauge),
            Metric::Health => (
                "oob_gpu_health",
                "GPU health (0=critical, 1=warning, 2=ok, 3=unknown)",
                HEALTH_LABELS,
                Gauge,
            ),
            Metric::State => (
                "oob_gpu_state",
                "GPU state (0=enabled, 1=not applicable, 2=disabled)",
                STATE_LABELS,
                Gauge,
            ),
            Metric::BoardPowerSupplyStatus => (
                "oob_gpu_board_power_supply_status",
                "GPU board power supply (0=not applicable, 1=sufficient, 2=under powered)",
                STATUS_LABELS,
                Gauge,
            ),
            Metric::PowerBrakeStatus => (
                "oob_gpu_power_brake_status",
                "GPU power brake (0=not applicable, 1=released, 2=set)",
                STATUS_LABELS,
                Gauge,
            ),
            Metric::ThermalAlertStatus => (
                "oob_gpu_thermal_alert_status",
                "GPU thermal alert (0=not applicable, 1=not pending, 2=pending)",
                STATUS_LABELS,
                Gauge,
            ),
            Metric::MemoryTemperature => ("oob_gpu_memory_temperature_celsius", "GPU memory temperature", ID, Gauge),
            Metric::Temperature => ("oob_gpu_temperature_celsius", "Primary GPU temperature", ID, Gauge),
            Metric::OperatingSpeed => ("oob_gpu_operating_speed_mhz", "GPU operating speed", ID, Gauge),
            Metric::BandwidthPercent => ("oob_gpu_bandwidth_percent", "GPU bandwidth utilization", ID, Gauge),
            Metric::ConsumedPower => ("oob_gpu_consumed_power_watt", "GPU power consumption", ID, Gauge),
            Metric::ThrottleReason => (
                "oob_gpu_throttle_reason",
                "Active GPU clock throttle reasons",
                REASON_LABELS,
                Gauge,
            ),
            Metric::SmUtilization => ("oob_gpu_sm_utilization_percent", "Streaming multiprocessor utilization", ID, Gauge),
            Metric::SmActivity => ("oob_gpu_sm_activity_percent", "Streaming multiprocessor activity", ID, Gauge),
            Metric::SmOccupancy => ("oob_gpu_sm_occupancy_percent", "Streaming multiprocessor occupancy", ID, Gauge),
            Metric::TensorCoreActivity => ("oob_gpu_tensor_core_activity_percent", "Tensor core activity", ID, Gauge),
            Metric::HmmaUtilization => (
                "oob_gpu_hmma_utilization_percent",
                "Half-precision matrix multiply utilization",
                ID,
                Gauge,
            ),
            Metric::PcieRawTxBandwidth => ("oob_gpu_pcie_raw_tx_bandwidth_gbps", "PCIe raw transmit bandwidth", ID, Gauge),
            Metric::PcieRawRxBandwidth => ("oob_gpu_pcie_raw_rx_bandwidth_gbps", "PCIe raw receive bandwidth", ID, Gauge),
            Metric::CurrentPcieLinkSpeed => ("oob_gpu_current_pcie_link_speed", "Current PCIe link speed", ID, Gauge),
            Metric::MaxPcieLinkSpeed => (
                "oob_gpu_max_supported_pcie_link_speed",
                "Maximum supported PCIe link speed",
                ID,
                Gauge,
            ),
            Metric::DramUtilization => ("oob_gpu_dram_utilization_percent", "GPU DRAM utilization", ID, Gauge),
            Metric::PcieCorrectableErrors => (
                "oob_gpu_pcie_correctable_error_count",
                "PCIe correctable errors",
                ID,
                Counter,
            ),
            Metric::MemoryBandwidthPercent => ("oob_gpu_memory_bandwidth_percent", "GPU memory bandwidth utilization", ID, Gauge),
            Metric::MemoryOperatingSpeed => ("oob_gpu_memory_operating_speed_mhz", "GPU memory operating speed", ID, Gauge),
        };

        Descriptor { name, help, labels, kind }
    }
}

/// One sample handed to a sink: descriptor, value, and label values in descriptor order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub metric: Metric,
    pub value: f64,
    pub labels: Vec<String>,
}

impl MetricRecord {
    pub fn new(metric: Metric, value: f64, labels: Vec<String>) -> Self {
        Self { metric, value, labels }
    }

    /// Value of a label by name
    pub fn label(&self, name: &str) -> Option<&str> {
        self.metric
            .descriptor()
            .labels
            .iter()
            .position(|l| *l == name)
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
    }
}

/// Write-only destination for metric records. Emission never fails from the collector's side.
pub trait MetricSink: Send {
    fn emit(&mut self, record: MetricRecord);
}

impl MetricSink for Vec<MetricRecord> {
    fn emit(&mut self, record: MetricRecord) {
        self.push(record);
    }
}

impl MetricSink for UnboundedSender<MetricRecord> {
    fn emit(&mut self, record: MetricRecord) {
        // Receiver gone means nobody is scraping anymore
        let _ = self.send(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_labels_resolve_by_name() {
        let record = MetricRecord::new(
            Metric::Health,
            2.0,
            vec!["GPU1".to_string(), "OK".to_string()],
        );
        assert_eq!(record.label("id"), Some("GPU1"));
        assert_eq!(record.label("health"), Some("OK"));
        assert_eq!(record.label("state"), None);
    }

    #[test]
    fn names_share_the_namespace() {
        for metric in [Metric::GpuCount, Metric::Info, Metric::PcieCorrectableErrors, Metric::MemoryOperatingSpeed] {
            assert!(metric.descriptor().name.starts_with(NAMESPACE));
        }
    }

    #[test]
    fn correctable_errors_are_a_counter() {
        assert_eq!(Metric::PcieCorrectableErrors.descriptor().kind, MetricKind::Counter);
        assert_eq!(Metric::Temperature.descriptor().kind, MetricKind::Gauge);
    }

    #[tokio::test]
    async fn channel_sink_forwards_records() {
        let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.emit(MetricRecord::new(Metric::GpuCount, 4.0, Vec::new()));

        let record = rx.recv().await.unwrap();
        assert_eq!(record.metric, Metric::GpuCount);
        assert_eq!(record.value, 4.0);
    }
}
