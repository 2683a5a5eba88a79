//! End-to-end scrapes against captured BMC fixtures.

use std::sync::Arc;

use oob_gpu_exporter::collector::{Client, Vendor};
use oob_gpu_exporter::exporter::{self, Exporter};
use oob_gpu_exporter::metrics::{Metric, MetricRecord, PrometheusSink};
use oob_gpu_exporter::redfish::{MockBmc, SessionClient};

const DELL: &str = include_str!("fixtures/dell.json");
const SUPERMICRO: &str = include_str!("fixtures/supermicro.json");

fn fixture(json: &str) -> Arc<MockBmc> {
    Arc::new(MockBmc::from_fixture(json).expect("fixture parses"))
}

async fn records(bmc: Arc<MockBmc>) -> (Vendor, Vec<MetricRecord>) {
    let client = Client::connect(Box::new(bmc)).await.expect("discovery succeeds");
    let mut sink = Vec::new();
    client.refresh_gpus(&mut sink).await.expect("scrape succeeds");
    (client.vendor(), sink)
}

fn value(records: &[MetricRecord], metric: Metric, id: &str) -> Option<f64> {
    records
        .iter()
        .find(|r| r.metric == metric && r.label("id") == Some(id))
        .map(|r| r.value)
}

fn exporter_for(bmc: Arc<MockBmc>) -> Exporter {
    Exporter::with_sessions(Box::new(move |_target: &str| {
        Ok(Box::new(bmc.clone()) as Box<dyn SessionClient>)
    }))
}

#[tokio::test]
async fn dell_fixture_reports_enabled_gpus() {
    let (vendor, records) = records(fixture(DELL)).await;
    let gpu = "Video.Slot.31-1";

    assert_eq!(vendor, Vendor::Dell);

    let count = records.iter().find(|r| r.metric == Metric::GpuCount).unwrap();
    assert_eq!(count.value, 2.0);

    let info: Vec<_> = records.iter().filter(|r| r.metric == Metric::Info).collect();
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].label("id"), Some(gpu));
    assert_eq!(info[0].label("manufacturer"), Some("NVIDIA"));
    assert_eq!(info[0].label("serial_number"), Some("1654922006512"));
    assert_eq!(info[0].label("uuid"), Some("GPU-8c0f4a1e-9b2d-4c3a-8f10-2a6b7c9d0e11"));

    assert_eq!(value(&records, Metric::Health, gpu), Some(2.0));
    assert_eq!(value(&records, Metric::State, gpu), Some(0.0));
    assert_eq!(value(&records, Metric::Temperature, gpu), Some(44.0));
    assert_eq!(value(&records, Metric::MemoryTemperature, gpu), Some(48.0));
    assert_eq!(value(&records, Metric::BoardPowerSupplyStatus, gpu), Some(1.0));
    assert_eq!(value(&records, Metric::PowerBrakeStatus, gpu), Some(1.0));
    assert_eq!(value(&records, Metric::ThermalAlertStatus, gpu), Some(1.0));
    assert_eq!(value(&records, Metric::ConsumedPower, gpu), Some(312.0));
    assert_eq!(value(&records, Metric::SmActivity, gpu), Some(80.5));
    assert_eq!(value(&records, Metric::DramUtilization, gpu), Some(64.0));
    assert_eq!(value(&records, Metric::PcieCorrectableErrors, gpu), Some(3.0));
    assert_eq!(value(&records, Metric::MemoryOperatingSpeed, gpu), Some(2619.0));

    let throttle = records.iter().find(|r| r.metric == Metric::ThrottleReason).unwrap();
    assert_eq!(throttle.label("reason"), Some("SwPowerCap"));

    assert_eq!(value(&records, Metric::Info, "Video.Slot.32-1"), None);
    assert_eq!(value(&records, Metric::Info, "CPU.Socket.1"), None);
}

#[tokio::test]
async fn supermicro_fixture_reports_devices_and_thermal_details() {
    let (vendor, records) = records(fixture(SUPERMICRO)).await;

    assert_eq!(vendor, Vendor::Supermicro);

    let info: Vec<_> = records.iter().filter(|r| r.metric == Metric::Info).collect();
    assert_eq!(info.len(), 2);
    assert_eq!(info[0].label("slot"), Some("1"));
    assert_eq!(info[1].label("uuid"), Some("GPU-legacy-guid-2"));

    assert_eq!(value(&records, Metric::Health, "GPU2"), Some(1.0));
    assert_eq!(value(&records, Metric::Temperature, "GPU1"), Some(45.5));
    assert_eq!(value(&records, Metric::Temperature, "GPU2"), Some(47.0));
    assert_eq!(value(&records, Metric::Temperature, "GPU3"), None);
    assert_eq!(value(&records, Metric::MemoryTemperature, "GPU1"), Some(57.0));
    assert_eq!(value(&records, Metric::MemoryTemperature, "GPU2"), Some(58.5));
    assert_eq!(value(&records, Metric::Info, "NIC1"), None);
}

#[tokio::test]
async fn dell_exposition_renders_every_family_once() {
    let client = Client::connect(Box::new(fixture(DELL))).await.unwrap();
    let mut sink = PrometheusSink::new();
    client.refresh_gpus(&mut sink).await.unwrap();
    sink.record_scrape(true, 0.25).unwrap();

    let text = sink.encode().unwrap();

    assert_eq!(text.matches("# TYPE oob_gpu_temperature_celsius gauge").count(), 1);
    assert!(text.contains("# TYPE oob_gpu_pcie_correctable_error_count counter"));
    assert!(text.contains("oob_gpu_count 2"));
    assert!(text.contains("oob_gpu_consumed_power_watt{id=\"Video.Slot.31-1\"} 312"));
    assert!(text.contains("oob_gpu_up 1"));
    assert!(text.contains("oob_gpu_scrape_duration_seconds 0.25"));
}

#[tokio::test]
async fn check_against_fixture_opens_and_closes_one_session() {
    let bmc = fixture(SUPERMICRO);
    let exporter = exporter_for(bmc.clone());

    let output = exporter::check(&exporter, "bmc-42.example:443").await.unwrap();

    assert!(output.up);
    assert!(output.body.contains("oob_gpu_temperature_celsius{id=\"GPU1\"} 45.5"));
    assert_eq!(bmc.sessions_created(), 1);
    assert_eq!(bmc.sessions_deleted(), 1);
}

#[tokio::test]
async fn removed_processor_collection_marks_dell_target_down() {
    let bmc = Arc::new(
        MockBmc::from_fixture(DELL)
            .unwrap()
            .without_resource("/redfish/v1/Systems/System.Embedded.1/Processors"),
    );
    let exporter = exporter_for(bmc.clone());

    let output = exporter.scrape("idrac-1").await.unwrap();

    assert!(!output.up);
    assert!(output.body.contains("oob_gpu_up 0"));
    assert_eq!(bmc.sessions_deleted(), 1);
}
