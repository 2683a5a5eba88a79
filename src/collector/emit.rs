//! Builders that turn normalized values into metric records.

use crate::metrics::{Metric, MetricRecord, MetricSink};

use super::GpuInfo;

pub fn gpu_count(sink: &mut dyn MetricSink, count: usize) {
    sink.emit(MetricRecord::new(Metric::GpuCount, count as f64, Vec::new()));
}

pub fn gpu_info(sink: &mut dyn MetricSink, info: &GpuInfo) {
    let labels = vec![
        info.id.clone(),
        info.manufacturer.trim().to_string(),
        info.model.trim().to_string(),
        info.part_number.trim().to_string(),
        info.serial_number.trim().to_string(),
        info.guid.trim().to_string(),
        info.slot.map(|s| s.to_string()).unwrap_or_default(),
    ];
    sink.emit(MetricRecord::new(Metric::Info, 1.0, labels));
}

/// Emit a coded status next to its vendor string. Unrecognized strings emit nothing.
pub fn status(sink: &mut dyn MetricSink, metric: Metric, id: &str, raw: &str, code: Option<u8>) {
    if let Some(code) = code {
        sink.emit(MetricRecord::new(
            metric,
            f64::from(code),
            vec![id.to_string(), raw.to_string()],
        ));
    }
}

pub fn gauge(sink: &mut dyn MetricSink, metric: Metric, id: &str, value: f64) {
    sink.emit(MetricRecord::new(metric, value, vec![id.to_string()]));
}

pub fn optional_gauge(sink: &mut dyn MetricSink, metric: Metric, id: &str, value: Option<f64>) {
    if let Some(value) = value {
        gauge(sink, metric, id, value);
    }
}

/// One 1.0 sample per active throttle reason.
pub fn throttle_reasons(sink: &mut dyn MetricSink, id: &str, reasons: &[String]) {
    for reason in reasons {
        sink.emit(MetricRecord::new(
            Metric::ThrottleReason,
            1.0,
            vec![id.to_string(), reason.clone()],
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_trims_fields_and_renders_slot() {
        let mut sink = Vec::new();
        gpu_info(
            &mut sink,
            &GpuInfo {
                id: "GPU1".to_string(),
                manufacturer: " NVIDIA ".to_string(),
                model: "H100 ".to_string(),
                slot: Some(3),
                ..GpuInfo::default()
            },
        );

        let record = &sink[0];
        assert_eq!(record.metric, Metric::Info);
        assert_eq!(record.value, 1.0);
        assert_eq!(record.label("manufacturer"), Some("NVIDIA"));
        assert_eq!(record.label("model"), Some("H100"));
        assert_eq!(record.label("uuid"), Some(""));
        assert_eq!(record.label("slot"), Some("3"));
    }

    #[test]
    fn unrecognized_status_is_suppressed() {
        let mut sink = Vec::new();
        status(&mut sink, Metric::Health, "GPU1", "Bogus", None);
        assert!(sink.is_empty());

        status(&mut sink, Metric::Health, "GPU1", "OK", Some(2));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].label("health"), Some("OK"));
    }

    #[test]
    fn each_throttle_reason_is_a_sample() {
        let mut sink = Vec::new();
        throttle_reasons(&mut sink, "GPU1", &["HwSlowdown".to_string(), "SwPowerCap".to_string()]);

        assert_eq!(sink.len(), 2);
        assert!(sink.iter().all(|r| r.value == 1.0));
        assert_eq!(sink[1].label("reason"), Some("SwPowerCap"));
    }
}
