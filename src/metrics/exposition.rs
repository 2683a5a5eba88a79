//! Prometheus text exposition of one scrape's metric records.
//! Each scrape gets a fresh registry so stale GPUs never linger between scrapes.

use std::collections::HashMap;

use prometheus::{CounterVec, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use tracing::warn;

use super::{Metric, MetricKind, MetricRecord, MetricSink, NAMESPACE};

enum Family {
    Gauge(GaugeVec),
    Counter(CounterVec),
}

pub struct PrometheusSink {
    registry: Registry,
    families: HashMap<Metric, Family>,
}

impl PrometheusSink {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            families: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register the family for `metric` on first use.
    fn family(&mut self, metric: Metric) -> prometheus::Result<&Family> {
        if !self.families.contains_key(&metric) {
            let desc = metric.descriptor();
            let opts = Opts::new(desc.name, desc.help);
            let family = match desc.kind {
                MetricKind::Gauge => {
                    let vec = GaugeVec::new(opts, desc.labels)?;
                    self.registry.register(Box::new(vec.clone()))?;
                    Family::Gauge(vec)
                }
                MetricKind::Counter => {
                    let vec = CounterVec::new(opts, desc.labels)?;
                    self.registry.register(Box::new(vec.clone()))?;
                    Family::Counter(vec)
                }
            };
            self.families.insert(metric, family);
        }

        self.families
            .get(&metric)
            .ok_or_else(|| prometheus::Error::Msg(format!("{:?} not registered", metric)))
    }

    fn record(&mut self, record: &MetricRecord) -> prometheus::Result<()> {
        let labels: Vec<&str> = record.labels.iter().map(String::as_str).collect();

        match self.family(record.metric)? {
            Family::Gauge(vec) => vec.get_metric_with_label_values(&labels)?.set(record.value),
            Family::Counter(vec) => {
                // Counters start at zero per registry; a repeated label set keeps the larger reading
                let counter = vec.get_metric_with_label_values(&labels)?;
                let delta = record.value - counter.get();
                if delta > 0.0 {
                    counter.inc_by(delta);
                }
            }
        }
        Ok(())
    }

    /// Add the per-scrape `up` and duration gauges.
    pub fn record_scrape(&self, up: bool, duration_secs: f64) -> prometheus::Result<()> {
        let up_gauge = Gauge::with_opts(Opts::new(
            format!("{}_up", NAMESPACE),
            "Whether the last scrape of the BMC succeeded",
        ))?;
        up_gauge.set(if up { 1.0 } else { 0.0 });
        self.registry.register(Box::new(up_gauge))?;

        let duration = Gauge::with_opts(Opts::new(
            format!("{}_scrape_duration_seconds", NAMESPACE),
            "Time spent collecting GPU metrics from the BMC",
        ))?;
        duration.set(duration_secs);
        self.registry.register(Box::new(duration))?;
        Ok(())
    }

    /// Render everything gathered so far in the text exposition format.
    pub fn encode(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("metrics are not UTF-8: {}", e)))
    }
}

impl Default for PrometheusSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSink for PrometheusSink {
    fn emit(&mut self, record: MetricRecord) {
        if let Err(e) = self.record(&record) {
            warn!("Dropping {} sample: {}", record.metric.descriptor().name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn renders_gauges_with_labels() {
        let mut sink = PrometheusSink::new();
        sink.emit(MetricRecord::new(Metric::Temperature, 45.5, labels(&["GPU2"])));
        sink.emit(MetricRecord::new(Metric::Health, 2.0, labels(&["GPU2", "OK"])));

        let text = sink.encode().unwrap();
        assert!(text.contains("# TYPE oob_gpu_temperature_celsius gauge"));
        assert!(text.contains(r#"oob_gpu_temperature_celsius{id="GPU2"} 45.5"#));
        let health = text
            .lines()
            .find(|l| l.starts_with("oob_gpu_health{"))
            .unwrap();
        assert!(health.contains(r#"health="OK""#));
        assert!(health.ends_with(" 2"));
    }

    #[test]
    fn renders_counters() {
        let mut sink = PrometheusSink::new();
        sink.emit(MetricRecord::new(Metric::PcieCorrectableErrors, 7.0, labels(&["GPU1"])));

        let text = sink.encode().unwrap();
        assert!(text.contains("# TYPE oob_gpu_pcie_correctable_error_count counter"));
        assert!(text.contains(r#"oob_gpu_pcie_correctable_error_count{id="GPU1"} 7"#));
    }

    #[test]
    fn drops_records_with_wrong_label_count() {
        let mut sink = PrometheusSink::new();
        sink.emit(MetricRecord::new(Metric::Health, 2.0, labels(&["GPU1"])));

        assert!(!sink.encode().unwrap().contains(r#"id="GPU1""#));
    }

    #[test]
    fn scrape_gauges_report_status() {
        let sink = PrometheusSink::new();
        sink.record_scrape(false, 0.25).unwrap();

        let text = sink.encode().unwrap();
        assert!(text.contains("oob_gpu_up 0"));
        assert!(text.contains("oob_gpu_scrape_duration_seconds 0.25"));
    }
}
