//! Out-of-band GPU telemetry over Redfish.
//!
//! A [`collector::Client`] discovers a BMC's resources, picks a vendor adapter and turns
//! the vendor's GPU resources into [`metrics::MetricRecord`]s; [`exporter`] serves those
//! as Prometheus scrapes.

pub mod collector;
pub mod config;
pub mod exporter;
pub mod metrics;
pub mod redfish;
