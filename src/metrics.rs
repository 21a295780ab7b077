//! Prometheus Metrics Definitions
//!
//! One [`NetscalerMetrics`] is built per scrape, around its own [`Registry`].
//! Nothing here is global: two scrapes running at the same time, of the same
//! or different appliances, each render only their own observations.
//!
//! # Metric Categories
//!
//! ## Appliance Metrics
//! - One family per exported Nitro attribute, declared by the resource
//!   schemas in [`crate::collectors`]
//! - Device-reported totals are counters; everything else is a gauge
//!
//! ## Exporter Metrics
//! - `netscaler_up` - 1 when the scrape authenticated, 0 when it did not
//! - `netscaler_scrape_duration_seconds` - wall time of the scrape
//! - `netscaler_exporter_fetch_errors_total` - failed resource fetches
//! - `netscaler_exporter_decode_errors_total` - malformed values coerced to 0
//!
//! All metrics use the `netscaler_` namespace prefix and carry `ns_instance`.

use crate::collectors::mapper::{MappedSet, MetricKind, ResourceSchema};
use crate::collectors::SCHEMAS;
use crate::error::Result;
use prometheus::{CounterVec, Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use tracing::warn;

const NAMESPACE: &str = "netscaler";

/// A registered appliance family.
#[derive(Clone)]
pub enum Family {
    Gauge(GaugeVec),
    Counter(CounterVec),
}

impl Family {
    fn reset(&self) {
        match self {
            Family::Gauge(vec) => vec.reset(),
            Family::Counter(vec) => vec.reset(),
        }
    }

    fn set(&self, labels: &[&str], value: f64) -> prometheus::Result<()> {
        match self {
            Family::Gauge(vec) => vec.get_metric_with_label_values(labels)?.set(value),
            Family::Counter(vec) => {
                // Families are reset per resource, so the child starts at zero.
                let counter = vec.get_metric_with_label_values(labels)?;
                counter.reset();
                counter.inc_by(value.max(0.0));
            }
        }
        Ok(())
    }
}

/// Scrape-scoped metric set.
pub struct NetscalerMetrics {
    registry: Registry,
    families: HashMap<&'static str, Family>,

    pub up: GaugeVec,
    pub scrape_duration_seconds: GaugeVec,
    pub fetch_errors: IntCounterVec,
    pub decode_errors: IntCounterVec,
}

impl NetscalerMetrics {
    /// Builds a fresh registry holding every resource family and the exporter
    /// self-metrics.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let mut families = HashMap::new();

        for schema in SCHEMAS {
            let labels = schema.label_names();
            for spec in schema.families() {
                let opts = Opts::new(spec.metric, spec.help).namespace(NAMESPACE);
                let family = match spec.kind {
                    MetricKind::Gauge => {
                        let vec = GaugeVec::new(opts, &labels)?;
                        registry.register(Box::new(vec.clone()))?;
                        Family::Gauge(vec)
                    }
                    MetricKind::Counter => {
                        let vec = CounterVec::new(opts, &labels)?;
                        registry.register(Box::new(vec.clone()))?;
                        Family::Counter(vec)
                    }
                };
                families.insert(spec.metric, family);
            }
        }

        let up = GaugeVec::new(
            Opts::new("up", "Whether the last scrape of the appliance authenticated (1) or not (0)")
                .namespace(NAMESPACE),
            &["ns_instance"],
        )?;

        let scrape_duration_seconds = GaugeVec::new(
            Opts::new(
                "scrape_duration_seconds",
                "Time taken to scrape the appliance",
            )
            .namespace(NAMESPACE),
            &["ns_instance"],
        )?;

        let fetch_errors = IntCounterVec::new(
            Opts::new(
                "exporter_fetch_errors_total",
                "Nitro resource fetches that failed during this scrape",
            )
            .namespace(NAMESPACE),
            &["ns_instance", "resource"],
        )?;

        let decode_errors = IntCounterVec::new(
            Opts::new(
                "exporter_decode_errors_total",
                "Malformed numeric values reported as zero during this scrape",
            )
            .namespace(NAMESPACE),
            &["ns_instance", "resource"],
        )?;

        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(scrape_duration_seconds.clone()))?;
        registry.register(Box::new(fetch_errors.clone()))?;
        registry.register(Box::new(decode_errors.clone()))?;

        Ok(Self {
            registry,
            families,
            up,
            scrape_duration_seconds,
            fetch_errors,
            decode_errors,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Replaces the contents of `schema`'s families with `set`.
    pub fn publish(&self, instance: &str, schema: &ResourceSchema, set: &MappedSet) {
        for spec in schema.families() {
            if let Some(family) = self.families.get(spec.metric) {
                family.reset();
            }
        }

        for observation in &set.observations {
            let Some(family) = self.families.get(observation.metric) else {
                warn!(
                    instance = %instance,
                    resource = schema.resource,
                    "No family registered for {}",
                    observation.metric
                );
                continue;
            };
            let labels: Vec<&str> = observation.labels.iter().map(String::as_str).collect();
            if let Err(e) = family.set(&labels, observation.value) {
                warn!(
                    instance = %instance,
                    resource = schema.resource,
                    "Failed to set {}: {}",
                    observation.metric,
                    e
                );
            }
        }

        if !set.decode_errors.is_empty() {
            self.record_decode_errors(instance, schema.resource, set.decode_errors.len() as u64);
        }
    }

    pub fn set_up(&self, instance: &str, up: bool) {
        self.up
            .with_label_values(&[instance])
            .set(if up { 1.0 } else { 0.0 });
    }

    pub fn set_scrape_duration(&self, instance: &str, seconds: f64) {
        self.scrape_duration_seconds
            .with_label_values(&[instance])
            .set(seconds);
    }

    pub fn record_fetch_error(&self, instance: &str, resource: &str) {
        self.fetch_errors
            .with_label_values(&[instance, resource])
            .inc();
    }

    pub fn record_decode_errors(&self, instance: &str, resource: &str, count: u64) {
        self.decode_errors
            .with_label_values(&[instance, resource])
            .inc_by(count);
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            crate::error::ExporterError::Server(format!("metrics are not valid UTF-8: {}", e))
        })
    }
}
