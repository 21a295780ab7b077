//! Metric Field Mapper
//!
//! Turns decoded Nitro records into metric observations. Each resource declares
//! a [`ResourceSchema`]: its identity labels, an optional `state` gauge and the
//! numeric attributes it exports. Mapping is a pure transform, so every resource
//! can be tested against literal JSON fixtures without a registry or network.
//!
//! # Value Rules
//!
//! - `state`: exactly `"UP"` is 1, anything else is 0
//! - Numeric attributes: JSON number or decimal string; an unparseable value
//!   is observed as 0 and reported in [`MappedSet::decode_errors`]
//! - Absent attributes: observed as 0 without a fault, because the appliance
//!   omits counters that have never been incremented on some firmware

use crate::error::ExporterError;
use crate::nitro::types::{decode_number, StatFields};
use serde_json::Value;

/// Prometheus type of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

/// One numeric Nitro attribute and the family it feeds.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub metric: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
}

impl FieldSpec {
    pub const fn counter(key: &'static str, metric: &'static str, help: &'static str) -> Self {
        Self {
            key,
            metric,
            help,
            kind: MetricKind::Counter,
        }
    }

    pub const fn gauge(key: &'static str, metric: &'static str, help: &'static str) -> Self {
        Self {
            key,
            metric,
            help,
            kind: MetricKind::Gauge,
        }
    }
}

/// The 0/1 state gauge of a resource.
#[derive(Debug, Clone, Copy)]
pub struct StateSpec {
    pub metric: &'static str,
    pub help: &'static str,
}

/// Everything needed to register and populate one resource's families.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSchema {
    /// Nitro resource path, used as the `resource` label on error counters.
    pub resource: &'static str,
    /// Identity labels following `ns_instance`.
    pub labels: &'static [&'static str],
    pub state: Option<StateSpec>,
    pub fields: &'static [FieldSpec],
}

/// Registration view of one family.
#[derive(Debug, Clone, Copy)]
pub struct FamilySpec {
    pub metric: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
}

impl ResourceSchema {
    pub fn families(&self) -> Vec<FamilySpec> {
        let state = self.state.map(|s| FamilySpec {
            metric: s.metric,
            help: s.help,
            kind: MetricKind::Gauge,
        });
        state
            .into_iter()
            .chain(self.fields.iter().map(|f| FamilySpec {
                metric: f.metric,
                help: f.help,
                kind: f.kind,
            }))
            .collect()
    }

    /// Label names of every family of this resource, `ns_instance` first.
    pub fn label_names(&self) -> Vec<&'static str> {
        std::iter::once("ns_instance")
            .chain(self.labels.iter().copied())
            .collect()
    }
}

/// A record the mapper can read.
pub trait StatRecord {
    /// Identity label values, in the order of [`ResourceSchema::labels`].
    fn identity(&self) -> Vec<&str>;

    fn state(&self) -> Option<&str> {
        None
    }

    fn fields(&self) -> &StatFields;
}

impl<T> StatRecord for &T
where
    T: StatRecord + ?Sized,
{
    fn identity(&self) -> Vec<&str> {
        (**self).identity()
    }

    fn state(&self) -> Option<&str> {
        (**self).state()
    }

    fn fields(&self) -> &StatFields {
        (**self).fields()
    }
}

/// One (family, label set, value) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub metric: &'static str,
    pub labels: Vec<String>,
    pub value: f64,
}

/// Output of mapping one resource's record set.
#[derive(Debug, Default)]
pub struct MappedSet {
    pub observations: Vec<Observation>,
    pub decode_errors: Vec<ExporterError>,
}

impl MappedSet {
    /// Adds records that were dropped before mapping to the decode errors.
    pub fn with_rejected(mut self, rejected: Vec<ExporterError>) -> Self {
        self.decode_errors.extend(rejected);
        self
    }

    pub fn extend(&mut self, other: MappedSet) {
        self.observations.extend(other.observations);
        self.decode_errors.extend(other.decode_errors);
    }

    pub fn value_of(&self, metric: &str, labels: &[&str]) -> Option<f64> {
        self.observations
            .iter()
            .find(|o| o.metric == metric && o.labels.iter().map(String::as_str).eq(labels.iter().copied()))
            .map(|o| o.value)
    }
}

pub fn state_value(state: &str) -> f64 {
    if state == "UP" {
        1.0
    } else {
        0.0
    }
}

pub fn map_records<R>(schema: &ResourceSchema, instance: &str, records: &[R]) -> MappedSet
where
    R: StatRecord,
{
    let mut set = MappedSet::default();
    for record in records {
        map_record(schema, instance, record, &mut set);
    }
    set
}

fn map_record<R>(schema: &ResourceSchema, instance: &str, record: &R, set: &mut MappedSet)
where
    R: StatRecord,
{
    let labels: Vec<String> = std::iter::once(instance)
        .chain(record.identity())
        .map(str::to_string)
        .collect();

    if let Some(state) = &schema.state {
        set.observations.push(Observation {
            metric: state.metric,
            labels: labels.clone(),
            value: state_value(record.state().unwrap_or_default()),
        });
    }

    for field in schema.fields {
        let value = match record.fields().get(field.key) {
            None | Some(Value::Null) => 0.0,
            Some(raw) => decode_number(field.key, raw).unwrap_or_else(|e| {
                set.decode_errors.push(e);
                0.0
            }),
        };
        set.observations.push(Observation {
            metric: field.metric,
            labels: labels.clone(),
            value,
        });
    }
}
