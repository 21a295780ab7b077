//! Nitro API Type Definitions
//!
//! Rust definitions for the JSON bodies exchanged with the Nitro REST API.
//!
//! # Design Notes
//!
//! - **Envelope**: every stat/config response is `{errorcode, message, severity,
//!   <resource>: ...}`. The resource payload is kept as raw JSON until a fetcher
//!   asks for it by key, so one envelope type serves every resource.
//! - **Numbers**: the appliance emits counters as JSON strings on some firmware
//!   and JSON numbers on others. Records therefore keep their numeric fields as
//!   raw [`serde_json::Value`]s in a flattened [`StatFields`] map and decode them
//!   through [`decode_number`] at mapping time.
//! - **Identity**: identity fields (`name`, `servicegroupname`, `servername`)
//!   and `state` are typed, because labels and the state gauge depend on them.
//!
//! # Endpoints Covered
//!
//! - `stat/ns` → [`SystemStats`]
//! - `config/nslicense` → [`License`]
//! - `stat/interface` → [`InterfaceStats`]
//! - `stat/lbvserver`, `stat/csvserver`, `stat/gslbvserver`, `stat/vpnvserver`
//!   → [`VirtualServerStats`]
//! - `stat/service` → [`ServiceStats`]
//! - `stat/gslbservice` → [`GslbServiceStats`]
//! - `config/servicegroup` → [`ServiceGroup`]
//! - `config/servicegroup_servicegroupmember_binding` → [`ServiceGroupMemberBinding`]
//! - `stat/servicegroupmember` → [`ServiceGroupMemberStats`]
//! - `stat/aaa` → [`AaaStats`]

use crate::error::{ExporterError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Port value the appliance uses for "any port" bindings.
pub const WILDCARD_PORT: u16 = 65535;

/// Login request body: `{"login":{"username":..,"password":..}}`
#[derive(Debug, Serialize)]
pub struct LoginPayload<'a> {
    pub login: LoginCredentials<'a>,
}

#[derive(Debug, Serialize)]
pub struct LoginCredentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Logout request body: `{"logout":{}}`
#[derive(Debug, Serialize, Default)]
pub struct LogoutPayload {
    pub logout: EmptyObject,
}

#[derive(Debug, Serialize, Default)]
pub struct EmptyObject {}

/// Generic stat/config response envelope.
#[derive(Debug, Deserialize, Default)]
pub struct NitroEnvelope {
    #[serde(default)]
    pub errorcode: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub sessionid: Option<String>,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, Value>,
}

impl NitroEnvelope {
    pub fn is_success(&self) -> bool {
        self.errorcode == 0
    }

    /// Removes and decodes the record set stored under `key`.
    ///
    /// The appliance omits the key entirely when no objects of that type
    /// exist, which yields an empty set. Single-object resources (`ns`,
    /// `aaa`, `nslicense`) are returned as a one-element set and fail as a
    /// whole when malformed. Malformed array items are set aside in
    /// [`Records::rejected`] so their siblings still decode.
    pub fn take_records<T>(&mut self, key: &str) -> Result<Records<T>>
    where
        T: DeserializeOwned,
    {
        match self.payload.remove(key) {
            None | Some(Value::Null) => Ok(Records::default()),
            Some(Value::Array(items)) => {
                let mut records = Records::default();
                for item in items {
                    match T::deserialize(&item) {
                        Ok(record) => records.items.push(record),
                        Err(_) => records.rejected.push(ExporterError::Decode {
                            field: key.to_string(),
                            value: item.to_string(),
                        }),
                    }
                }
                Ok(records)
            }
            Some(other) => Ok(Records {
                items: vec![serde_json::from_value(other)?],
                rejected: Vec::new(),
            }),
        }
    }
}

/// Decoded records of one resource, plus the items that could not be decoded.
#[derive(Debug)]
pub struct Records<T> {
    pub items: Vec<T>,
    pub rejected: Vec<ExporterError>,
}

impl<T> Default for Records<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Records<T> {
    /// First record of a single-object resource. A set holding nothing but
    /// rejected items is an error.
    pub fn into_first(self) -> Result<Option<T>> {
        let mut rejected = self.rejected.into_iter();
        match (self.items.into_iter().next(), rejected.next()) {
            (Some(record), _) => Ok(Some(record)),
            (None, Some(e)) => Err(e),
            (None, None) => Ok(None),
        }
    }
}

impl<T> std::ops::Deref for Records<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> IntoIterator for Records<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Numeric fields of a record, keyed by their Nitro attribute name.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(transparent)]
pub struct StatFields(pub HashMap<String, Value>);

impl StatFields {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Decodes a Nitro numeric attribute that may arrive as a JSON number or as a
/// decimal string.
pub fn decode_number(field: &str, value: &Value) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ExporterError::Decode {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

/// `stat/ns`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SystemStats {
    #[serde(flatten)]
    pub fields: StatFields,
}

/// `config/nslicense`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct License {
    #[serde(flatten)]
    pub fields: StatFields,
}

/// `stat/interface` (array key `Interface`)
#[derive(Debug, Deserialize, Clone)]
pub struct InterfaceStats {
    pub id: String,
    #[serde(default, rename = "interfacealias")]
    pub alias: String,
    #[serde(flatten)]
    pub fields: StatFields,
}

/// Shared shape of `lbvserver`, `csvserver`, `gslbvserver` and `vpnvserver`.
#[derive(Debug, Deserialize, Clone)]
pub struct VirtualServerStats {
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(flatten)]
    pub fields: StatFields,
}

/// `stat/service`
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceStats {
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(flatten)]
    pub fields: StatFields,
}

/// `stat/gslbservice`
#[derive(Debug, Deserialize, Clone)]
pub struct GslbServiceStats {
    #[serde(rename = "servicename")]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(flatten)]
    pub fields: StatFields,
}

/// `config/servicegroup?attrs=servicegroupname`
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceGroup {
    #[serde(rename = "servicegroupname")]
    pub name: String,
}

/// `config/servicegroup_servicegroupmember_binding/<group>`
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceGroupMemberBinding {
    #[serde(default)]
    pub servicegroupname: String,
    pub servername: String,
    pub port: Value,
}

impl ServiceGroupMemberBinding {
    /// Bound port, accepting both string and numeric encodings.
    pub fn port(&self) -> Result<u16> {
        let port = decode_number("port", &self.port)?;
        if port < 0.0 || port > f64::from(u16::MAX) || port.fract() != 0.0 {
            return Err(ExporterError::Decode {
                field: "port".to_string(),
                value: self.port.to_string(),
            });
        }
        Ok(port as u16)
    }

    pub fn is_wildcard_port(&self) -> bool {
        matches!(self.port(), Ok(WILDCARD_PORT))
    }
}

/// `stat/servicegroupmember?args=servicegroupname:..,servername:..,port:..`
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceGroupMemberStats {
    #[serde(default)]
    pub state: String,
    #[serde(flatten)]
    pub fields: StatFields,
}

/// `stat/aaa`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AaaStats {
    #[serde(flatten)]
    pub fields: StatFields,
}
