//! Nitro REST API Client
//!
//! Typed access to the Citrix NetScaler Nitro API for one appliance.
//!
//! # Architecture
//!
//! - **Transport**: HTTPS (or HTTP) to `<target>/nitro/v1/{stat|config}/<resource>`
//! - **Authentication**: `POST config/login`, session carried as the
//!   `NITRO_AUTH_TOKEN` cookie, released with `POST config/logout`
//! - **Payloads**: every response is a [`NitroEnvelope`]; the resource fetchers
//!   below pull their record set out of it by key
//!
//! # Example
//!
//! ```no_run
//! use netscaler_exporter::nitro::{ClientSettings, DeviceTarget, NitroClient};
//! use secrecy::SecretString;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let target = DeviceTarget::new(
//!     "https://ns1.example.net",
//!     "nsroot",
//!     SecretString::from("secret"),
//!     true,
//! )?;
//!
//! let client = NitroClient::new(&target, ClientSettings::default())?;
//! client.open().await?;
//! let vservers = client.query_lb_vservers().await?;
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::nitro::connection::{ApiKind, NitroConnection};
use crate::nitro::target::{ClientSettings, DeviceTarget};
use crate::nitro::types::*;
use serde::de::DeserializeOwned;

/// Client for one appliance.
///
/// Cloning is cheap and every clone shares the same session, which lets a
/// cancelled scrape hand a clone to a background logout.
#[derive(Clone)]
pub struct NitroClient {
    connection: NitroConnection,
}

impl NitroClient {
    pub fn new(target: &DeviceTarget, settings: ClientSettings) -> Result<Self> {
        let connection = NitroConnection::new(target, settings)?;
        Ok(Self { connection })
    }

    pub fn instance(&self) -> &str {
        self.connection.instance()
    }

    /// Establishes the Nitro session.
    pub async fn open(&self) -> Result<()> {
        self.connection.login().await
    }

    /// Releases the Nitro session. A no-op when no session is open.
    pub async fn close(&self) -> Result<()> {
        self.connection.logout().await
    }

    pub async fn has_session(&self) -> bool {
        self.connection.has_session().await
    }

    /// `GET stat/<resource>` and return the raw envelope.
    pub async fn fetch_stat(&self, resource: &str, query: &[(&str, &str)]) -> Result<NitroEnvelope> {
        self.connection
            .get(ApiKind::Stat, resource, None, query)
            .await
    }

    /// `GET config/<resource>` and return the raw envelope.
    pub async fn fetch_config(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<NitroEnvelope> {
        self.connection
            .get(ApiKind::Config, resource, None, query)
            .await
    }

    /// `GET config/<resource>/<object>` for per-object configuration.
    pub async fn fetch_config_object(
        &self,
        resource: &str,
        object: &str,
        query: &[(&str, &str)],
    ) -> Result<NitroEnvelope> {
        self.connection
            .get(ApiKind::Config, resource, Some(object), query)
            .await
    }

    /// System-wide counters (`stat/ns`).
    pub async fn query_system_stats(&self) -> Result<Option<SystemStats>> {
        self.first_record(ApiKind::Stat, "ns", "ns").await
    }

    /// Licensed model (`config/nslicense`).
    pub async fn query_license(&self) -> Result<Option<License>> {
        self.first_record(ApiKind::Config, "nslicense", "nslicense")
            .await
    }

    pub async fn query_interfaces(&self) -> Result<Records<InterfaceStats>> {
        self.records(ApiKind::Stat, "interface", "Interface", &[])
            .await
    }

    pub async fn query_lb_vservers(&self) -> Result<Records<VirtualServerStats>> {
        self.records(ApiKind::Stat, "lbvserver", "lbvserver", &[])
            .await
    }

    pub async fn query_cs_vservers(&self) -> Result<Records<VirtualServerStats>> {
        self.records(ApiKind::Stat, "csvserver", "csvserver", &[])
            .await
    }

    pub async fn query_vpn_vservers(&self) -> Result<Records<VirtualServerStats>> {
        self.records(ApiKind::Stat, "vpnvserver", "vpnvserver", &[])
            .await
    }

    pub async fn query_gslb_vservers(&self) -> Result<Records<VirtualServerStats>> {
        self.records(ApiKind::Stat, "gslbvserver", "gslbvserver", &[])
            .await
    }

    pub async fn query_services(&self) -> Result<Records<ServiceStats>> {
        self.records(ApiKind::Stat, "service", "service", &[]).await
    }

    pub async fn query_gslb_services(&self) -> Result<Records<GslbServiceStats>> {
        self.records(ApiKind::Stat, "gslbservice", "gslbservice", &[])
            .await
    }

    /// Names of all configured service groups.
    pub async fn query_service_groups(&self) -> Result<Records<ServiceGroup>> {
        self.records(
            ApiKind::Config,
            "servicegroup",
            "servicegroup",
            &[("attrs", "servicegroupname")],
        )
        .await
    }

    /// Member bindings of one service group.
    pub async fn query_service_group_bindings(
        &self,
        group: &str,
    ) -> Result<Records<ServiceGroupMemberBinding>> {
        let mut envelope = self
            .fetch_config_object("servicegroup_servicegroupmember_binding", group, &[])
            .await?;
        envelope.take_records("servicegroup_servicegroupmember_binding")
    }

    /// Stats of one bound member, addressed by group, server and port.
    pub async fn query_service_group_member(
        &self,
        group: &str,
        server: &str,
        port: u16,
    ) -> Result<Option<ServiceGroupMemberStats>> {
        let args = format!(
            "servicegroupname:{},servername:{},port:{}",
            group, server, port
        );
        let mut envelope = self
            .fetch_stat("servicegroupmember", &[("args", args.as_str())])
            .await?;
        envelope
            .take_records::<ServiceGroupMemberStats>("servicegroupmember")?
            .into_first()
    }

    pub async fn query_aaa_stats(&self) -> Result<Option<AaaStats>> {
        self.first_record(ApiKind::Stat, "aaa", "aaa").await
    }

    async fn records<T>(
        &self,
        kind: ApiKind,
        resource: &str,
        key: &str,
        query: &[(&str, &str)],
    ) -> Result<Records<T>>
    where
        T: DeserializeOwned,
    {
        let mut envelope = self.connection.get(kind, resource, None, query).await?;
        envelope.take_records(key)
    }

    async fn first_record<T>(&self, kind: ApiKind, resource: &str, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.records(kind, resource, key, &[]).await?.into_first()
    }
}
