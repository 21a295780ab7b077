//! Citrix NetScaler Prometheus Exporter
//!
//! A multi-target Prometheus exporter for the Citrix NetScaler (ADC) Nitro API.
//!
//! # Overview
//!
//! The exporter polls an appliance's Nitro stat and config resources and
//! republishes them as Prometheus metrics. It is a multi-target exporter: each
//! scrape names its appliance (`/probe?target=...`) and is served from a
//! registry built for that request alone, so one process can scrape many
//! appliances concurrently.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   /probe?target=   ┌──────────────────────────────┐   HTTPS   ┌───────────┐
//! │ Prometheus │ ─────────────────► │ exporter::handle             │ ◄───────► │ NetScaler │
//! └────────────┘ ◄───────────────── │  NitroClient + registry +    │   Nitro   └───────────┘
//!                  text exposition  │  scrape::run (per request)   │
//!                                   └──────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`nitro`] - Nitro REST client, session handling and API types
//! - [`collectors`] - Per-resource fetch and field mapping
//! - [`scrape`] - Collection orchestrator (session lifecycle, deadline)
//! - [`exporter`] - Request-scoped client/registry construction
//! - [`metrics`] - Prometheus family registration and rendering
//! - [`server`] - HTTP endpoints
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use netscaler_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     config.validate()?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod collectors;
pub mod config;
pub mod error;
pub mod exporter;
pub mod metrics;
pub mod nitro;
pub mod scrape;
pub mod server;
