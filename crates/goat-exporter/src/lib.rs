//! Prometheus exporter for Goat network nodes.
//!
//! On every scrape the [`Collector`] asks the node for its block height,
//! chain id and `eth_syncing` progress over JSON-RPC and republishes them as
//! gauges under the `goat` namespace. Each RPC call is isolated: one failing
//! call only removes its own samples from the scrape.
//!
//! # Modules
//!
//! - [`client`] — [`NodeClient`] trait and the `alloy`-backed [`RpcNodeClient`]
//! - [`schema`] — the fixed 23-metric catalog
//! - [`collector`] — per-scrape fan-out under one deadline
//! - [`metrics`] — Prometheus text rendering
//! - [`routes`] — `/metrics` and `/health` handlers
//! - [`server`] — actix server lifecycle
//! - [`config`] — environment configuration

pub mod client;
pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod schema;
pub mod server;
pub mod state;

pub use client::{NodeClient, RpcNodeClient, SyncProgress, SyncStatus};
pub use collector::{Collector, Sample};
pub use config::{ConfigError, ExporterConfig};
pub use error::ExporterError;
pub use schema::{Descriptor, Metric, MetricKind, MetricSchema};
pub use state::AppState;
