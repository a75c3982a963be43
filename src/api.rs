//! Typed access to the vendor cloud API
//!
//! One operation per upstream resource kind, each returning either a typed
//! record or one of the distinguishable error kinds (`Unauthorized`,
//! `NotFound`, `ServerError`, `RateLimited`, `Malformed`). No retry logic
//! lives here: retries and fallbacks are a sync-policy decision made by the
//! caller, which needs the error kinds to stay observable.

use crate::error::Result;
use async_trait::async_trait;

pub mod client;
pub mod credentials;
pub mod types;

pub use client::RestClient;
pub use credentials::{CredentialProvider, StaticTokenProvider};
use types::{
    CommitAck, ConfigurationRecord, ConnectorStatusRecord, MeterValueRecord, StationRecord,
    TransactionRecord, UserRecord,
};

/// Resource-level operations against the charging cloud
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// List all charging stations visible to the account, including their
    /// embedded charging-unit and status blocks
    async fn list_stations(&self) -> Result<Vec<StationRecord>>;

    /// Current status of every connector on one station
    async fn connector_status(&self, station_id: &str) -> Result<Vec<ConnectorStatusRecord>>;

    /// Latest cached meter values for one connector
    async fn latest_meter_values(
        &self,
        station_id: &str,
        connector_id: u32,
    ) -> Result<Vec<MeterValueRecord>>;

    /// Ask the station to push a fresh meter-value reading to the cloud
    async fn trigger_meter_values(&self, station_id: &str, connector_id: u32) -> Result<()>;

    /// Recent transactions for one connector, most recent first
    async fn transactions(
        &self,
        station_id: &str,
        connector_id: u32,
    ) -> Result<Vec<TransactionRecord>>;

    /// Configuration key/value pairs reported by one station
    async fn configuration(&self, station_id: &str) -> Result<Vec<ConfigurationRecord>>;

    /// Resolve a single charge-session identity token to a user record.
    /// The upstream accepts exactly one token per call.
    async fn user_by_token(&self, id_token: &str) -> Result<Option<UserRecord>>;

    /// Apply a configuration change through the action endpoint. The direct
    /// configuration PUT does not reliably reach the physical station and
    /// is not used.
    async fn commit_configuration(
        &self,
        station_id: &str,
        key: &str,
        value: &str,
    ) -> Result<CommitAck>;
}
