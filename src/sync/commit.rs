//! Configuration writes through the commit action endpoint
//!
//! Writes go through `change-configuration` actions because the direct
//! configuration PUT does not reliably reach the physical station. The
//! upstream acknowledges a commit asynchronously: the ack may already be
//! terminal, or report the change as pending until the station applies or
//! refuses it.

use crate::api::CloudApi;
use crate::config::CommitConfig;
use crate::error::{Result, StratusError};
use crate::logging::get_logger;
use serde::Serialize;
use std::sync::Arc;

/// Configuration keys accepted for write.
///
/// The upstream reports every key's mutability as unknown, so writability
/// cannot be derived from metadata. This fixed allow-list is a deliberate
/// policy choice; any other key is refused locally before a request is
/// made.
pub const WRITABLE_KEYS: [&str; 2] = ["GaroOwnerMaxCurrent", "LightIntensity"];

const STATUS_ACCEPTED: &str = "Accepted";
const STATUS_REJECTED: &str = "Rejected";

/// Terminal outcome of a commit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommitState {
    Accepted,
    Rejected,
}

/// Result surfaced for one configuration write
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitResult {
    pub station_id: String,
    pub key: String,
    pub value: String,
    pub state: CommitState,
    /// Upstream reason text on rejection, passed through verbatim
    pub reason: Option<String>,
}

/// Applies configuration writes and resolves their asynchronous outcome
pub struct CommitGateway {
    api: Arc<dyn CloudApi>,
    config: CommitConfig,
    logger: crate::logging::StructuredLogger,
}

impl CommitGateway {
    pub fn new(api: Arc<dyn CloudApi>, config: CommitConfig) -> Self {
        Self {
            api,
            config,
            logger: get_logger("commit"),
        }
    }

    /// Commit one configuration value and wait for the terminal
    /// Accepted/Rejected outcome.
    ///
    /// A rejection is a successful call carrying `CommitState::Rejected`:
    /// a refused write that changed nothing is an outcome the caller must
    /// see, not an error to swallow. Errors are reserved for keys outside
    /// the allow-list, transport failures, and commits that never settle.
    pub async fn commit(&self, station_id: &str, key: &str, value: &str) -> Result<CommitResult> {
        if !WRITABLE_KEYS.contains(&key) {
            return Err(StratusError::validation(
                "key",
                &format!("{} is not a writable configuration key", key),
            ));
        }

        self.logger.info(&format!(
            "committing {}={} on station {}",
            key, value, station_id
        ));
        let ack = self.api.commit_configuration(station_id, key, value).await?;

        match ack.status.get(key).map(String::as_str) {
            Some(STATUS_ACCEPTED) => Ok(self.terminal(station_id, key, value, CommitState::Accepted, None)),
            Some(STATUS_REJECTED) => {
                Ok(self.terminal(station_id, key, value, CommitState::Rejected, ack.reason))
            }
            _ => self.resolve_pending(station_id, key, value).await,
        }
    }

    /// Poll the station configuration until the pending commit settles
    async fn resolve_pending(
        &self,
        station_id: &str,
        key: &str,
        value: &str,
    ) -> Result<CommitResult> {
        for _ in 0..self.config.poll_attempts {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.poll_delay_ms)).await;

            match self.api.configuration(station_id).await {
                Ok(records) => {
                    let Some(record) = records.into_iter().find(|r| r.key == key) else {
                        continue;
                    };
                    match record.status.as_deref() {
                        Some(STATUS_ACCEPTED) => {
                            return Ok(self.terminal(
                                station_id,
                                key,
                                value,
                                CommitState::Accepted,
                                None,
                            ));
                        }
                        Some(STATUS_REJECTED) => {
                            return Ok(self.terminal(
                                station_id,
                                key,
                                value,
                                CommitState::Rejected,
                                record.status_reason,
                            ));
                        }
                        _ => {}
                    }
                }
                Err(e @ StratusError::RateLimited { .. }) => return Err(e),
                Err(e) => {
                    self.logger
                        .debug(&format!("commit status poll failed, retrying: {}", e));
                }
            }
        }

        Err(StratusError::timeout(format!(
            "configuration change {}={} on {} still pending",
            key, value, station_id
        )))
    }

    fn terminal(
        &self,
        station_id: &str,
        key: &str,
        value: &str,
        state: CommitState,
        reason: Option<String>,
    ) -> CommitResult {
        match state {
            CommitState::Accepted => {
                self.logger
                    .info(&format!("{}={} accepted by station {}", key, value, station_id));
            }
            CommitState::Rejected => {
                self.logger.warn(&format!(
                    "{}={} rejected by station {}: {}",
                    key,
                    value,
                    station_id,
                    reason.as_deref().unwrap_or("no reason given")
                ));
            }
        }
        CommitResult {
            station_id: station_id.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            state,
            reason,
        }
    }
}
