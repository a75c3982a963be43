//! REST implementation of the cloud API
//!
//! Thin request/response mapping over `reqwest`: build the request, attach
//! the bearer token, translate the HTTP status into the error taxonomy, and
//! decode the body. Nothing here retries or aggregates.

use super::CloudApi;
use super::credentials::CredentialProvider;
use super::types::{
    CommitAck, ConfigurationRecord, ConnectorStatusRecord, MeterValueRecord, StationRecord,
    StationsResponse, TransactionRecord, TransactionsResponse, UserRecord, UsersResponse,
};
use crate::config::ApiConfig;
use crate::error::{Result, StratusError};
use crate::logging::get_logger;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// HTTP client for the vendor end-user API
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
    logger: crate::logging::StructuredLogger,
}

impl RestClient {
    /// Build a client from the API configuration and an injected credential
    /// source
    pub fn new(config: &ApiConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            logger: get_logger("api"),
        })
    }

    /// Translate a non-success HTTP status into the error taxonomy
    fn map_error_status(status: StatusCode, context: &str) -> Option<StratusError> {
        if status.is_success() {
            return None;
        }
        let message = format!("{} ({})", context, status);
        Some(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                StratusError::unauthorized(message)
            }
            StatusCode::NOT_FOUND => StratusError::not_found(message),
            StatusCode::TOO_MANY_REQUESTS => StratusError::rate_limited(message),
            s if s.is_server_error() => StratusError::server(message),
            _ => StratusError::malformed(message),
        })
    }

    fn validate_station_id(station_id: &str) -> Result<()> {
        if station_id.trim().is_empty() {
            return Err(StratusError::validation(
                "station_id",
                "Station id cannot be empty",
            ));
        }
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let token = self.credentials.access_token().await?;
        let url = format!("{}{}", self.base_url, path);
        self.logger.debug(&format!("GET {}", path));

        let response = self
            .http
            .get(&url)
            .query(query)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if let Some(err) = Self::map_error_status(response.status(), path) {
            self.logger.warn(&format!("GET {} failed: {}", path, err));
            return Err(err);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StratusError::malformed(format!("{}: {}", path, e)))
    }

    async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let token = self.credentials.access_token().await?;
        let url = format!("{}{}", self.base_url, path);
        self.logger.debug(&format!("PUT {}", path));

        let response = self
            .http
            .put(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        if let Some(err) = Self::map_error_status(response.status(), path) {
            self.logger.warn(&format!("PUT {} failed: {}", path, err));
            return Err(err);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StratusError::malformed(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl CloudApi for RestClient {
    async fn list_stations(&self) -> Result<Vec<StationRecord>> {
        let response: StationsResponse = self
            .get_json(
                "/charging-stations",
                &[
                    ("context", "Owner".to_string()),
                    ("include_relationships", "true".to_string()),
                ],
            )
            .await?;
        Ok(response.items)
    }

    async fn connector_status(&self, station_id: &str) -> Result<Vec<ConnectorStatusRecord>> {
        Self::validate_station_id(station_id)?;
        self.get_json(
            &format!("/charging-stations/{}/connector-status", station_id),
            &[("context", "Owner".to_string())],
        )
        .await
    }

    async fn latest_meter_values(
        &self,
        station_id: &str,
        connector_id: u32,
    ) -> Result<Vec<MeterValueRecord>> {
        Self::validate_station_id(station_id)?;
        self.get_json(
            "/meter-values/latest",
            &[
                ("context", "Owner".to_string()),
                ("charging_station_id", station_id.to_string()),
                ("connector_id", connector_id.to_string()),
            ],
        )
        .await
    }

    async fn trigger_meter_values(&self, station_id: &str, connector_id: u32) -> Result<()> {
        Self::validate_station_id(station_id)?;
        let body = serde_json::json!({
            "requested_message": "MeterValues",
            "connector_id": connector_id,
        });
        let _: serde_json::Value = self
            .put_json(&format!("/actions/trigger-message/{}", station_id), &body)
            .await?;
        Ok(())
    }

    async fn transactions(
        &self,
        station_id: &str,
        connector_id: u32,
    ) -> Result<Vec<TransactionRecord>> {
        Self::validate_station_id(station_id)?;
        let response: TransactionsResponse = self
            .get_json(
                "/transactions",
                &[
                    ("context", "Owner".to_string()),
                    ("charging_station_id", station_id.to_string()),
                    ("connector_id", connector_id.to_string()),
                ],
            )
            .await?;
        Ok(response.items)
    }

    async fn configuration(&self, station_id: &str) -> Result<Vec<ConfigurationRecord>> {
        Self::validate_station_id(station_id)?;
        self.get_json(
            &format!("/charging-stations/{}/configuration", station_id),
            &[],
        )
        .await
    }

    async fn user_by_token(&self, id_token: &str) -> Result<Option<UserRecord>> {
        if id_token.trim().is_empty() {
            return Err(StratusError::validation(
                "id_token",
                "Identity token cannot be empty",
            ));
        }
        let mut response: UsersResponse = self
            .get_json(
                "/users",
                &[
                    ("role", "Owner".to_string()),
                    ("id_tokens", id_token.to_string()),
                ],
            )
            .await?;
        Ok(response.remove(id_token))
    }

    async fn commit_configuration(
        &self,
        station_id: &str,
        key: &str,
        value: &str,
    ) -> Result<CommitAck> {
        Self::validate_station_id(station_id)?;
        let body = serde_json::json!({
            "configuration_variables": [
                { "key": key, "value": value }
            ]
        });
        self.put_json(
            &format!("/actions/change-configuration/{}", station_id),
            &body,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_covers_taxonomy() {
        let map = |status| RestClient::map_error_status(status, "/test");
        assert!(map(StatusCode::OK).is_none());
        assert!(matches!(
            map(StatusCode::UNAUTHORIZED),
            Some(StratusError::Unauthorized { .. })
        ));
        assert!(matches!(
            map(StatusCode::FORBIDDEN),
            Some(StratusError::Unauthorized { .. })
        ));
        assert!(matches!(
            map(StatusCode::NOT_FOUND),
            Some(StratusError::NotFound { .. })
        ));
        assert!(matches!(
            map(StatusCode::TOO_MANY_REQUESTS),
            Some(StratusError::RateLimited { .. })
        ));
        assert!(matches!(
            map(StatusCode::BAD_GATEWAY),
            Some(StratusError::ServerError { .. })
        ));
        assert!(matches!(
            map(StatusCode::BAD_REQUEST),
            Some(StratusError::Malformed { .. })
        ));
    }

    #[test]
    fn empty_station_id_rejected_before_any_request() {
        let err = RestClient::validate_station_id("  ").unwrap_err();
        assert!(matches!(err, StratusError::Validation { .. }));
        assert!(RestClient::validate_station_id("a3f0").is_ok());
    }
}
