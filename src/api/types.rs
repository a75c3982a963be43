//! Wire records for the cloud API and their mapping into the domain model
//!
//! Deserialization is deliberately tolerant: a field the upstream omits or
//! garbles becomes `None` in the domain model rather than failing the whole
//! resource.

use crate::model::{
    Connector, ConnectorStatus, Station, Transaction, TransactionState,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// Envelope of the station listing
#[derive(Debug, Clone, Deserialize)]
pub struct StationsResponse {
    #[serde(default)]
    pub items: Vec<StationRecord>,
}

/// One charging station with its embedded relationships
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationRecord {
    pub id: String,
    pub uid: Option<String>,
    pub name: Option<String>,
    /// Absent means the record describes an aggregation point, not a
    /// pollable station
    pub load_interface: Option<bool>,
    pub charging_unit: Option<ChargingUnitRecord>,
    pub status: Option<StationStatusRecord>,
}

/// Physical unit identity embedded in a station record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChargingUnitRecord {
    pub id: Option<String>,
    pub serial_number: Option<String>,
    pub vendor_name: Option<String>,
    pub model: Option<String>,
    pub firmware_version: Option<String>,
    pub modem_id: Option<String>,
    pub phase_count: Option<u8>,
}

/// Station status block embedded in a station record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationStatusRecord {
    pub connection: Option<String>,
    pub registration: Option<String>,
    pub installation: Option<String>,
    pub configuration: Option<String>,
    pub firmware_update: Option<String>,
    pub heartbeat_timestamp: Option<String>,
    pub last_firmware_update_check: Option<String>,
    pub configuration_sync_required: Option<bool>,
    pub using_proxy: Option<bool>,
}

/// One connector status entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectorStatusRecord {
    pub id: Option<String>,
    pub connector_id: u32,
    pub status: Option<String>,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub limited: bool,
}

/// One raw meter value sample
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeterValueRecord {
    pub measure_name: String,
    pub measure_value: Option<serde_json::Value>,
    pub phase: Option<String>,
    pub unit: Option<String>,
    pub time: Option<String>,
    pub connector_id: Option<u32>,
    pub transaction_id: Option<String>,
    pub location: Option<String>,
    pub context: Option<String>,
}

impl MeterValueRecord {
    /// Numeric value of the sample; the upstream sends both numbers and
    /// numeric strings
    pub fn value_as_f64(&self) -> Option<f64> {
        match self.measure_value.as_ref()? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Envelope of the transaction listing, most recent first
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsResponse {
    #[serde(default)]
    pub items: Vec<TransactionRecord>,
}

/// One charging transaction
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub state: Option<String>,
    pub connector_id: Option<u32>,
    pub id_token: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub meter_start: Option<f64>,
    pub meter_stop: Option<f64>,
}

/// One configuration entry reported by a station
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigurationRecord {
    pub key: String,
    pub value: Option<String>,
    pub mutability: Option<String>,
    pub status: Option<String>,
    pub status_reason: Option<String>,
    pub last_modified: Option<String>,
    pub last_synced_with_charging_station: Option<String>,
}

/// User info keyed by the identity token it was looked up with
pub type UsersResponse = HashMap<String, UserRecord>;

/// One resolved user identity
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRecord {
    pub id: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub locale: Option<String>,
    pub virtual_id_token: Option<String>,
}

/// Acknowledgement of a configuration commit action.
///
/// `status` maps each submitted key to `Accepted`, `Rejected`, or
/// `Pending`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitAck {
    #[serde(default)]
    pub status: HashMap<String, String>,
    pub reason: Option<String>,
}

/// Parse an upstream RFC 3339 timestamp; anything unparseable becomes
/// unknown instead of poisoning the record
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl StationRecord {
    /// Whether this record is an aggregation-only load interface. A record
    /// without the flag is treated as one and excluded from polling.
    pub fn is_load_interface(&self) -> bool {
        self.load_interface.unwrap_or(true)
    }

    pub fn into_station(self) -> Station {
        let unit = self.charging_unit.unwrap_or_default();
        let status = self.status.unwrap_or_default();
        Station {
            id: self.id,
            uid: self.uid,
            name: self.name,
            serial_number: unit.serial_number,
            vendor_name: unit.vendor_name,
            model: unit.model,
            firmware_version: unit.firmware_version,
            connection: status.connection,
            registration: status.registration,
            installation: status.installation,
            configuration: status.configuration,
            firmware_update: status.firmware_update,
            heartbeat_timestamp: parse_timestamp(status.heartbeat_timestamp.as_deref()),
            last_firmware_update_check: parse_timestamp(
                status.last_firmware_update_check.as_deref(),
            ),
            configuration_sync_required: status.configuration_sync_required,
            using_proxy: status.using_proxy,
            load_interface: self.load_interface.unwrap_or(true),
            phase_count: unit.phase_count.unwrap_or(1).max(1),
        }
    }
}

impl ConnectorStatusRecord {
    /// Map to a domain connector with no transactions attached yet
    pub fn into_connector(self) -> Connector {
        Connector {
            connector_id: self.connector_id,
            status: self
                .status
                .as_deref()
                .map(ConnectorStatus::from_wire)
                .unwrap_or(ConnectorStatus::Unknown(String::new())),
            limited: self.limited,
            timestamp: parse_timestamp(self.timestamp.as_deref()),
            transactions: Vec::new(),
        }
    }
}

impl TransactionRecord {
    pub fn into_transaction(self) -> Transaction {
        let energy_wh = match (self.meter_start, self.meter_stop) {
            (Some(start), Some(stop)) => Some(stop - start),
            _ => None,
        };
        Transaction {
            id: self.id,
            state: self
                .state
                .as_deref()
                .map(TransactionState::from_wire)
                .unwrap_or(TransactionState::Unknown(String::new())),
            connector_id: self.connector_id.unwrap_or(1),
            start_time: parse_timestamp(self.start_time.as_deref()),
            end_time: parse_timestamp(self.end_time.as_deref()),
            meter_start_wh: self.meter_start,
            meter_stop_wh: self.meter_stop,
            energy_wh,
            id_token: self.id_token,
            user_display_name: None,
        }
    }
}

impl ConfigurationRecord {
    pub fn into_configuration_value(self) -> crate::model::ConfigurationValue {
        crate::model::ConfigurationValue {
            key: self.key,
            value: self.value.unwrap_or_default(),
            mutability: self.mutability,
            status: self.status,
            status_reason: self.status_reason,
            last_modified: parse_timestamp(self.last_modified.as_deref()),
            last_synced_with_station: parse_timestamp(
                self.last_synced_with_charging_station.as_deref(),
            ),
        }
    }
}

impl UserRecord {
    /// Best display name for this user: full name, any single name part,
    /// or the local part of the email address
    pub fn display_name(&self) -> Option<String> {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        match (first.is_empty(), last.is_empty()) {
            (false, false) => Some(format!("{} {}", first, last)),
            (false, true) => Some(first.to_string()),
            (true, false) => Some(last.to_string()),
            (true, true) => self
                .email
                .as_deref()
                .and_then(|email| email.split('@').next())
                .filter(|local| !local.is_empty())
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_record_without_flag_is_load_interface() {
        let record = StationRecord {
            id: "s1".to_string(),
            ..Default::default()
        };
        assert!(record.is_load_interface());

        let record = StationRecord {
            id: "s2".to_string(),
            load_interface: Some(false),
            ..Default::default()
        };
        assert!(!record.is_load_interface());
    }

    #[test]
    fn station_mapping_flattens_unit_and_status() {
        let json = serde_json::json!({
            "id": "a3f0",
            "uid": "GLB-1",
            "name": "Garage",
            "load_interface": false,
            "charging_unit": {
                "serial_number": "SN123",
                "vendor_name": "Vendor",
                "model": "M1",
                "firmware_version": "1.2.3",
                "phase_count": 3
            },
            "status": {
                "connection": "Connected",
                "heartbeat_timestamp": "2024-05-01T10:00:00Z",
                "configuration_sync_required": false,
                "using_proxy": true
            }
        });
        let record: StationRecord = serde_json::from_value(json).unwrap();
        let station = record.into_station();
        assert_eq!(station.serial_number.as_deref(), Some("SN123"));
        assert_eq!(station.phase_count, 3);
        assert_eq!(station.connection.as_deref(), Some("Connected"));
        assert_eq!(station.using_proxy, Some(true));
        assert!(station.heartbeat_timestamp.is_some());
        assert!(!station.load_interface);
    }

    #[test]
    fn meter_value_accepts_numeric_strings() {
        let record = MeterValueRecord {
            measure_name: "Voltage".to_string(),
            measure_value: Some(serde_json::json!("230.4")),
            ..Default::default()
        };
        assert_eq!(record.value_as_f64(), Some(230.4));

        let record = MeterValueRecord {
            measure_name: "Voltage".to_string(),
            measure_value: Some(serde_json::json!(231.0)),
            ..Default::default()
        };
        assert_eq!(record.value_as_f64(), Some(231.0));

        let record = MeterValueRecord {
            measure_name: "Voltage".to_string(),
            measure_value: Some(serde_json::json!({"bad": true})),
            ..Default::default()
        };
        assert_eq!(record.value_as_f64(), None);
    }

    #[test]
    fn transaction_energy_only_derived_when_ended() {
        let ended = TransactionRecord {
            id: "t1".to_string(),
            meter_start: Some(100.0),
            meter_stop: Some(350.0),
            ..Default::default()
        }
        .into_transaction();
        assert_eq!(ended.energy_wh, Some(250.0));

        let running = TransactionRecord {
            id: "t2".to_string(),
            meter_start: Some(100.0),
            ..Default::default()
        }
        .into_transaction();
        assert_eq!(running.energy_wh, None);
        assert!(running.end_time.is_none());
    }

    #[test]
    fn bad_timestamp_becomes_unknown() {
        assert!(parse_timestamp(Some("not-a-time")).is_none());
        assert!(parse_timestamp(Some("2024-05-01T10:00:00+02:00")).is_some());
        assert!(parse_timestamp(None).is_none());
    }

    #[test]
    fn display_name_precedence() {
        let full = UserRecord {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(full.display_name().as_deref(), Some("Ada Lovelace"));

        let first_only = UserRecord {
            first_name: Some("Ada".to_string()),
            ..Default::default()
        };
        assert_eq!(first_only.display_name().as_deref(), Some("Ada"));

        let email_only = UserRecord {
            email: Some("ada@example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(email_only.display_name().as_deref(), Some("ada"));

        let empty = UserRecord::default();
        assert_eq!(empty.display_name(), None);
    }
}
