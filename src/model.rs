//! Domain model for the synced charging-station fleet
//!
//! Everything in this module is rebuilt from scratch on every poll cycle and
//! published as one immutable snapshot. Nothing here is mutated in place, so
//! consumers can never observe a value from one cycle fused with metadata
//! from another.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Electrical phase label for per-phase meter readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    L1,
    L2,
    L3,
}

impl Phase {
    /// Zero-based slot index in phase-indexed payload fields
    pub fn index(self) -> usize {
        match self {
            Phase::L1 => 0,
            Phase::L2 => 1,
            Phase::L3 => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Phase::L1),
            1 => Some(Phase::L2),
            2 => Some(Phase::L3),
            _ => None,
        }
    }

    pub fn from_wire(label: &str) -> Option<Self> {
        match label {
            "L1" => Some(Phase::L1),
            "L2" => Some(Phase::L2),
            "L3" => Some(Phase::L3),
            _ => None,
        }
    }
}

/// Measure kinds reported by the meter-values resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasureKind {
    EnergyImport,
    ActivePower,
    CurrentImport,
    CurrentExport,
    CurrentOffered,
    Voltage,
    Frequency,
    Temperature,
}

impl MeasureKind {
    pub const ALL: [MeasureKind; 8] = [
        MeasureKind::EnergyImport,
        MeasureKind::ActivePower,
        MeasureKind::CurrentImport,
        MeasureKind::CurrentExport,
        MeasureKind::CurrentOffered,
        MeasureKind::Voltage,
        MeasureKind::Frequency,
        MeasureKind::Temperature,
    ];

    /// Map an upstream measure name to a known kind; unknown names are
    /// skipped by the caller rather than failing the read.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "Energy.Active.Import.Register" => Some(MeasureKind::EnergyImport),
            "Power.Active.Import" => Some(MeasureKind::ActivePower),
            "Current.Import" => Some(MeasureKind::CurrentImport),
            "Current.Export" => Some(MeasureKind::CurrentExport),
            "Current.Offered" => Some(MeasureKind::CurrentOffered),
            "Voltage" => Some(MeasureKind::Voltage),
            "Frequency" => Some(MeasureKind::Frequency),
            "Temperature" => Some(MeasureKind::Temperature),
            _ => None,
        }
    }
}

/// One scalar measure as accumulated from the raw meter payload: an
/// aggregate slot plus one slot per phase. Absent slots stay `None`; zero
/// is a valid measurement and never stands in for "missing".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMeasure {
    pub aggregate: Option<f64>,
    pub per_phase: [Option<f64>; 3],
}

/// Folded per-measure table built from the raw meter-value list, the input
/// to phase decomposition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMeterValues {
    pub energy_import: RawMeasure,
    pub active_power: RawMeasure,
    pub current_import: RawMeasure,
    pub current_export: RawMeasure,
    pub current_offered: RawMeasure,
    pub voltage: RawMeasure,
    pub frequency: RawMeasure,
    pub temperature: RawMeasure,
}

impl RawMeterValues {
    pub fn measure(&self, kind: MeasureKind) -> &RawMeasure {
        match kind {
            MeasureKind::EnergyImport => &self.energy_import,
            MeasureKind::ActivePower => &self.active_power,
            MeasureKind::CurrentImport => &self.current_import,
            MeasureKind::CurrentExport => &self.current_export,
            MeasureKind::CurrentOffered => &self.current_offered,
            MeasureKind::Voltage => &self.voltage,
            MeasureKind::Frequency => &self.frequency,
            MeasureKind::Temperature => &self.temperature,
        }
    }

    pub fn measure_mut(&mut self, kind: MeasureKind) -> &mut RawMeasure {
        match kind {
            MeasureKind::EnergyImport => &mut self.energy_import,
            MeasureKind::ActivePower => &mut self.active_power,
            MeasureKind::CurrentImport => &mut self.current_import,
            MeasureKind::CurrentExport => &mut self.current_export,
            MeasureKind::CurrentOffered => &mut self.current_offered,
            MeasureKind::Voltage => &mut self.voltage,
            MeasureKind::Frequency => &mut self.frequency,
            MeasureKind::Temperature => &mut self.temperature,
        }
    }
}

/// One normalized meter reading, either aggregate (`phase: None`) or for a
/// single phase
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeterReading {
    pub phase: Option<Phase>,
    pub energy_import_wh: Option<f64>,
    pub active_power_w: Option<f64>,
    pub current_import_a: Option<f64>,
    pub current_export_a: Option<f64>,
    pub current_offered_a: Option<f64>,
    pub voltage_v: Option<f64>,
    pub frequency_hz: Option<f64>,
    pub temperature_c: Option<f64>,
}

/// Meter values for one station, shaped by its declared phase count.
///
/// The two shapes are deliberately distinct variants: an aggregate reading
/// has no phase fields to misread, and a per-phase set always holds exactly
/// the declared number of labeled readings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MeterValues {
    Aggregate(MeterReading),
    PerPhase(Vec<MeterReading>),
}

/// Connector status as reported by the cloud
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConnectorStatus {
    Available,
    Preparing,
    Charging,
    SuspendedEv,
    SuspendedEvse,
    Occupied,
    Finishing,
    Faulted,
    Unavailable,
    Reserved,
    Unknown(String),
}

impl ConnectorStatus {
    pub fn from_wire(status: &str) -> Self {
        match status {
            "Available" => ConnectorStatus::Available,
            "Preparing" => ConnectorStatus::Preparing,
            "Charging" => ConnectorStatus::Charging,
            "SuspendedEV" => ConnectorStatus::SuspendedEv,
            "SuspendedEVSE" => ConnectorStatus::SuspendedEvse,
            "Occupied" => ConnectorStatus::Occupied,
            "Finishing" => ConnectorStatus::Finishing,
            "Faulted" => ConnectorStatus::Faulted,
            "Unavailable" => ConnectorStatus::Unavailable,
            "Reserved" => ConnectorStatus::Reserved,
            other => ConnectorStatus::Unknown(other.to_string()),
        }
    }
}

/// Charging transaction state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransactionState {
    Started,
    Finished,
    Stopped,
    Authorized,
    Preparing,
    Unknown(String),
}

impl TransactionState {
    pub fn from_wire(state: &str) -> Self {
        match state {
            "Started" => TransactionState::Started,
            "Finished" => TransactionState::Finished,
            "Stopped" => TransactionState::Stopped,
            "Authorized" => TransactionState::Authorized,
            "Preparing" => TransactionState::Preparing,
            other => TransactionState::Unknown(other.to_string()),
        }
    }
}

/// One charging transaction on a connector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: String,
    pub state: TransactionState,
    pub connector_id: u32,
    pub start_time: Option<DateTime<Utc>>,
    /// Present only once the transaction has ended
    pub end_time: Option<DateTime<Utc>>,
    pub meter_start_wh: Option<f64>,
    pub meter_stop_wh: Option<f64>,
    /// Energy consumed by this transaction, derived from meter counters
    pub energy_wh: Option<f64>,
    /// Opaque identity token presented at session start, if any
    pub id_token: Option<String>,
    /// Resolved display name for the token; may legitimately stay absent
    pub user_display_name: Option<String>,
}

/// A single charging socket on a station
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connector {
    pub connector_id: u32,
    pub status: ConnectorStatus,
    pub limited: bool,
    pub timestamp: Option<DateTime<Utc>>,
    pub transactions: Vec<Transaction>,
}

/// A physical charging station and its cloud-reported status block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub id: String,
    pub uid: Option<String>,
    pub name: Option<String>,
    pub serial_number: Option<String>,
    pub vendor_name: Option<String>,
    pub model: Option<String>,
    pub firmware_version: Option<String>,
    pub connection: Option<String>,
    pub registration: Option<String>,
    pub installation: Option<String>,
    pub configuration: Option<String>,
    pub firmware_update: Option<String>,
    pub heartbeat_timestamp: Option<DateTime<Utc>>,
    pub last_firmware_update_check: Option<DateTime<Utc>>,
    pub configuration_sync_required: Option<bool>,
    pub using_proxy: Option<bool>,
    /// Aggregation-only stations carry no telemetry of their own and are
    /// excluded from polling
    pub load_interface: bool,
    /// Declared number of electrical phases (1 or 3)
    pub phase_count: u8,
}

/// One configuration key/value pair as reported by the station.
///
/// `mutability` is carried verbatim but never consulted: the upstream
/// always reports it as unknown, so writability is decided by a fixed
/// allow-list instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationValue {
    pub key: String,
    pub value: String,
    pub mutability: Option<String>,
    pub status: Option<String>,
    pub status_reason: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub last_synced_with_station: Option<DateTime<Utc>>,
}

/// Per-cycle fetch outcome for one sub-resource.
///
/// `Unavailable` means "this cycle could not fetch it", which consumers
/// must be able to tell apart from "fetched, currently empty".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Fetched<T> {
    Fresh(T),
    Unavailable,
}

impl<T> Fetched<T> {
    pub fn fresh(&self) -> Option<&T> {
        match self {
            Fetched::Fresh(value) => Some(value),
            Fetched::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Fetched::Unavailable)
    }
}

/// Immutable per-station result of one poll cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSnapshot {
    pub station: Station,
    pub connectors: Fetched<Vec<Connector>>,
    pub meter_values: Fetched<MeterValues>,
    pub configuration: Fetched<Vec<ConfigurationValue>>,
    /// True when any sub-resource failed non-fatally this cycle
    pub partial: bool,
}

/// Immutable fleet-wide result of one completed poll cycle
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FleetSnapshot {
    /// Snapshots keyed by station id, in stable order
    pub stations: BTreeMap<String, StationSnapshot>,
    /// Stations dropped this cycle, with the reason they were skipped
    pub skipped: BTreeMap<String, String>,
    /// Total number of stations reported upstream, including load
    /// interfaces excluded from polling
    pub station_count: usize,
}
