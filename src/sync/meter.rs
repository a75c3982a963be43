//! Meter-value refresh and folding
//!
//! The cloud serves cached meter values and only refreshes them when the
//! station is explicitly asked to push a new reading. The trigger is issued
//! right before the read to minimize staleness, but freshness stays
//! best-effort: a failed trigger never blocks the read of whatever is
//! cached.

use crate::api::CloudApi;
use crate::api::types::MeterValueRecord;
use crate::config::MeterConfig;
use crate::logging::StructuredLogger;
use crate::model::{MeasureKind, Phase, RawMeterValues};
use std::collections::HashMap;

/// Wire name of the measure that signals a completed refresh
const CURRENT_OFFERED: &str = "Current.Offered";

/// Ask the station for a fresh reading and wait a bounded number of
/// re-reads for it to land. Returns whether a fresh reading was confirmed;
/// the caller proceeds with the cached values either way.
pub(super) async fn trigger_fresh_meter_values(
    api: &dyn CloudApi,
    station_id: &str,
    connector_id: u32,
    config: &MeterConfig,
    logger: &StructuredLogger,
) -> bool {
    if let Err(e) = api.trigger_meter_values(station_id, connector_id).await {
        logger.debug(&format!(
            "meter trigger failed, reading cached values: {}",
            e
        ));
        return false;
    }

    for _ in 0..config.trigger_poll_attempts {
        match api.latest_meter_values(station_id, connector_id).await {
            Ok(records) => {
                if records.iter().any(|r| r.measure_name == CURRENT_OFFERED) {
                    return true;
                }
            }
            Err(e) => {
                if matches!(e, crate::error::StratusError::RateLimited { .. }) {
                    logger.debug("rate limited while waiting for fresh meter values");
                    return false;
                }
                logger.debug(&format!("meter re-read failed while waiting: {}", e));
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(config.trigger_poll_delay_ms)).await;
    }

    logger.debug(&format!(
        "no {} measure after {} attempts, using cached values",
        CURRENT_OFFERED, config.trigger_poll_attempts
    ));
    false
}

/// Fold the raw meter-value list into one slot per measure kind and phase.
/// When the upstream repeats a measure, the sample with the latest
/// timestamp wins; samples with unknown kinds or undecodable values are
/// skipped.
pub(super) fn fold_meter_values(records: &[MeterValueRecord]) -> RawMeterValues {
    let mut folded = RawMeterValues::default();
    let mut latest: HashMap<(MeasureKind, Option<usize>), String> = HashMap::new();

    for record in records {
        let Some(kind) = MeasureKind::from_wire(&record.measure_name) else {
            continue;
        };
        let Some(value) = record.value_as_f64() else {
            continue;
        };
        let slot = match record.phase.as_deref() {
            Some(label) => match Phase::from_wire(label) {
                Some(phase) => Some(phase.index()),
                None => continue,
            },
            None => None,
        };

        let time = record.time.clone().unwrap_or_default();
        let newer = latest
            .get(&(kind, slot))
            .map_or(true, |previous| time > *previous);
        if newer {
            let measure = folded.measure_mut(kind);
            match slot {
                Some(index) => measure.per_phase[index] = Some(value),
                None => measure.aggregate = Some(value),
            }
            latest.insert((kind, slot), time);
        }
    }

    folded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, value: f64, phase: Option<&str>, time: &str) -> MeterValueRecord {
        MeterValueRecord {
            measure_name: name.to_string(),
            measure_value: Some(serde_json::json!(value)),
            phase: phase.map(str::to_string),
            time: Some(time.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn folds_phases_and_aggregate_into_slots() {
        let records = vec![
            sample("Voltage", 230.0, Some("L1"), "2024-05-01T10:00:00Z"),
            sample("Voltage", 231.0, Some("L2"), "2024-05-01T10:00:00Z"),
            sample("Voltage", 229.0, Some("L3"), "2024-05-01T10:00:00Z"),
            sample(
                "Energy.Active.Import.Register",
                1234.0,
                None,
                "2024-05-01T10:00:00Z",
            ),
        ];
        let folded = fold_meter_values(&records);
        assert_eq!(folded.voltage.per_phase, [Some(230.0), Some(231.0), Some(229.0)]);
        assert_eq!(folded.voltage.aggregate, None);
        assert_eq!(folded.energy_import.aggregate, Some(1234.0));
    }

    #[test]
    fn latest_sample_wins_per_slot() {
        let records = vec![
            sample("Power.Active.Import", 1000.0, None, "2024-05-01T10:00:00Z"),
            sample("Power.Active.Import", 1500.0, None, "2024-05-01T10:05:00Z"),
            sample("Power.Active.Import", 900.0, None, "2024-05-01T09:55:00Z"),
        ];
        let folded = fold_meter_values(&records);
        assert_eq!(folded.active_power.aggregate, Some(1500.0));
    }

    #[test]
    fn unknown_measures_and_phases_are_skipped() {
        let records = vec![
            sample("SoC", 80.0, None, "2024-05-01T10:00:00Z"),
            sample("Voltage", 230.0, Some("N"), "2024-05-01T10:00:00Z"),
            MeterValueRecord {
                measure_name: "Voltage".to_string(),
                measure_value: Some(serde_json::json!("garbled")),
                ..Default::default()
            },
        ];
        let folded = fold_meter_values(&records);
        assert_eq!(folded, RawMeterValues::default());
    }
}
