//! Per-station pipeline of one poll cycle
//!
//! Steps inside one station's pipeline are strictly sequential (later steps
//! need identifiers from earlier ones); pipelines of different stations run
//! concurrently and never abort each other. Sub-resource failures are
//! absorbed here at the lowest level that knows a safe fallback.

use super::identity::IdentityResolver;
use super::{meter, phase};
use crate::api::CloudApi;
use crate::api::types::StationRecord;
use crate::config::MeterConfig;
use crate::error::StratusError;
use crate::logging::{LogContext, get_logger_with_context};
use crate::model::{Connector, Fetched, MeterValues, StationSnapshot, TransactionState};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::task::JoinSet;

/// What to do about a failed sub-resource call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Fallback {
    /// Credentials are globally invalid; the whole cycle must stop
    AbortCycle,
    /// Only this station is affected; siblings continue
    SkipStation,
    /// Keep the station, mark the resource unavailable
    MarkUnavailable,
    /// Keep the station, mark the resource unavailable, and stop issuing
    /// further calls for it this cycle
    BackOff,
}

pub(super) fn fallback_for(error: &StratusError) -> Fallback {
    match error {
        StratusError::Unauthorized { .. } => Fallback::AbortCycle,
        StratusError::NotFound { .. } => Fallback::SkipStation,
        StratusError::RateLimited { .. } => Fallback::BackOff,
        _ => Fallback::MarkUnavailable,
    }
}

/// Result of one station's pipeline
pub(super) enum StationOutcome {
    Synced(Box<StationSnapshot>),
    Skipped { id: String, reason: String },
    Fatal(StratusError),
}

/// Energy consumed so far by an in-flight transaction, derived from the
/// latest aggregate energy counter. A started transaction with no usable
/// counter yet has measurably consumed nothing.
pub(super) fn in_flight_energy_wh(meter_start_wh: f64, latest_energy_wh: Option<f64>) -> f64 {
    match latest_energy_wh {
        Some(energy) if energy >= meter_start_wh => energy - meter_start_wh,
        _ => 0.0,
    }
}

/// Run the full pipeline for one station and assemble its snapshot
pub(super) async fn sync_station(
    api: Arc<dyn CloudApi>,
    record: StationRecord,
    meter_config: MeterConfig,
) -> StationOutcome {
    let station = record.into_station();
    let logger = get_logger_with_context(
        LogContext::new("sync").with_station_id(station.id.clone()),
    );
    let mut partial = false;
    let mut backed_off = false;

    // Connector status first: transaction reads depend on the connector ids
    // discovered here.
    let connectors = match api.connector_status(&station.id).await {
        Ok(records) => Fetched::Fresh(
            records
                .into_iter()
                .map(|r| r.into_connector())
                .collect::<Vec<Connector>>(),
        ),
        Err(e) => match fallback_for(&e) {
            Fallback::AbortCycle => return StationOutcome::Fatal(e),
            Fallback::SkipStation => {
                logger.warn(&format!("skipping station: {}", e));
                return StationOutcome::Skipped {
                    id: station.id,
                    reason: e.to_string(),
                };
            }
            Fallback::BackOff => {
                logger.warn(&format!("connector status rate limited: {}", e));
                partial = true;
                backed_off = true;
                Fetched::Unavailable
            }
            Fallback::MarkUnavailable => {
                logger.warn(&format!("connector status unavailable: {}", e));
                partial = true;
                Fetched::Unavailable
            }
        },
    };

    let primary_connector = connectors
        .fresh()
        .and_then(|list| list.first())
        .map_or(1, |c| c.connector_id);

    // Best-effort refresh, then read whatever the cloud has cached. A failed
    // trigger alone does not make the meter data partial.
    let mut latest_energy_wh = None;
    let meter_values: Fetched<MeterValues> = if backed_off {
        Fetched::Unavailable
    } else {
        let _ = meter::trigger_fresh_meter_values(
            api.as_ref(),
            &station.id,
            primary_connector,
            &meter_config,
            &logger,
        )
        .await;

        match api.latest_meter_values(&station.id, primary_connector).await {
            Ok(records) => {
                let raw = meter::fold_meter_values(&records);
                latest_energy_wh = raw.energy_import.aggregate;
                Fetched::Fresh(phase::decompose(&raw, station.phase_count))
            }
            Err(e) => match fallback_for(&e) {
                Fallback::AbortCycle => return StationOutcome::Fatal(e),
                Fallback::SkipStation => {
                    logger.warn(&format!("skipping station: {}", e));
                    return StationOutcome::Skipped {
                        id: station.id,
                        reason: e.to_string(),
                    };
                }
                Fallback::BackOff => {
                    logger.warn(&format!("meter values rate limited: {}", e));
                    partial = true;
                    backed_off = true;
                    Fetched::Unavailable
                }
                Fallback::MarkUnavailable => {
                    logger.warn(&format!("meter values unavailable: {}", e));
                    partial = true;
                    Fetched::Unavailable
                }
            },
        }
    };

    // Transactions per connector, then identity resolution for their tokens
    let connectors = match connectors {
        Fetched::Fresh(mut list) => {
            for connector in &mut list {
                if backed_off {
                    partial = true;
                    break;
                }
                match api.transactions(&station.id, connector.connector_id).await {
                    Ok(records) => {
                        connector.transactions = records
                            .into_iter()
                            .map(|r| r.into_transaction())
                            .collect();
                    }
                    Err(e) => match fallback_for(&e) {
                        Fallback::AbortCycle => return StationOutcome::Fatal(e),
                        Fallback::SkipStation => {
                            logger.warn(&format!("skipping station: {}", e));
                            return StationOutcome::Skipped {
                                id: station.id,
                                reason: e.to_string(),
                            };
                        }
                        Fallback::BackOff => {
                            logger.warn(&format!("transactions rate limited: {}", e));
                            partial = true;
                            backed_off = true;
                        }
                        Fallback::MarkUnavailable => {
                            logger.warn(&format!(
                                "transactions unavailable for connector {}: {}",
                                connector.connector_id, e
                            ));
                            partial = true;
                        }
                    },
                }
            }

            derive_in_flight_energy(&mut list, latest_energy_wh);

            let display_names =
                resolve_display_names(&api, &list, backed_off).await;
            annotate_user_names(&mut list, &display_names);

            Fetched::Fresh(list)
        }
        Fetched::Unavailable => Fetched::Unavailable,
    };

    // Configuration last; it shares the fallback rules of the other
    // optional resources.
    let configuration = if backed_off {
        partial = true;
        Fetched::Unavailable
    } else {
        match api.configuration(&station.id).await {
            Ok(records) => Fetched::Fresh(
                records
                    .into_iter()
                    .map(|r| r.into_configuration_value())
                    .collect::<Vec<_>>(),
            ),
            Err(e) => match fallback_for(&e) {
                Fallback::AbortCycle => return StationOutcome::Fatal(e),
                Fallback::SkipStation => {
                    logger.warn(&format!("skipping station: {}", e));
                    return StationOutcome::Skipped {
                        id: station.id,
                        reason: e.to_string(),
                    };
                }
                Fallback::BackOff | Fallback::MarkUnavailable => {
                    logger.warn(&format!("configuration unavailable: {}", e));
                    partial = true;
                    Fetched::Unavailable
                }
            },
        }
    };

    StationOutcome::Synced(Box::new(StationSnapshot {
        station,
        connectors,
        meter_values,
        configuration,
        partial,
    }))
}

fn derive_in_flight_energy(connectors: &mut [Connector], latest_energy_wh: Option<f64>) {
    for connector in connectors {
        for transaction in &mut connector.transactions {
            if transaction.state == TransactionState::Started
                && transaction.meter_stop_wh.is_none()
                && let Some(start) = transaction.meter_start_wh
            {
                transaction.energy_wh = Some(in_flight_energy_wh(start, latest_energy_wh));
            }
        }
    }
}

/// Resolve every distinct token carried by this station's transactions.
/// Lookups for different tokens are independent and run concurrently; when
/// the pipeline has backed off, tokens fall back to their raw value without
/// further calls.
async fn resolve_display_names(
    api: &Arc<dyn CloudApi>,
    connectors: &[Connector],
    backed_off: bool,
) -> HashMap<String, String> {
    let tokens: BTreeSet<String> = connectors
        .iter()
        .flat_map(|c| &c.transactions)
        .filter_map(|t| t.id_token.clone())
        .filter(|t| !t.trim().is_empty())
        .collect();

    if backed_off {
        return tokens.into_iter().map(|t| (t.clone(), t)).collect();
    }

    let resolver = IdentityResolver::new(Arc::clone(api));
    let mut lookups = JoinSet::new();
    for token in tokens {
        let resolver = resolver.clone();
        lookups.spawn(async move {
            let name = resolver.resolve(&token).await;
            (token, name)
        });
    }

    let mut names = HashMap::new();
    while let Some(result) = lookups.join_next().await {
        if let Ok((token, name)) = result {
            names.insert(token, name);
        }
    }
    names
}

fn annotate_user_names(connectors: &mut [Connector], names: &HashMap<String, String>) {
    for connector in connectors {
        for transaction in &mut connector.transactions {
            if let Some(token) = transaction.id_token.as_ref() {
                transaction.user_display_name = names.get(token).cloned();
            }
        }
    }
}
