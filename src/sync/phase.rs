//! Expansion of a raw multi-phase reading into normalized per-phase records

use crate::model::{MeasureKind, MeterReading, MeterValues, Phase, RawMeterValues};

/// Decompose a folded raw reading according to the station's declared phase
/// count.
///
/// A single-phase station yields one unlabeled aggregate reading; a
/// multi-phase station yields exactly one labeled reading per phase,
/// populated from the phase-indexed slots of the raw payload. A slot absent
/// for a given phase stays unknown; it is never coerced to zero, because
/// zero is itself a valid measurement.
pub fn decompose(raw: &RawMeterValues, phase_count: u8) -> MeterValues {
    if phase_count <= 1 {
        let mut reading = MeterReading::default();
        for kind in MeasureKind::ALL {
            set_field(&mut reading, kind, raw.measure(kind).aggregate);
        }
        return MeterValues::Aggregate(reading);
    }

    let count = usize::from(phase_count).min(3);
    let readings = (0..count)
        .map(|index| {
            let mut reading = MeterReading {
                phase: Phase::from_index(index),
                ..Default::default()
            };
            for kind in MeasureKind::ALL {
                set_field(&mut reading, kind, raw.measure(kind).per_phase[index]);
            }
            reading
        })
        .collect();
    MeterValues::PerPhase(readings)
}

fn set_field(reading: &mut MeterReading, kind: MeasureKind, value: Option<f64>) {
    match kind {
        MeasureKind::EnergyImport => reading.energy_import_wh = value,
        MeasureKind::ActivePower => reading.active_power_w = value,
        MeasureKind::CurrentImport => reading.current_import_a = value,
        MeasureKind::CurrentExport => reading.current_export_a = value,
        MeasureKind::CurrentOffered => reading.current_offered_a = value,
        MeasureKind::Voltage => reading.voltage_v = value,
        MeasureKind::Frequency => reading.frequency_hz = value,
        MeasureKind::Temperature => reading.temperature_c = value,
    }
}
