//! Simulated vital signs and threshold alerts
//!
//! A reading is a pure function of the patient id and the minute it falls
//! in, so repeated requests for the same minute return the same values.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

pub const HEART_RATE_LOW: u16 = 50;
pub const HEART_RATE_HIGH: u16 = 110;
pub const TEMPERATURE_LOW: f32 = 35.5;
pub const TEMPERATURE_HIGH: f32 = 38.0;
pub const SPO2_LOW: u8 = 92;

/// Chance that a reading contains an out-of-range excursion
const EXCURSION_PROBABILITY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VitalSigns {
    pub patient_id: Uuid,
    /// Start of the minute the reading belongs to
    pub recorded_at: DateTime<Utc>,
    /// Beats per minute
    pub heart_rate: u16,
    /// Degrees Celsius, one decimal
    pub temperature_c: f32,
    /// Oxygen saturation, percent
    pub spo2: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowHeartRate,
    HighHeartRate,
    LowTemperature,
    Fever,
    LowOxygen,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertKind::LowHeartRate => "low heart rate",
            AlertKind::HighHeartRate => "high heart rate",
            AlertKind::LowTemperature => "low body temperature",
            AlertKind::Fever => "fever",
            AlertKind::LowOxygen => "low oxygen saturation",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    fn new(kind: AlertKind, reading: String) -> Self {
        Self {
            kind,
            message: format!("{kind}: {reading}"),
        }
    }
}

/// Truncate to the start of the minute.
fn minute_bucket(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(TimeDelta::minutes(1)).unwrap_or(at)
}

fn seed_for(patient_id: Uuid, bucket: DateTime<Utc>) -> u64 {
    let id = patient_id.as_u128();
    let folded = (id >> 64) as u64 ^ id as u64;
    folded ^ (bucket.timestamp() / 60).wrapping_mul(0x9E37_79B9_7F4A_7C15_u64 as i64) as u64
}

/// Reading for `patient_id` during the minute containing `at`.
pub fn simulate(patient_id: Uuid, at: DateTime<Utc>) -> VitalSigns {
    let recorded_at = minute_bucket(at);
    let mut rng = StdRng::seed_from_u64(seed_for(patient_id, recorded_at));

    let mut heart_rate = rng.gen_range(58..=98);
    let mut temperature_tenths: i32 = rng.gen_range(361..=374);
    let mut spo2 = rng.gen_range(95..=99);

    if rng.gen_bool(EXCURSION_PROBABILITY) {
        match rng.gen_range(0..3) {
            0 => heart_rate = rng.gen_range(38..=140),
            1 => temperature_tenths = rng.gen_range(348..=395),
            _ => spo2 = rng.gen_range(86..=94),
        }
    }

    VitalSigns {
        patient_id,
        recorded_at,
        heart_rate,
        temperature_c: temperature_tenths as f32 / 10.0,
        spo2,
    }
}

/// Threshold alerts for a reading, in a fixed order.
pub fn alerts_for(vitals: &VitalSigns) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if vitals.heart_rate < HEART_RATE_LOW {
        alerts.push(Alert::new(
            AlertKind::LowHeartRate,
            format!("{} bpm", vitals.heart_rate),
        ));
    } else if vitals.heart_rate > HEART_RATE_HIGH {
        alerts.push(Alert::new(
            AlertKind::HighHeartRate,
            format!("{} bpm", vitals.heart_rate),
        ));
    }

    if vitals.temperature_c < TEMPERATURE_LOW {
        alerts.push(Alert::new(
            AlertKind::LowTemperature,
            format!("{:.1} °C", vitals.temperature_c),
        ));
    } else if vitals.temperature_c >= TEMPERATURE_HIGH {
        alerts.push(Alert::new(
            AlertKind::Fever,
            format!("{:.1} °C", vitals.temperature_c),
        ));
    }

    if vitals.spo2 < SPO2_LOW {
        alerts.push(Alert::new(AlertKind::LowOxygen, format!("{}%", vitals.spo2)));
    }

    alerts
}
