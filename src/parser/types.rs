//! Wire types for the prescription parser.
//!
//! The JSON shape here is the interoperability contract with the parser
//! collaborator — field names must not change. Missing numeric fields
//! default rather than error; schedule absence routes through the
//! aggregator.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_WINDOW_END_MINUTES, DEFAULT_WINDOW_START_MINUTES};
use crate::models::{FoodTiming, ParsedMedication, Schedule};
use crate::schedule::aggregate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPrescription {
    pub medications: Vec<RawMedication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<RawSchedule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Parser-supplied schedule. Food relation may arrive as a `food_timing`
/// label or a legacy `with_food` boolean.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSchedule {
    #[serde(default)]
    pub times_per_day: Option<i32>,
    #[serde(default)]
    pub preferred_times: Vec<String>,
    #[serde(default)]
    pub food_timing: Option<String>,
    #[serde(default)]
    pub with_food: Option<bool>,
    #[serde(default)]
    pub duration_days: Option<i32>,
    #[serde(default)]
    pub start_time_minutes: Option<i32>,
    #[serde(default)]
    pub end_time_minutes: Option<i32>,
    #[serde(default)]
    pub interval_days: Option<i32>,
}

impl RawMedication {
    pub fn into_medication(self) -> ParsedMedication {
        ParsedMedication {
            name: self.name,
            dosage: self.dosage,
            frequency: self.frequency,
            duration: self.duration,
            instructions: self.instructions.unwrap_or_default(),
        }
    }
}

impl RawSchedule {
    /// Convert to the domain schedule, defaulting every missing field.
    ///
    /// `window_specified` is set iff the parser supplied either window
    /// bound — an explicit 480/1200 answer is preserved as intent instead
    /// of being mistaken for silence.
    pub fn into_schedule(self) -> Schedule {
        let window_specified =
            self.start_time_minutes.is_some() || self.end_time_minutes.is_some();

        Schedule {
            times_per_day: self.times_per_day.unwrap_or(1).max(1),
            preferred_times: self.preferred_times,
            food_timing: parse_food_timing(self.food_timing.as_deref(), self.with_food),
            duration_days: self.duration_days.unwrap_or(7).max(1),
            start_time_minutes: self.start_time_minutes.unwrap_or(DEFAULT_WINDOW_START_MINUTES),
            end_time_minutes: self.end_time_minutes.unwrap_or(DEFAULT_WINDOW_END_MINUTES),
            window_specified,
            interval_days: self.interval_days.unwrap_or(1).max(1),
        }
    }
}

impl RawPrescription {
    pub fn medications(&self) -> Vec<ParsedMedication> {
        self.medications
            .iter()
            .cloned()
            .map(RawMedication::into_medication)
            .collect()
    }

    /// The parser's schedule when present, otherwise one aggregated from
    /// the medications' free text.
    pub fn resolve_schedule(&self) -> Schedule {
        match &self.schedule {
            Some(raw) => raw.clone().into_schedule(),
            None => aggregate(&self.medications()),
        }
    }
}

fn parse_food_timing(label: Option<&str>, with_food: Option<bool>) -> FoodTiming {
    if let Some(label) = label {
        let normalized = label.to_lowercase().replace(' ', "_");
        if let Ok(timing) = FoodTiming::from_str(&normalized) {
            return timing;
        }
        tracing::debug!(label, "Unrecognized food timing label, falling back");
    }
    match with_food {
        Some(true) => FoodTiming::DuringMeal,
        _ => FoodTiming::Neutral,
    }
}
