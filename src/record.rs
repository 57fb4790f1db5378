//! Vitals records
//!
//! The shape handed to the host's record store after a measurement: both rates,
//! a timestamp and the user's symptom ratings. Storage and listing belong to the
//! host; this module only builds, validates and serializes records.

use crate::error::VitalsError;
use crate::pipeline::VitalsMeasurement;
use crate::{PRODUCER_NAME, VITALS_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Highest rating a symptom can receive
pub const MAX_RATING: u8 = 5;

/// Symptoms the user can rate alongside a measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    Nausea,
    Headache,
    Diarrhea,
    SoreThroat,
    Fever,
    MuscleAche,
    LossOfSmellOrTaste,
    Cough,
    ShortnessOfBreath,
    FeelingTired,
}

impl Symptom {
    pub const ALL: [Symptom; 10] = [
        Symptom::Nausea,
        Symptom::Headache,
        Symptom::Diarrhea,
        Symptom::SoreThroat,
        Symptom::Fever,
        Symptom::MuscleAche,
        Symptom::LossOfSmellOrTaste,
        Symptom::Cough,
        Symptom::ShortnessOfBreath,
        Symptom::FeelingTired,
    ];

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Symptom::Nausea => "Nausea",
            Symptom::Headache => "Headache",
            Symptom::Diarrhea => "Diarrhea",
            Symptom::SoreThroat => "Sore Throat",
            Symptom::Fever => "Fever",
            Symptom::MuscleAche => "Muscle Ache",
            Symptom::LossOfSmellOrTaste => "Loss of Smell or Taste",
            Symptom::Cough => "Cough",
            Symptom::ShortnessOfBreath => "Shortness of Breath",
            Symptom::FeelingTired => "Feeling Tired",
        }
    }

    /// Storage key: the display name lowercased with spaces replaced by underscores
    pub fn key(&self) -> String {
        normalize_symptom_key(self.display_name())
    }

    /// Look up a symptom by display name or storage key
    pub fn from_name(name: &str) -> Option<Symptom> {
        let key = normalize_symptom_key(name);
        Symptom::ALL.into_iter().find(|s| s.key() == key)
    }
}

/// Lowercase a symptom name and replace spaces with underscores
pub fn normalize_symptom_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// A measurement with the user's symptom ratings, ready for the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Breaths per minute
    pub respiratory_rate: i64,
    /// Beats per minute
    pub heart_rate: i64,
    /// Ratings 0-5; unrated symptoms are absent
    #[serde(default)]
    pub symptoms: BTreeMap<Symptom, u8>,
    pub producer: RecordProducer,
}

/// Producer metadata embedded in every record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordProducer {
    pub name: String,
    pub version: String,
}

impl Default for RecordProducer {
    fn default() -> Self {
        Self {
            name: PRODUCER_NAME.to_string(),
            version: VITALS_VERSION.to_string(),
        }
    }
}

impl VitalsRecord {
    /// Create a record timestamped now
    pub fn new(heart_rate: u32, respiratory_rate: u32) -> Self {
        Self::at(Utc::now(), heart_rate, respiratory_rate)
    }

    /// Create a record with an explicit timestamp
    pub fn at(timestamp: DateTime<Utc>, heart_rate: u32, respiratory_rate: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            respiratory_rate: i64::from(respiratory_rate),
            heart_rate: i64::from(heart_rate),
            symptoms: BTreeMap::new(),
            producer: RecordProducer::default(),
        }
    }

    /// Build a record from a combined measurement; fails if either pipeline failed
    pub fn from_measurement(measurement: VitalsMeasurement) -> Result<Self, VitalsError> {
        let heart_rate = measurement.heart_rate?;
        let respiratory_rate = measurement.respiratory_rate?;
        Ok(Self::new(heart_rate, respiratory_rate))
    }

    /// Set a symptom rating (0-5); re-rating replaces the previous value
    pub fn rate(&mut self, symptom: Symptom, rating: u8) -> Result<(), VitalsError> {
        check_rating(symptom, rating)?;
        self.symptoms.insert(symptom, rating);
        Ok(())
    }

    /// Set a symptom rating by display name or storage key
    pub fn rate_by_name(&mut self, name: &str, rating: u8) -> Result<(), VitalsError> {
        let symptom = Symptom::from_name(name)
            .ok_or_else(|| VitalsError::InvalidRecord(format!("unknown symptom: {name}")))?;
        self.rate(symptom, rating)
    }

    /// Rating for a symptom; unrated symptoms read as 0
    pub fn rating(&self, symptom: Symptom) -> u8 {
        self.symptoms.get(&symptom).copied().unwrap_or(0)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, VitalsError> {
        serde_json::to_string(self).map_err(VitalsError::JsonError)
    }

    /// Parse and validate a record from JSON
    pub fn from_json(json: &str) -> Result<Self, VitalsError> {
        let record: VitalsRecord = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    /// Check rates are non-negative and ratings are in range
    pub fn validate(&self) -> Result<(), VitalsError> {
        if self.heart_rate < 0 || self.respiratory_rate < 0 {
            return Err(VitalsError::InvalidRecord(
                "rates must be non-negative".to_string(),
            ));
        }
        for (symptom, rating) in &self.symptoms {
            check_rating(*symptom, *rating)?;
        }
        Ok(())
    }
}

fn check_rating(symptom: Symptom, rating: u8) -> Result<(), VitalsError> {
    if rating > MAX_RATING {
        return Err(VitalsError::InvalidRecord(format!(
            "rating {rating} for {} exceeds {MAX_RATING}",
            symptom.key()
        )));
    }
    Ok(())
}

/// Order records oldest first, the order the history listing shows them in
pub fn sort_chronologically(records: &mut [VitalsRecord]) {
    records.sort_by_key(|r| r.timestamp);
}
