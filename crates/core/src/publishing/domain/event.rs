use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::analysis::domain::assessment::{Assessment, Status};
use crate::shared::constants::PLACEHOLDER_PAYLOAD;
use crate::shared::outcome::Outcome;

/// Time-of-day format of the `timestamp` field, e.g. `14:03:27.026490`.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.6f";

/// What the classification variant publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadMode {
    /// The computed label and confidence.
    #[default]
    Prediction,
    /// The constant `test` body older consumers expect.
    Placeholder,
}

impl FromStr for PayloadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prediction" => Ok(PayloadMode::Prediction),
            "placeholder" => Ok(PayloadMode::Placeholder),
            _ => Err(format!(
                "unknown payload mode '{s}', expected 'prediction' or 'placeholder'"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrowsinessEvent {
    #[serde(with = "time_of_day")]
    pub timestamp: NaiveTime,
    pub eye: f64,
    pub pitch: f64,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationEvent {
    #[serde(with = "time_of_day")]
    pub timestamp: NaiveTime,
    pub label: String,
    pub confidence: f64,
}

/// Wire form of one outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Drowsiness(DrowsinessEvent),
    Classification(ClassificationEvent),
    Placeholder,
}

impl EventPayload {
    pub fn from_outcome(outcome: &Outcome, mode: PayloadMode) -> Self {
        match &outcome.assessment {
            Assessment::Drowsiness {
                metrics, status, ..
            } => EventPayload::Drowsiness(DrowsinessEvent {
                timestamp: outcome.timestamp,
                eye: metrics.eye,
                pitch: metrics.pitch,
                status: *status,
            }),
            Assessment::Classification { .. } if mode == PayloadMode::Placeholder => {
                EventPayload::Placeholder
            }
            Assessment::Classification { metrics } => {
                EventPayload::Classification(ClassificationEvent {
                    timestamp: outcome.timestamp,
                    label: metrics.label.clone(),
                    confidence: metrics.confidence,
                })
            }
        }
    }

    /// Message body handed to the transport.
    pub fn to_body(&self) -> Result<String, serde_json::Error> {
        match self {
            EventPayload::Drowsiness(event) => serde_json::to_string(event),
            EventPayload::Classification(event) => serde_json::to_string(event),
            EventPayload::Placeholder => Ok(PLACEHOLDER_PAYLOAD.to_string()),
        }
    }
}

mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&text, "%H:%M:%S%.f").map_err(serde::de::Error::custom)
    }
}
