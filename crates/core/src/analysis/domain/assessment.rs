use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::constants::{NO_DETECTION_LABEL, NO_DETECTION_SENTINEL};

/// Drowsiness classification of one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Safe,
    Warning,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Safe => write!(f, "safe"),
            Status::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrowsinessMetrics {
    /// Mean eye-aspect-ratio of both eyes, rounded to 3 decimals.
    pub eye: f64,
    /// Head pitch in degrees as reported by the face API.
    pub pitch: f64,
}

impl DrowsinessMetrics {
    pub fn sentinel() -> Self {
        Self {
            eye: NO_DETECTION_SENTINEL,
            pitch: NO_DETECTION_SENTINEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationMetrics {
    pub label: String,
    /// Probability of `label`, in `[0, 1]`.
    pub confidence: f64,
}

impl ClassificationMetrics {
    pub fn none() -> Self {
        Self {
            label: NO_DETECTION_LABEL.to_string(),
            confidence: 0.0,
        }
    }
}

/// Result of reading metrics out of a response that had the expected shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<M> {
    Metrics(M),
    /// The endpoint answered but found no face or object.
    NoDetection,
}

/// Per-iteration verdict, one variant per deployment kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Assessment {
    Drowsiness {
        metrics: DrowsinessMetrics,
        status: Status,
        /// `false` when the metrics are the no-detection sentinel.
        detected: bool,
    },
    Classification {
        metrics: ClassificationMetrics,
    },
}

impl Assessment {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Assessment::Drowsiness {
                status: Status::Warning,
                ..
            }
        )
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assessment::Drowsiness {
                metrics,
                status: Status::Warning,
                ..
            } => write!(
                f,
                "WARNING! Drowsiness detected! Eye: {:.6}, Pitch: {:.6}",
                metrics.eye, metrics.pitch
            ),
            Assessment::Drowsiness {
                detected: false, ..
            } => write!(f, "No face detected"),
            Assessment::Drowsiness { metrics, .. } => {
                write!(f, "Eye: {:.6}, Pitch: {:.6}", metrics.eye, metrics.pitch)
            }
            Assessment::Classification { metrics } => write!(
                f,
                "I see {} with {:.6} confidence.",
                metrics.label, metrics.confidence
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Warning).unwrap(), "\"warning\"");
        assert_eq!(
            serde_json::from_str::<Status>("\"safe\"").unwrap(),
            Status::Safe
        );
    }

    #[test]
    fn test_sentinel_metrics() {
        let m = DrowsinessMetrics::sentinel();
        assert_eq!(m.eye, 100.0);
        assert_eq!(m.pitch, 100.0);
    }

    #[test]
    fn test_display_warning() {
        let a = Assessment::Drowsiness {
            metrics: DrowsinessMetrics {
                eye: 0.12,
                pitch: -20.5,
            },
            status: Status::Warning,
            detected: true,
        };
        assert!(a.is_warning());
        assert_eq!(
            a.to_string(),
            "WARNING! Drowsiness detected! Eye: 0.120000, Pitch: -20.500000"
        );
    }

    #[test]
    fn test_display_no_detection() {
        let a = Assessment::Drowsiness {
            metrics: DrowsinessMetrics::sentinel(),
            status: Status::Safe,
            detected: false,
        };
        assert!(!a.is_warning());
        assert_eq!(a.to_string(), "No face detected");
    }

    #[test]
    fn test_display_classification() {
        let a = Assessment::Classification {
            metrics: ClassificationMetrics {
                label: "dog".into(),
                confidence: 0.9,
            },
        };
        assert_eq!(a.to_string(), "I see dog with 0.900000 confidence.");
    }
}
