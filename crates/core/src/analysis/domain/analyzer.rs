use crate::analysis::domain::assessment::{Assessment, ClassificationMetrics, Extraction};
use crate::analysis::domain::classification_extractor::extract_classification;
use crate::analysis::domain::drowsiness_extractor::extract_drowsiness;
use crate::analysis::domain::drowsiness_policy::DrowsinessPolicy;
use crate::analysis::domain::extraction_error::ExtractionError;
use crate::inference::domain::prediction_response::PredictionResponse;

/// Turns an endpoint reply into a verdict: metric extraction followed by
/// the deployment's decision rule.
pub trait Analyzer: Send {
    fn analyze(&self, response: &PredictionResponse) -> Result<Assessment, ExtractionError>;

    /// Neutral verdict used when an iteration fails.
    fn fallback(&self) -> Assessment;
}

pub struct DrowsinessAnalyzer {
    policy: DrowsinessPolicy,
}

impl DrowsinessAnalyzer {
    pub fn new(policy: DrowsinessPolicy) -> Self {
        Self { policy }
    }
}

impl Analyzer for DrowsinessAnalyzer {
    fn analyze(&self, response: &PredictionResponse) -> Result<Assessment, ExtractionError> {
        let extraction = extract_drowsiness(response)?;
        Ok(self.policy.assess(extraction))
    }

    fn fallback(&self) -> Assessment {
        self.policy.no_detection()
    }
}

/// The confidence floor is the whole decision for classification.
pub struct ClassificationAnalyzer {
    confidence_floor: f64,
}

impl ClassificationAnalyzer {
    pub fn new(confidence_floor: f64) -> Self {
        Self { confidence_floor }
    }
}

impl Analyzer for ClassificationAnalyzer {
    fn analyze(&self, response: &PredictionResponse) -> Result<Assessment, ExtractionError> {
        let metrics = match extract_classification(response, self.confidence_floor)? {
            Extraction::Metrics(m) => m,
            Extraction::NoDetection => ClassificationMetrics::none(),
        };
        Ok(Assessment::Classification { metrics })
    }

    fn fallback(&self) -> Assessment {
        Assessment::Classification {
            metrics: ClassificationMetrics::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::assessment::{DrowsinessMetrics, Status};
    use crate::analysis::domain::drowsiness_policy::DrowsinessThresholds;
    use serde_json::json;

    fn drowsiness() -> DrowsinessAnalyzer {
        DrowsinessAnalyzer::new(DrowsinessPolicy::new(DrowsinessThresholds {
            eye: 0.25,
            pitch: 0.0,
        }))
    }

    #[test]
    fn test_drowsiness_empty_response_is_safe_sentinel() {
        let a = drowsiness()
            .analyze(&PredictionResponse::new(json!([])))
            .unwrap();
        assert_eq!(
            a,
            Assessment::Drowsiness {
                metrics: DrowsinessMetrics::sentinel(),
                status: Status::Safe,
                detected: false,
            }
        );
    }

    #[test]
    fn test_drowsiness_fallback_matches_no_detection() {
        let analyzer = drowsiness();
        let empty = analyzer
            .analyze(&PredictionResponse::new(json!([])))
            .unwrap();
        assert_eq!(analyzer.fallback(), empty);
    }

    #[test]
    fn test_drowsiness_malformed_is_error() {
        let result = drowsiness().analyze(&PredictionResponse::new(json!("denied")));
        assert!(result.is_err());
    }

    #[test]
    fn test_classification_reports_label() {
        let analyzer = ClassificationAnalyzer::new(0.8);
        let a = analyzer
            .analyze(&PredictionResponse::new(json!({
                "predictions": [{"probability": 0.95, "tagName": "forklift"}]
            })))
            .unwrap();
        assert_eq!(
            a,
            Assessment::Classification {
                metrics: ClassificationMetrics {
                    label: "forklift".into(),
                    confidence: 0.95
                }
            }
        );
    }

    #[test]
    fn test_classification_no_predictions_reports_none() {
        let analyzer = ClassificationAnalyzer::new(0.8);
        let a = analyzer
            .analyze(&PredictionResponse::new(json!({"predictions": []})))
            .unwrap();
        assert_eq!(a, analyzer.fallback());
    }
}
