use serde::Deserialize;

use crate::analysis::domain::assessment::{ClassificationMetrics, Extraction};
use crate::analysis::domain::extraction_error::ExtractionError;
use crate::inference::domain::prediction_response::PredictionResponse;

/// One tag scored by the classifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub probability: f64,
    pub tag_name: String,
}

impl Prediction {
    pub fn new(tag_name: &str, probability: f64) -> Self {
        Self {
            probability,
            tag_name: tag_name.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ClassificationBody {
    predictions: Vec<Prediction>,
}

/// Highest-probability prediction. Ties keep the earliest entry.
pub fn top_prediction(predictions: &[Prediction]) -> Option<&Prediction> {
    let mut best: Option<&Prediction> = None;
    for p in predictions {
        if best.map_or(true, |b| p.probability > b.probability) {
            best = Some(p);
        }
    }
    best
}

/// Picks the top prediction and discards it unless it clears `floor`.
///
/// A probability equal to the floor does not clear it.
pub fn select_top(predictions: &[Prediction], floor: f64) -> ClassificationMetrics {
    match top_prediction(predictions) {
        Some(p) if p.probability > floor => ClassificationMetrics {
            label: p.tag_name.clone(),
            confidence: p.probability,
        },
        _ => ClassificationMetrics::none(),
    }
}

/// Reads the best label from a classifier reply.
///
/// An empty prediction list yields [`Extraction::NoDetection`]; a list whose
/// best entry is below the floor yields `("none", 0)` metrics.
pub fn extract_classification(
    response: &PredictionResponse,
    floor: f64,
) -> Result<Extraction<ClassificationMetrics>, ExtractionError> {
    if !response.body().is_object() {
        return Err(ExtractionError::UnexpectedShape(
            "expected an object with a predictions list",
        ));
    }
    let body: ClassificationBody = response.parse()?;
    if body.predictions.is_empty() {
        return Ok(Extraction::NoDetection);
    }
    Ok(Extraction::Metrics(select_top(&body.predictions, floor)))
}
