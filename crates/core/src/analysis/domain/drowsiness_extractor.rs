use serde::Deserialize;
use serde_json::Value;

use crate::analysis::domain::assessment::{DrowsinessMetrics, Extraction};
use crate::analysis::domain::extraction_error::ExtractionError;
use crate::analysis::domain::eye_landmarks::{round_to, EyeLandmarks, Point};
use crate::inference::domain::prediction_response::PredictionResponse;

const EYE_DECIMALS: i32 = 3;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaceRecord {
    face_landmarks: FaceLandmarksBody,
    face_attributes: FaceAttributes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaceLandmarksBody {
    eye_left_outer: PointBody,
    eye_left_inner: PointBody,
    eye_left_top: PointBody,
    eye_left_bottom: PointBody,
    eye_right_outer: PointBody,
    eye_right_inner: PointBody,
    eye_right_top: PointBody,
    eye_right_bottom: PointBody,
}

#[derive(Deserialize, Clone, Copy)]
struct PointBody {
    x: f64,
    y: f64,
}

impl From<PointBody> for Point {
    fn from(p: PointBody) -> Self {
        (p.x, p.y)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaceAttributes {
    head_pose: HeadPose,
}

#[derive(Deserialize)]
struct HeadPose {
    pitch: f64,
}

impl FaceLandmarksBody {
    fn left_eye(&self) -> EyeLandmarks {
        EyeLandmarks::new(
            self.eye_left_outer.into(),
            self.eye_left_inner.into(),
            self.eye_left_top.into(),
            self.eye_left_bottom.into(),
        )
    }

    fn right_eye(&self) -> EyeLandmarks {
        EyeLandmarks::new(
            self.eye_right_outer.into(),
            self.eye_right_inner.into(),
            self.eye_right_top.into(),
            self.eye_right_bottom.into(),
        )
    }
}

/// Reads eye-aspect-ratio and head pitch from a face API reply.
///
/// Only the first face in the list is used. An empty list means nobody is
/// in view and yields [`Extraction::NoDetection`].
pub fn extract_drowsiness(
    response: &PredictionResponse,
) -> Result<Extraction<DrowsinessMetrics>, ExtractionError> {
    let Value::Array(faces) = response.body() else {
        return Err(ExtractionError::UnexpectedShape("expected a list of faces"));
    };
    let Some(first) = faces.first() else {
        return Ok(Extraction::NoDetection);
    };

    let face = FaceRecord::deserialize(first)?;
    let left = face
        .face_landmarks
        .left_eye()
        .aspect_ratio()
        .ok_or(ExtractionError::DegenerateEye("left"))?;
    let right = face
        .face_landmarks
        .right_eye()
        .aspect_ratio()
        .ok_or(ExtractionError::DegenerateEye("right"))?;

    Ok(Extraction::Metrics(DrowsinessMetrics {
        eye: round_to((left + right) / 2.0, EYE_DECIMALS),
        pitch: face.face_attributes.head_pose.pitch,
    }))
}
