pub mod analyzer;
pub mod assessment;
pub mod classification_extractor;
pub mod drowsiness_extractor;
pub mod drowsiness_policy;
pub mod extraction_error;
pub mod eye_landmarks;
