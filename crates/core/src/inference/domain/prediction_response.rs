use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parsed body of an inference endpoint reply.
///
/// Kept as a generic JSON tree: the face API answers with a list of face
/// records while the classifier answers with an object holding a
/// `predictions` list, and each analyzer reads the shape it expects.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionResponse {
    body: Value,
}

impl PredictionResponse {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes).map(Self::new)
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Deserializes the whole body into a typed view.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }
}
