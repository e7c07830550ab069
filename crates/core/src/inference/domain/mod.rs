pub mod frame_encoder;
pub mod inference_client;
pub mod prediction_response;
