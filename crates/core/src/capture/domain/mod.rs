pub mod frame_source;
pub mod latest_frame_slot;
