pub mod delivery;
pub mod event;
pub mod message_transport;
pub mod outcome_sink;
