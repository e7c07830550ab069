pub mod domain;
pub mod event_publisher;
pub mod infrastructure;
