pub mod http_transport;
pub mod stdout_transport;
