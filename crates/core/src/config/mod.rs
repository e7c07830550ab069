pub mod monitor_config;
pub mod settings;
