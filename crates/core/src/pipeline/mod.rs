pub mod monitor_loop;
pub mod pipeline_logger;
