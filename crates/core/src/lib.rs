pub mod analysis;
pub mod capture;
pub mod config;
pub mod inference;
pub mod pipeline;
pub mod publishing;
pub mod shared;
