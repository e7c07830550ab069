pub mod clock;
pub mod constants;
pub mod frame;
pub mod headers;
pub mod outcome;
