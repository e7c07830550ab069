use chrono::NaiveTime;

use crate::analysis::domain::assessment::Assessment;

/// Everything one iteration produced, handed to the publisher and then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub timestamp: NaiveTime,
    pub assessment: Assessment,
    /// Wall-clock time of the infer + extract + decide span.
    pub latency_ms: u64,
}
