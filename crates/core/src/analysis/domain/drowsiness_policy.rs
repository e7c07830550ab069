use crate::analysis::domain::assessment::{Assessment, DrowsinessMetrics, Extraction, Status};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrowsinessThresholds {
    pub eye: f64,
    pub pitch: f64,
}

/// Conjunctive drowsiness rule: a reading is a warning only when the eyes
/// are closing *and* the head is pitched down. Either signal alone is safe.
#[derive(Debug, Clone, Copy)]
pub struct DrowsinessPolicy {
    thresholds: DrowsinessThresholds,
}

impl DrowsinessPolicy {
    pub fn new(thresholds: DrowsinessThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> DrowsinessThresholds {
        self.thresholds
    }

    /// Both comparisons are strict: a value equal to its threshold is safe.
    pub fn classify(&self, metrics: &DrowsinessMetrics) -> Status {
        if metrics.eye < self.thresholds.eye && metrics.pitch < self.thresholds.pitch {
            Status::Warning
        } else {
            Status::Safe
        }
    }

    /// Nobody in view: report the sentinel pair as safe. The status is fixed
    /// and does not go through [`classify`](Self::classify), so thresholds
    /// above the sentinel still yield `Safe` here.
    pub fn no_detection(&self) -> Assessment {
        Assessment::Drowsiness {
            metrics: DrowsinessMetrics::sentinel(),
            status: Status::Safe,
            detected: false,
        }
    }

    pub fn assess(&self, extraction: Extraction<DrowsinessMetrics>) -> Assessment {
        match extraction {
            Extraction::Metrics(metrics) => Assessment::Drowsiness {
                status: self.classify(&metrics),
                metrics,
                detected: true,
            },
            Extraction::NoDetection => self.no_detection(),
        }
    }
}
