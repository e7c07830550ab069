use std::collections::HashMap;
use std::time::Instant;

use crate::publishing::domain::delivery::DeliverySnapshot;

/// Observer for monitor loop events.
///
/// Keeps the loop free of output concerns: the CLI collects stage timings
/// and prints a summary on shutdown, tests discard everything.
pub trait PipelineLogger: Send {
    /// Called after each completed iteration with the running count.
    fn iteration(&mut self, count: u64);

    /// Record how long a named stage took for one iteration.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. frame age).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Final delivery counters from the publisher. Default: ignored.
    fn delivery(&mut self, _snapshot: &DeliverySnapshot) {}

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn iteration(&mut self, _count: u64) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Collects per-stage timings and metrics and logs a summary when the
/// monitor stops. A heartbeat line is logged every `heartbeat` iterations.
pub struct StdoutPipelineLogger {
    heartbeat: u64,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    iterations: u64,
    delivery: Option<DeliverySnapshot>,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(heartbeat: u64) -> Self {
        Self {
            heartbeat: heartbeat.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            iterations: 0,
            delivery: None,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() && self.delivery.is_none() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let iterations = self.iterations;
        let mut lines = vec![format!(
            "Monitor summary ({iterations} iterations, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let max_ms = durations.iter().copied().fold(0.0, f64::max);
            lines.push(format!(
                "  {stage:10}: avg {:6.1}ms  max {max_ms:6.1}ms",
                mean(durations)
            ));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            lines.push(format!("  {name}: avg {:.1}", mean(&self.metrics[name])));
        }

        if iterations > 0 && elapsed_ms > 0.0 {
            let rate = iterations as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {rate:.2} iterations/s"));
        }

        if let Some(d) = &self.delivery {
            lines.push(format!(
                "  Delivery: {} delivered, {} failed, {} expired, {} dropped",
                d.delivered, d.failed, d.expired, d.dropped
            ));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn iteration(&mut self, count: u64) {
        self.iterations = count;
        if count % self.heartbeat == 0 {
            log::info!("{count} iterations completed");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn delivery(&mut self, snapshot: &DeliverySnapshot) {
        self.delivery = Some(*snapshot);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
