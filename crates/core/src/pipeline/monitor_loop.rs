use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::domain::analyzer::Analyzer;
use crate::analysis::domain::assessment::Assessment;
use crate::analysis::domain::extraction_error::ExtractionError;
use crate::capture::domain::frame_source::{CaptureError, FrameSource};
use crate::inference::domain::inference_client::{InferenceClient, InferenceError};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::publishing::domain::delivery::DeliverySnapshot;
use crate::publishing::domain::outcome_sink::OutcomeSink;
use crate::shared::clock::Clock;
use crate::shared::frame::Frame;
use crate::shared::outcome::Outcome;

/// Longest single sleep between shutdown checks.
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

/// What to publish when inference or extraction fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Publish the variant's neutral outcome.
    #[default]
    Fallback,
    /// Publish nothing for the failed iteration.
    Skip,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fallback" => Ok(FailurePolicy::Fallback),
            "skip" => Ok(FailurePolicy::Skip),
            _ => Err(format!(
                "unknown failure policy '{s}', expected 'fallback' or 'skip'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoopOptions {
    pub delay: Duration,
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    Assessed(Outcome),
    /// The iteration failed and the neutral outcome was published instead.
    Fallback(Outcome),
    Skipped,
}

#[derive(Error, Debug)]
enum IterationError {
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("malformed response: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Drives capture → inference → analysis → publish, one frame at a time.
///
/// Inference and extraction failures are contained within their iteration
/// and handled per [`FailurePolicy`]. Capture failures end the loop.
pub struct MonitorLoop {
    source: Box<dyn FrameSource>,
    client: Box<dyn InferenceClient>,
    analyzer: Box<dyn Analyzer>,
    sink: Box<dyn OutcomeSink>,
    clock: Box<dyn Clock>,
    logger: Box<dyn PipelineLogger>,
    options: LoopOptions,
    iterations: u64,
    last_frame: Option<u64>,
}

impl MonitorLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Box<dyn FrameSource>,
        client: Box<dyn InferenceClient>,
        analyzer: Box<dyn Analyzer>,
        sink: Box<dyn OutcomeSink>,
        clock: Box<dyn Clock>,
        logger: Box<dyn PipelineLogger>,
        options: LoopOptions,
    ) -> Self {
        Self {
            source,
            client,
            analyzer,
            sink,
            clock,
            logger,
            options,
            iterations: 0,
            last_frame: None,
        }
    }

    /// Runs one iteration.
    pub fn step(&mut self) -> Result<StepResult, CaptureError> {
        let frame = self.source.read_frame()?;
        if self.last_frame == Some(frame.index()) {
            log::debug!("Frame {} is stale, analyzing it again", frame.index());
        }
        self.last_frame = Some(frame.index());
        self.logger
            .metric("frame_age_ms", frame.age().as_secs_f64() * 1000.0);

        let start = Instant::now();
        let verdict = self.assess(&frame);
        let latency_ms = start.elapsed().as_millis() as u64;
        self.logger.timing("iteration", latency_ms as f64);

        let result = match verdict {
            Ok(assessment) => {
                log::info!("[{latency_ms} ms] {assessment}");
                StepResult::Assessed(self.outcome(assessment, latency_ms))
            }
            Err(e) => {
                log::warn!("[{latency_ms} ms] iteration {} failed: {e}", self.iterations + 1);
                match self.options.failure_policy {
                    FailurePolicy::Fallback => {
                        let neutral = self.analyzer.fallback();
                        StepResult::Fallback(self.outcome(neutral, latency_ms))
                    }
                    FailurePolicy::Skip => StepResult::Skipped,
                }
            }
        };

        if let StepResult::Assessed(outcome) | StepResult::Fallback(outcome) = &result {
            if let Err(e) = self.sink.publish(outcome) {
                log::warn!("Event not published: {e}");
            }
        }

        self.iterations += 1;
        self.logger.iteration(self.iterations);
        Ok(result)
    }

    /// Repeats [`step`](Self::step) until `shutdown` is set or
    /// `max_iterations` have run. Returns the number of iterations completed.
    pub fn run(
        &mut self,
        shutdown: &AtomicBool,
        max_iterations: Option<u64>,
    ) -> Result<u64, CaptureError> {
        self.logger.info(&format!(
            "Monitoring {} every {} ms",
            self.source.describe(),
            self.options.delay.as_millis()
        ));

        let mut completed = 0;
        while !shutdown.load(Ordering::Relaxed) {
            if max_iterations.is_some_and(|max| completed >= max) {
                break;
            }
            self.step()?;
            completed += 1;
            if max_iterations.is_some_and(|max| completed >= max) {
                break;
            }
            pause(self.options.delay, shutdown);
        }

        if shutdown.load(Ordering::Relaxed) {
            self.logger.info("Shutdown requested, stopping monitor");
        }
        Ok(completed)
    }

    /// Flushes the sink, records its delivery counters and logs the summary.
    pub fn finish(mut self) -> DeliverySnapshot {
        let snapshot = self.sink.drain();
        self.logger.delivery(&snapshot);
        self.logger.summary();
        snapshot
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    fn assess(&mut self, frame: &Frame) -> Result<Assessment, IterationError> {
        let t = Instant::now();
        let response = self.client.infer(frame)?;
        self.logger.timing("infer", t.elapsed().as_secs_f64() * 1000.0);

        let t = Instant::now();
        let assessment = self.analyzer.analyze(&response)?;
        self.logger.timing("analyze", t.elapsed().as_secs_f64() * 1000.0);
        Ok(assessment)
    }

    fn outcome(&self, assessment: Assessment, latency_ms: u64) -> Outcome {
        Outcome {
            timestamp: self.clock.now(),
            assessment,
            latency_ms,
        }
    }
}

/// Sleeps for `delay`, waking early if shutdown is requested.
fn pause(delay: Duration, shutdown: &AtomicBool) {
    let deadline = Instant::now() + delay;
    loop {
        let now = Instant::now();
        if now >= deadline || shutdown.load(Ordering::Relaxed) {
            return;
        }
        thread::sleep((deadline - now).min(SHUTDOWN_POLL));
    }
}
