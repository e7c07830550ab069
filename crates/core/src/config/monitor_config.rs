use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::analysis::domain::drowsiness_policy::DrowsinessThresholds;
use crate::config::settings::{Settings, SinkKind, Variant};
use crate::pipeline::monitor_loop::FailurePolicy;
use crate::publishing::domain::event::PayloadMode;
use crate::shared::constants::{
    CLASSIFICATION_ITERATION_DELAY, DEFAULT_CONFIDENCE_FLOOR, DEFAULT_JPEG_QUALITY,
    DEFAULT_MESSAGE_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_WARMUP,
    DROWSINESS_ITERATION_DELAY,
};
use crate::shared::headers::{parse_header, HeaderError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("{name} must be a finite number, got {value}")]
    NotFinite { name: &'static str, value: f64 },
    #[error("confidence floor must be within [0, 1], got {0}")]
    ConfidenceFloor(f64),
    #[error("JPEG quality must be within 1..=100, got {0}")]
    JpegQuality(u8),
    #[error("iterations must be at least 1")]
    ZeroIterations,
    #[error("invalid header: {0}")]
    Header(#[from] HeaderError),
}

/// Variant-specific decision settings.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisConfig {
    Drowsiness(DrowsinessThresholds),
    Classification { confidence_floor: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkConfig {
    Stdout,
    Http {
        url: String,
        headers: Vec<(String, String)>,
    },
}

/// Validated, immutable configuration for one monitor run.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub variant: Variant,
    pub video_source: String,
    pub endpoint: String,
    pub headers: Vec<(String, String)>,
    pub analysis: AnalysisConfig,
    pub request_timeout: Duration,
    pub delay: Duration,
    pub jpeg_quality: u8,
    pub warmup: Duration,
    pub failure_policy: FailurePolicy,
    pub payload_mode: PayloadMode,
    pub sink: SinkConfig,
    pub message_timeout: Duration,
    pub iterations: Option<u64>,
}

impl MonitorConfig {
    /// Validates a fully merged settings stack and fills in defaults.
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let variant = settings.variant.ok_or(ConfigError::Missing("variant"))?;
        let video_source =
            non_empty(settings.video_source).ok_or(ConfigError::Missing("video source"))?;
        let endpoint = non_empty(settings.endpoint).ok_or(ConfigError::Missing("endpoint"))?;

        let analysis = match variant {
            Variant::Drowsiness => AnalysisConfig::Drowsiness(DrowsinessThresholds {
                eye: finite(
                    "eye threshold",
                    settings.eye_threshold.ok_or(ConfigError::Missing("eye threshold"))?,
                )?,
                pitch: finite(
                    "pitch threshold",
                    settings
                        .pitch_threshold
                        .ok_or(ConfigError::Missing("pitch threshold"))?,
                )?,
            }),
            Variant::Classification => {
                let floor = settings.confidence_floor.unwrap_or(DEFAULT_CONFIDENCE_FLOOR);
                if !(0.0..=1.0).contains(&floor) {
                    return Err(ConfigError::ConfidenceFloor(floor));
                }
                AnalysisConfig::Classification {
                    confidence_floor: floor,
                }
            }
        };

        let jpeg_quality = settings.jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY);
        if !(1..=100).contains(&jpeg_quality) {
            return Err(ConfigError::JpegQuality(jpeg_quality));
        }

        if settings.iterations == Some(0) {
            return Err(ConfigError::ZeroIterations);
        }

        let sink = match settings.sink.unwrap_or_default() {
            SinkKind::Stdout => SinkConfig::Stdout,
            SinkKind::Http => SinkConfig::Http {
                url: non_empty(settings.sink_url).ok_or(ConfigError::Missing("sink URL"))?,
                headers: parse_headers(&settings.sink_headers)?,
            },
        };

        let default_delay = match variant {
            Variant::Drowsiness => DROWSINESS_ITERATION_DELAY,
            Variant::Classification => CLASSIFICATION_ITERATION_DELAY,
        };

        Ok(Self {
            variant,
            video_source,
            endpoint,
            headers: parse_headers(&settings.headers)?,
            analysis,
            request_timeout: millis_or(settings.timeout_ms, DEFAULT_REQUEST_TIMEOUT),
            delay: millis_or(settings.delay_ms, default_delay),
            jpeg_quality,
            warmup: millis_or(settings.warmup_ms, DEFAULT_WARMUP),
            failure_policy: settings.on_failure.unwrap_or_default(),
            payload_mode: settings.payload.unwrap_or_default(),
            sink,
            message_timeout: millis_or(settings.message_timeout_ms, DEFAULT_MESSAGE_TIMEOUT),
            iterations: settings.iterations,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn finite(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NotFinite { name, value })
    }
}

fn millis_or(value: Option<u64>, default: Duration) -> Duration {
    value.map(Duration::from_millis).unwrap_or(default)
}

fn parse_headers(raw: &[String]) -> Result<Vec<(String, String)>, ConfigError> {
    raw.iter()
        .map(|h| parse_header(h).map_err(ConfigError::from))
        .collect()
}
