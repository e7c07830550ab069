use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use edgewatch_core::analysis::domain::analyzer::{
    Analyzer, ClassificationAnalyzer, DrowsinessAnalyzer,
};
use edgewatch_core::analysis::domain::drowsiness_policy::DrowsinessPolicy;
use edgewatch_core::capture::domain::frame_source::FrameSource;
use edgewatch_core::capture::infrastructure::ffmpeg_capture_source::FfmpegCaptureSource;
use edgewatch_core::capture::infrastructure::still_image_source::{
    is_still_image, StillImageSource,
};
use edgewatch_core::config::monitor_config::{AnalysisConfig, MonitorConfig, SinkConfig};
use edgewatch_core::config::settings::{legacy_endpoint, Settings, SinkKind, Variant};
use edgewatch_core::inference::infrastructure::http_inference_client::HttpInferenceClient;
use edgewatch_core::inference::infrastructure::jpeg_encoder::JpegEncoder;
use edgewatch_core::pipeline::monitor_loop::{FailurePolicy, LoopOptions, MonitorLoop};
use edgewatch_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use edgewatch_core::publishing::domain::event::PayloadMode;
use edgewatch_core::publishing::domain::message_transport::MessageTransport;
use edgewatch_core::publishing::event_publisher::{EventPublisher, PublisherOptions};
use edgewatch_core::publishing::infrastructure::http_transport::HttpTransport;
use edgewatch_core::publishing::infrastructure::stdout_transport::StdoutTransport;
use edgewatch_core::shared::clock::SystemClock;
use edgewatch_core::shared::constants::PUBLISH_QUEUE_CAPACITY;

/// Captures camera frames, classifies them through a remote vision
/// endpoint, and publishes one event per frame.
#[derive(Parser)]
#[command(name = "edgewatch", version)]
struct Cli {
    /// Analysis to run: drowsiness or classification.
    #[arg(long, env = "EDGEWATCH_VARIANT")]
    variant: Option<Variant>,

    /// Camera device (/dev/video0 or 0), stream URI, video file or still image.
    #[arg(long, env = "videosource")]
    video_source: Option<String>,

    /// Inference endpoint URL.
    #[arg(long)]
    endpoint: Option<String>,

    /// Face API endpoint used by the drowsiness variant.
    #[arg(long, env = "faceapi", hide = true)]
    face_api: Option<String>,

    /// Classifier endpoint used by the classification variant.
    #[arg(long, env = "classifierapi", hide = true)]
    classifier_api: Option<String>,

    /// Eye-aspect-ratio below which the eyes count as closing.
    #[arg(long, env = "eyethres", allow_negative_numbers = true)]
    eye_threshold: Option<f64>,

    /// Head pitch below which the head counts as drooping.
    #[arg(long, env = "pitchthres", allow_negative_numbers = true)]
    pitch_threshold: Option<f64>,

    /// Minimum probability for a classification to be reported (0.0-1.0).
    #[arg(long, env = "confidencefloor")]
    confidence_floor: Option<f64>,

    /// Extra request header for the endpoint, as NAME:VALUE. Repeatable.
    #[arg(long = "header", value_name = "NAME:VALUE")]
    headers: Vec<String>,

    /// Inference request timeout in milliseconds (default 5000).
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Pause between iterations in milliseconds (default 250 / 10 by variant).
    #[arg(long)]
    delay_ms: Option<u64>,

    /// JPEG quality of uploaded frames, 1-100 (default 90).
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Time allowed for the camera's first frame in milliseconds (default 2000).
    #[arg(long)]
    warmup_ms: Option<u64>,

    /// On inference failure: fallback (publish a neutral event) or skip.
    #[arg(long)]
    on_failure: Option<FailurePolicy>,

    /// Classification events: prediction or placeholder.
    #[arg(long)]
    payload: Option<PayloadMode>,

    /// Event sink: stdout or http.
    #[arg(long)]
    sink: Option<SinkKind>,

    /// URL events are POSTed to when --sink http.
    #[arg(long, env = "EDGEWATCH_SINK_URL")]
    sink_url: Option<String>,

    /// Extra request header for the sink, as NAME:VALUE. Repeatable.
    #[arg(long = "sink-header", value_name = "NAME:VALUE")]
    sink_headers: Vec<String>,

    /// Queued events older than this many milliseconds are dropped (default 10000).
    #[arg(long)]
    message_timeout_ms: Option<u64>,

    /// Stop after this many iterations instead of running until interrupted.
    #[arg(long)]
    iterations: Option<u64>,

    /// JSON settings file (default: <config dir>/edgewatch/config.json if present).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = load_config(cli)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::Relaxed))?;
    }

    let publisher = EventPublisher::start(
        build_transport(&config)?,
        PublisherOptions {
            message_timeout: config.message_timeout,
            queue_capacity: PUBLISH_QUEUE_CAPACITY,
            payload_mode: config.payload_mode,
        },
    );
    let client = HttpInferenceClient::new(
        &config.endpoint,
        &config.headers,
        config.request_timeout,
        Box::new(JpegEncoder::new(config.jpeg_quality)),
    )?;
    log::info!("Starting {} monitor against {}", config.variant, client.endpoint());
    let source = open_source(&config)?;

    let mut monitor = MonitorLoop::new(
        source,
        Box::new(client),
        build_analyzer(&config.analysis),
        Box::new(publisher),
        Box::new(SystemClock),
        Box::new(StdoutPipelineLogger::default()),
        LoopOptions {
            delay: config.delay,
            failure_policy: config.failure_policy,
        },
    );

    let result = monitor.run(&shutdown, config.iterations);
    let delivery = monitor.finish();
    let completed = result?;
    log::info!(
        "Stopped after {completed} iterations, {} events delivered",
        delivery.delivered
    );
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &cli.config {
        if !path.is_file() {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
    }
    if cli.sink == Some(SinkKind::Stdout) && cli.sink_url.is_some() {
        log::warn!("--sink-url is ignored with --sink stdout");
    }
    Ok(())
}

/// Stacks command line and environment over the settings file.
fn load_config(cli: Cli) -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    let file = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default()?,
    };

    let variant = cli.variant.or(file.variant);
    let endpoint = cli
        .endpoint
        .or_else(|| legacy_endpoint(variant, cli.face_api, cli.classifier_api));

    let overrides = Settings {
        variant: cli.variant,
        video_source: cli.video_source,
        endpoint,
        eye_threshold: cli.eye_threshold,
        pitch_threshold: cli.pitch_threshold,
        confidence_floor: cli.confidence_floor,
        headers: cli.headers,
        timeout_ms: cli.timeout_ms,
        delay_ms: cli.delay_ms,
        jpeg_quality: cli.jpeg_quality,
        warmup_ms: cli.warmup_ms,
        on_failure: cli.on_failure,
        payload: cli.payload,
        sink: cli.sink,
        sink_url: cli.sink_url,
        sink_headers: cli.sink_headers,
        message_timeout_ms: cli.message_timeout_ms,
        iterations: cli.iterations,
    };

    Ok(MonitorConfig::from_settings(overrides.merged_over(file))?)
}

fn open_source(config: &MonitorConfig) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    if is_still_image(&config.video_source) {
        Ok(Box::new(StillImageSource::open(Path::new(
            &config.video_source,
        ))?))
    } else {
        Ok(Box::new(FfmpegCaptureSource::open(
            &config.video_source,
            config.warmup,
        )?))
    }
}

fn build_analyzer(analysis: &AnalysisConfig) -> Box<dyn Analyzer> {
    match analysis {
        AnalysisConfig::Drowsiness(thresholds) => {
            Box::new(DrowsinessAnalyzer::new(DrowsinessPolicy::new(*thresholds)))
        }
        AnalysisConfig::Classification { confidence_floor } => {
            Box::new(ClassificationAnalyzer::new(*confidence_floor))
        }
    }
}

fn build_transport(
    config: &MonitorConfig,
) -> Result<Box<dyn MessageTransport>, Box<dyn std::error::Error>> {
    match &config.sink {
        SinkConfig::Stdout => Ok(Box::new(StdoutTransport::stdout())),
        SinkConfig::Http { url, headers } => Ok(Box::new(HttpTransport::new(
            url,
            headers,
            config.request_timeout,
        )?)),
    }
}
