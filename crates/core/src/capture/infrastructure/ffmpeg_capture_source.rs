use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use ffmpeg_next::format::context::Input;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

use crate::capture::domain::frame_source::{CaptureError, FrameSource};
use crate::capture::domain::latest_frame_slot::LatestFrameSlot;
use crate::shared::constants::CAPTURE_STOP_TIMEOUT;
use crate::shared::frame::Frame;

const LIVE_SCHEMES: &[&str] = &["rtsp", "rtsps", "rtmp", "http", "https", "udp", "tcp", "srt"];

/// Camera or stream capture on a background thread via ffmpeg-next.
///
/// The thread decodes continuously to RGB24 and overwrites a
/// [`LatestFrameSlot`]; reads never wait for the decoder. Accepts a V4L2
/// device (`/dev/video0` or just `0`), a network stream URI, or a video
/// file. Files are replayed at their native frame rate so they behave like
/// a camera, and once they end the last frame keeps being served.
///
/// Network reads give up after the warm-up period without data, so a
/// stalled or unreachable camera ends the thread instead of blocking it.
pub struct FfmpegCaptureSource {
    uri: String,
    slot: Arc<LatestFrameSlot>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    exited: Receiver<()>,
    last_index: Option<u64>,
    reported_end: bool,
}

impl FfmpegCaptureSource {
    /// Starts capturing and waits up to `warmup` for the first frame.
    pub fn open(uri: &str, warmup: Duration) -> Result<Self, CaptureError> {
        let slot = Arc::new(LatestFrameSlot::new());
        let stop = Arc::new(AtomicBool::new(false));

        // Never sent on; the sender dropping marks the thread as finished.
        let (exit_tx, exited) = crossbeam_channel::bounded::<()>(0);

        let worker = {
            let thread_uri = uri.to_string();
            let slot = slot.clone();
            let stop = stop.clone();
            thread::Builder::new()
                .name("capture".into())
                .spawn(move || {
                    let _exit_tx = exit_tx;
                    match capture_loop(&thread_uri, warmup, &slot, &stop) {
                        Ok(()) => slot.end(),
                        Err(e) => {
                            log::error!("Capture from {thread_uri} stopped: {e}");
                            slot.fail(e.to_string());
                        }
                    }
                })
                .map_err(|e| CaptureError::Open {
                    source_name: uri.to_string(),
                    reason: e.to_string(),
                })?
        };

        let source = Self {
            uri: uri.to_string(),
            slot,
            stop,
            worker: Some(worker),
            exited,
            last_index: None,
            reported_end: false,
        };

        let first = source.slot.wait_for_first(warmup)?;
        log::info!(
            "Camera initialized: {} ({}x{})",
            source.uri,
            first.width(),
            first.height()
        );
        Ok(source)
    }

    /// Frames decoded so far, including ones never read.
    pub fn frames_decoded(&self) -> u64 {
        self.slot.published()
    }
}

impl FrameSource for FfmpegCaptureSource {
    fn read_frame(&mut self) -> Result<Arc<Frame>, CaptureError> {
        let frame = self.slot.latest()?;

        if self.last_index == Some(frame.index()) {
            if self.slot.has_ended() && !self.reported_end {
                log::warn!("Video source {} ended; reusing its last frame", self.uri);
                self.reported_end = true;
            } else {
                log::debug!("Frame {} reused (camera slower than loop)", frame.index());
            }
        } else if let Some(prev) = self.last_index {
            let skipped = frame.index().saturating_sub(prev + 1);
            if skipped > 0 {
                log::trace!("Dropped {skipped} stale frames");
            }
        }
        self.last_index = Some(frame.index());
        Ok(frame)
    }

    fn describe(&self) -> String {
        self.uri.clone()
    }
}

impl Drop for FfmpegCaptureSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let Some(worker) = self.worker.take() else {
            return;
        };
        match self.exited.recv_timeout(CAPTURE_STOP_TIMEOUT) {
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Capture thread for {} still blocked after {} ms; detaching it",
                    self.uri,
                    CAPTURE_STOP_TIMEOUT.as_millis()
                );
            }
            _ => {
                let _ = worker.join();
            }
        }
    }
}

/// Sleeps between frames so file sources are replayed in real time.
struct Pacing {
    interval: Option<Duration>,
    next_due: Instant,
}

impl Pacing {
    fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            next_due: Instant::now(),
        }
    }

    fn wait(&mut self) {
        let Some(interval) = self.interval else {
            return;
        };
        self.next_due += interval;
        let now = Instant::now();
        if self.next_due > now {
            thread::sleep(self.next_due - now);
        } else {
            self.next_due = now;
        }
    }
}

/// Decoder plus RGB24 conversion for one video stream.
struct RgbDecoder {
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    width: u32,
    height: u32,
    next_index: u64,
}

impl RgbDecoder {
    /// Publishes every frame the decoder has ready.
    fn drain(
        &mut self,
        slot: &LatestFrameSlot,
        pacing: &mut Pacing,
        stop: &AtomicBool,
    ) -> Result<(), CaptureError> {
        let mut decoded = Video::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let mut rgb = Video::empty();
            self.scaler
                .run(&decoded, &mut rgb)
                .map_err(|e| CaptureError::Unavailable(format!("pixel conversion failed: {e}")))?;
            let pixels = extract_rgb_pixels(&rgb, self.width, self.height);
            slot.publish(Frame::new(
                pixels,
                self.width,
                self.height,
                3,
                self.next_index,
            ));
            self.next_index += 1;
            if stop.load(Ordering::Relaxed) {
                return Ok(());
            }
            pacing.wait();
        }
        Ok(())
    }
}

fn capture_loop(
    uri: &str,
    io_timeout: Duration,
    slot: &LatestFrameSlot,
    stop: &AtomicBool,
) -> Result<(), CaptureError> {
    let open_error = |reason: String| CaptureError::Open {
        source_name: uri.to_string(),
        reason,
    };

    ffmpeg_next::init().map_err(|e| open_error(e.to_string()))?;
    let mut ictx = open_input(uri, io_timeout).map_err(|e| open_error(e.to_string()))?;

    let (stream_index, decoder, interval) = {
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| open_error("no video stream found".into()))?;
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| open_error(e.to_string()))?;
        let decoder = codec_ctx
            .decoder()
            .video()
            .map_err(|e| open_error(e.to_string()))?;
        let interval = if is_live(uri) {
            None
        } else {
            frame_interval(stream.rate())
        };
        (stream.index(), decoder, interval)
    };

    let width = decoder.width();
    let height = decoder.height();
    let scaler = scaling::Context::get(
        decoder.format(),
        width,
        height,
        Pixel::RGB24,
        width,
        height,
        scaling::Flags::BILINEAR,
    )
    .map_err(|e| open_error(e.to_string()))?;

    let mut rgb = RgbDecoder {
        decoder,
        scaler,
        width,
        height,
        next_index: 0,
    };
    let mut pacing = Pacing::new(interval);

    for (stream, packet) in ictx.packets() {
        if stop.load(Ordering::Relaxed) {
            return Ok(());
        }
        if stream.index() != stream_index {
            continue;
        }
        if let Err(e) = rgb.decoder.send_packet(&packet) {
            log::debug!("Skipping undecodable packet: {e}");
            continue;
        }
        rgb.drain(slot, &mut pacing, stop)?;
    }

    let _ = rgb.decoder.send_eof();
    rgb.drain(slot, &mut pacing, stop)?;

    if rgb.next_index == 0 {
        return Err(CaptureError::Unavailable(format!(
            "{uri} produced no frames"
        )));
    }
    log::info!("Video source {uri} ended after {} frames", rgb.next_index);
    Ok(())
}

fn open_input(uri: &str, io_timeout: Duration) -> Result<Input, ffmpeg_next::Error> {
    if let Some(device) = device_path(uri) {
        ffmpeg_next::device::register_all();
        let v4l2 = ffmpeg_next::device::input::video().find(|f| f.name() == "v4l2");
        if let Some(format) = v4l2 {
            return ffmpeg_next::format::open_with(
                &device,
                &ffmpeg_next::format::format::Format::Input(format),
                ffmpeg_next::Dictionary::new(),
            )
            .map(|ctx| ctx.input());
        }
        return ffmpeg_next::format::input(&device);
    }
    if is_live(uri) {
        ffmpeg_next::format::network::init();
        return ffmpeg_next::format::input_with_dictionary(uri, network_options(uri, io_timeout));
    }
    ffmpeg_next::format::input(uri)
}

/// Socket timeouts for network inputs, in microseconds as libavformat expects.
fn network_options(uri: &str, io_timeout: Duration) -> ffmpeg_next::Dictionary<'static> {
    let micros = io_timeout.as_micros().max(1).to_string();
    let mut options = ffmpeg_next::Dictionary::new();
    options.set("rw_timeout", &micros);
    if scheme(uri).is_some_and(|s| s.starts_with("rtsp")) {
        options.set("timeout", &micros);
    }
    options
}

fn scheme(uri: &str) -> Option<String> {
    uri.split_once("://")
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
}

/// Maps `/dev/videoN` or a bare device index to a device path.
fn device_path(uri: &str) -> Option<String> {
    if !uri.is_empty() && uri.chars().all(|c| c.is_ascii_digit()) {
        return Some(format!("/dev/video{uri}"));
    }
    let suffix = uri.strip_prefix("/dev/video")?;
    if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
        Some(uri.to_string())
    } else {
        None
    }
}

fn is_live(uri: &str) -> bool {
    if device_path(uri).is_some() {
        return true;
    }
    scheme(uri).is_some_and(|s| LIVE_SCHEMES.contains(&s.as_str()))
}

fn frame_interval(rate: ffmpeg_next::Rational) -> Option<Duration> {
    if rate.numerator() <= 0 || rate.denominator() <= 0 {
        return None;
    }
    Some(Duration::from_secs_f64(
        rate.denominator() as f64 / rate.numerator() as f64,
    ))
}

/// Copies RGB24 rows into a tightly packed buffer, dropping stride padding.
fn extract_rgb_pixels(rgb: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
