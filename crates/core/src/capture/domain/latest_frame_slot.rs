use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::capture::domain::frame_source::CaptureError;
use crate::shared::frame::Frame;

/// Single-element frame buffer shared by a capture thread and the loop.
///
/// The producer overwrites the slot on every decoded frame; the consumer
/// always reads the newest one. There is no queue: a frame that is replaced
/// before anyone reads it is simply dropped.
pub struct LatestFrameSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

#[derive(Default)]
struct SlotState {
    latest: Option<Arc<Frame>>,
    published: u64,
    failure: Option<String>,
    ended: bool,
}

impl LatestFrameSlot {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::default()),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the current frame.
    pub fn publish(&self, frame: Frame) {
        let mut state = self.lock();
        state.latest = Some(Arc::new(frame));
        state.published += 1;
        self.ready.notify_all();
    }

    /// Records that the producer died. Every later read fails.
    pub fn fail(&self, reason: impl Into<String>) {
        let mut state = self.lock();
        state.failure = Some(reason.into());
        self.ready.notify_all();
    }

    /// Records that the stream finished normally. The last frame stays readable.
    pub fn end(&self) {
        let mut state = self.lock();
        state.ended = true;
        self.ready.notify_all();
    }

    pub fn latest(&self) -> Result<Arc<Frame>, CaptureError> {
        let state = self.lock();
        Self::read(&state)
    }

    /// Blocks until the first frame arrives, the producer fails, or `timeout` passes.
    pub fn wait_for_first(&self, timeout: Duration) -> Result<Arc<Frame>, CaptureError> {
        let state = self.lock();
        let (state, _) = self
            .ready
            .wait_timeout_while(state, timeout, |s| {
                s.latest.is_none() && s.failure.is_none() && !s.ended
            })
            .unwrap_or_else(PoisonError::into_inner);

        match Self::read(&state) {
            Err(CaptureError::NoFrame) if state.ended => Err(CaptureError::Unavailable(
                "stream ended before the first frame".into(),
            )),
            Err(CaptureError::NoFrame) => Err(CaptureError::Unavailable(format!(
                "no frame within {} ms",
                timeout.as_millis()
            ))),
            other => other,
        }
    }

    /// Number of frames published so far, including ones nobody read.
    pub fn published(&self) -> u64 {
        self.lock().published
    }

    pub fn has_ended(&self) -> bool {
        self.lock().ended
    }

    fn read(state: &SlotState) -> Result<Arc<Frame>, CaptureError> {
        if let Some(reason) = &state.failure {
            return Err(CaptureError::Unavailable(reason.clone()));
        }
        state.latest.clone().ok_or(CaptureError::NoFrame)
    }
}

impl Default for LatestFrameSlot {
    fn default() -> Self {
        Self::new()
    }
}
