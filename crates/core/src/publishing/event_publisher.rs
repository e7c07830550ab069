use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::publishing::domain::delivery::{
    DeliveryReport, DeliveryResult, DeliverySnapshot, DeliveryStats,
};
use crate::publishing::domain::event::{EventPayload, PayloadMode};
use crate::publishing::domain::message_transport::MessageTransport;
use crate::publishing::domain::outcome_sink::{OutcomeSink, PublishError};
use crate::shared::constants::{DEFAULT_MESSAGE_TIMEOUT, PUBLISH_QUEUE_CAPACITY};
use crate::shared::outcome::Outcome;

/// Reports kept for subscribers before new ones are discarded.
const ACK_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct PublisherOptions {
    pub message_timeout: Duration,
    pub queue_capacity: usize,
    pub payload_mode: PayloadMode,
}

impl Default for PublisherOptions {
    fn default() -> Self {
        Self {
            message_timeout: DEFAULT_MESSAGE_TIMEOUT,
            queue_capacity: PUBLISH_QUEUE_CAPACITY,
            payload_mode: PayloadMode::default(),
        }
    }
}

struct Envelope {
    context: u64,
    body: String,
    enqueued_at: Instant,
}

/// Fire-and-forget event publisher.
///
/// `publish` serializes the outcome and enqueues it without blocking. A
/// dedicated thread owns the transport, sends messages in order, and reports
/// each one as delivered, failed or expired through [`DeliveryStats`] and the
/// acknowledgement channel.
pub struct EventPublisher {
    sender: Option<Sender<Envelope>>,
    worker: Option<JoinHandle<()>>,
    stats: Arc<DeliveryStats>,
    acks: Receiver<DeliveryReport>,
    next_context: AtomicU64,
    payload_mode: PayloadMode,
}

impl EventPublisher {
    pub fn start(transport: Box<dyn MessageTransport>, options: PublisherOptions) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(options.queue_capacity.max(1));
        let (ack_tx, acks) = crossbeam_channel::bounded(ACK_CAPACITY);
        let stats = Arc::new(DeliveryStats::new());

        let worker = {
            let stats = stats.clone();
            let timeout = options.message_timeout;
            thread::Builder::new()
                .name("publisher".into())
                .spawn(move || run_worker(transport, receiver, ack_tx, &stats, timeout))
        };
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to start publisher thread: {e}");
                None
            }
        };

        Self {
            sender: worker.as_ref().map(|_| sender),
            worker,
            stats,
            acks,
            next_context: AtomicU64::new(0),
            payload_mode: options.payload_mode,
        }
    }

    /// Enqueues one outcome and returns its delivery context.
    pub fn enqueue(&self, outcome: &Outcome) -> Result<u64, PublishError> {
        let body = EventPayload::from_outcome(outcome, self.payload_mode).to_body()?;
        let sender = self.sender.as_ref().ok_or(PublishError::Closed)?;
        let context = self.next_context.fetch_add(1, Ordering::Relaxed);

        let envelope = Envelope {
            context,
            body,
            enqueued_at: Instant::now(),
        };
        match sender.try_send(envelope) {
            Ok(()) => Ok(context),
            Err(TrySendError::Full(_)) => {
                self.stats.record_dropped();
                Err(PublishError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(PublishError::Closed),
        }
    }

    pub fn stats(&self) -> Arc<DeliveryStats> {
        self.stats.clone()
    }

    /// Receiver of delivery reports. Reports nobody collects are discarded
    /// once the channel is full.
    pub fn acknowledgements(&self) -> Receiver<DeliveryReport> {
        self.acks.clone()
    }

    /// Stops accepting events, sends or expires everything still queued,
    /// and returns the final counters.
    pub fn shutdown(mut self) -> DeliverySnapshot {
        self.drain()
    }

    fn close(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Publisher thread panicked");
            }
        }
    }
}

impl OutcomeSink for EventPublisher {
    fn publish(&self, outcome: &Outcome) -> Result<(), PublishError> {
        self.enqueue(outcome).map(|_| ())
    }

    fn drain(&mut self) -> DeliverySnapshot {
        self.close();
        self.stats.snapshot()
    }
}

impl Drop for EventPublisher {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_worker(
    mut transport: Box<dyn MessageTransport>,
    receiver: Receiver<Envelope>,
    acks: Sender<DeliveryReport>,
    stats: &DeliveryStats,
    message_timeout: Duration,
) {
    for envelope in receiver.iter() {
        let result = if envelope.enqueued_at.elapsed() > message_timeout {
            DeliveryResult::Expired
        } else {
            match transport.send(&envelope.body) {
                Ok(()) => DeliveryResult::Delivered,
                Err(e) => DeliveryResult::Failed(e.to_string()),
            }
        };

        match &result {
            DeliveryResult::Delivered => {
                log::debug!("Message {} delivered to {}", envelope.context, transport.name())
            }
            DeliveryResult::Failed(reason) => {
                log::warn!("Message {} failed: {reason}", envelope.context)
            }
            DeliveryResult::Expired => log::warn!(
                "Message {} expired after {} ms in queue",
                envelope.context,
                envelope.enqueued_at.elapsed().as_millis()
            ),
        }

        stats.record(&result);
        let _ = acks.try_send(DeliveryReport {
            context: envelope.context,
            result,
        });
    }
    log::debug!("Publisher drained; {} delivered", stats.delivered());
}
