use std::sync::atomic::{AtomicU64, Ordering};

/// What happened to one queued message.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryResult {
    Delivered,
    Failed(String),
    /// Sat in the queue past the message timeout and was never sent.
    Expired,
}

/// Confirmation for one message, keyed by the sequence number `publish` returned.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    pub context: u64,
    pub result: DeliveryResult,
}

/// Delivery counters shared between the publisher thread and its owner.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    delivered: AtomicU64,
    failed: AtomicU64,
    expired: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliverySnapshot {
    pub delivered: u64,
    pub failed: u64,
    pub expired: u64,
    /// Rejected at enqueue because the queue was full.
    pub dropped: u64,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: &DeliveryResult) {
        let counter = match result {
            DeliveryResult::Delivered => &self.delivered,
            DeliveryResult::Failed(_) => &self.failed,
            DeliveryResult::Expired => &self.expired,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> DeliverySnapshot {
        DeliverySnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}
