use chrono::{Local, NaiveTime, Timelike};

/// Source of wall-clock event timestamps.
///
/// Events carry the local time of day, truncated to whole microseconds so a
/// timestamp survives a trip through its textual form unchanged. There is
/// no date part: values wrap back to `00:00:00` at local midnight.
pub trait Clock: Send {
    fn now(&self) -> NaiveTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveTime {
        truncate_to_micros(Local::now().time())
    }
}

pub fn truncate_to_micros(time: NaiveTime) -> NaiveTime {
    let nanos = time.nanosecond() / 1_000 * 1_000;
    time.with_nanosecond(nanos).unwrap_or(time)
}
