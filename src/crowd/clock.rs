use std::fmt;
use time::{OffsetDateTime, UtcOffset};

/// Source of the wall-clock time the density rules are evaluated against.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in the host's local offset.
///
/// The offset is captured once at construction; reading it later from a
/// multi-threaded process is refused by `time` on some platforms. Falls back
/// to UTC when the local offset cannot be determined.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new() -> Self {
        let offset = UtcOffset::current_local_offset().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Local UTC offset unavailable, using UTC");
            UtcOffset::UTC
        });
        Self { offset }
    }

    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
