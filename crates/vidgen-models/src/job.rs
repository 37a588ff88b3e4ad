//! Job identifiers.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Unique identifier for one pass through a pipeline phase.
///
/// Derived from the submission timestamp (milliseconds since epoch).
/// Every temp artifact path embeds this value, so two jobs must never
/// share an id within one process lifetime; `next()` forces strict
/// monotonicity even when two requests land in the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(i64);

static LAST_ID: AtomicI64 = AtomicI64::new(0);

impl JobId {
    /// Allocate the next job id.
    pub fn next() -> Self {
        let now = Utc::now().timestamp_millis();
        let mut prev = LAST_ID.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match LAST_ID.compare_exchange_weak(
                prev,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Self(candidate),
                Err(observed) => prev = observed,
            }
        }
    }

    /// Create from a raw timestamp value (for tests and log correlation).
    pub fn from_raw(value: i64) -> Self {
        Self(value)
    }

    /// The underlying timestamp value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
