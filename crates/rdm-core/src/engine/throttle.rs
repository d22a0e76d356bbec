//! Progress notification throttling.
//!
//! With frame-drop avoidance on, at most one progress notification per job is
//! delivered per interval. Updates inside the interval are dropped, not
//! queued: the next delivered update carries the latest cumulative values.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::resume_db::JobId;

#[derive(Debug)]
pub(crate) struct ThrottleTracker {
    enabled: bool,
    interval: Duration,
    last_sent: HashMap<JobId, Instant>,
}

impl ThrottleTracker {
    pub(crate) fn new(enabled: bool, interval: Duration) -> Self {
        Self {
            enabled,
            interval,
            last_sent: HashMap::new(),
        }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    /// Decide whether a progress update for `id` observed at `now` is delivered,
    /// and remember the delivery if so.
    pub(crate) fn should_deliver(&mut self, id: JobId, now: Instant) -> bool {
        let deliver = !self.enabled
            || match self.last_sent.get(&id) {
                None => true,
                Some(last) => now.saturating_duration_since(*last) >= self.interval,
            };
        if deliver {
            self.last_sent.insert(id, now);
        }
        deliver
    }

    /// Disabling forgets every timestamp so the next update of each job goes out.
    pub(crate) fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        if !enabled {
            self.last_sent.clear();
        }
        true
    }

    /// The interval is kept in whole milliseconds, rounded up, so it reads back
    /// unchanged through the millisecond config field.
    pub(crate) fn set_interval(&mut self, interval: Duration) -> bool {
        let millis = u64::try_from(interval.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX);
        let interval = Duration::from_millis(millis);
        let changed = self.interval != interval;
        self.interval = interval;
        changed
    }

    /// Called when a job stops transferring so its next update is not held back.
    pub(crate) fn forget(&mut self, id: JobId) {
        self.last_sent.remove(&id);
    }
}
