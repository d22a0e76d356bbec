//! Runtime admission knobs consulted by the scheduler.

use crate::config::EngineConfig;

#[derive(Debug, Clone)]
pub(crate) struct ConfigState {
    max_running: usize,
    speed_limit: i64,
    allow_download: bool,
}

impl ConfigState {
    pub(crate) fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            max_running: cfg.max_running_jobs,
            speed_limit: cfg.speed_limit,
            allow_download: cfg.allow_download,
        }
    }

    pub(crate) fn max_running(&self) -> usize {
        self.max_running
    }

    pub(crate) fn speed_limit(&self) -> i64 {
        self.speed_limit
    }

    pub(crate) fn allow_download(&self) -> bool {
        self.allow_download
    }

    /// How many jobs may run right now: zero while downloads are globally paused.
    pub(crate) fn effective_cap(&self) -> usize {
        if self.allow_download {
            self.max_running
        } else {
            0
        }
    }

    /// Even share of the aggregate limit for each of `running` jobs.
    /// `None` when no aggregate limit is configured.
    pub(crate) fn per_job_speed_limit(&self, running: usize) -> Option<u64> {
        if self.speed_limit <= 0 {
            return None;
        }
        Some(self.speed_limit as u64 / running.max(1) as u64)
    }

    /// Returns true if the value changed.
    pub(crate) fn set_max_running(&mut self, n: usize) -> bool {
        let changed = self.max_running != n;
        self.max_running = n;
        changed
    }

    /// Returns true if the value changed.
    pub(crate) fn set_allow_download(&mut self, allow: bool) -> bool {
        let changed = self.allow_download != allow;
        self.allow_download = allow;
        changed
    }

    pub(crate) fn set_speed_limit(&mut self, limit: i64) -> bool {
        let changed = self.speed_limit != limit;
        self.speed_limit = limit;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(max_running: usize, speed_limit: i64, allow_download: bool) -> ConfigState {
        ConfigState::from_config(&EngineConfig {
            max_running_jobs: max_running,
            speed_limit,
            allow_download,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn global_pause_zeroes_the_cap() {
        let mut s = state(4, 0, true);
        assert_eq!(s.effective_cap(), 4);
        assert!(s.set_allow_download(false));
        assert_eq!(s.effective_cap(), 0);
        assert!(!s.set_allow_download(false));
    }

    #[test]
    fn speed_limit_is_divided_evenly() {
        let s = state(4, 1_000, true);
        assert_eq!(s.per_job_speed_limit(0), Some(1_000));
        assert_eq!(s.per_job_speed_limit(1), Some(1_000));
        assert_eq!(s.per_job_speed_limit(2), Some(500));
        assert_eq!(s.per_job_speed_limit(3), Some(333));
    }

    #[test]
    fn non_positive_limit_is_unlimited() {
        assert_eq!(state(1, 0, true).per_job_speed_limit(2), None);
        assert_eq!(state(1, -1, true).per_job_speed_limit(2), None);
    }

    #[test]
    fn setters_report_changes() {
        let mut s = state(2, 0, true);
        assert!(!s.set_max_running(2));
        assert!(s.set_max_running(5));
        assert_eq!(s.max_running(), 5);
        assert!(s.set_speed_limit(10));
        assert!(!s.set_speed_limit(10));
        assert_eq!(s.speed_limit(), 10);
    }
}
