//! The four job queues and their exclusivity rules.

use std::collections::{HashSet, VecDeque};

use crate::resume_db::JobId;

/// Insertion-ordered set of job ids.
#[derive(Debug, Default)]
pub(crate) struct UniqueQueue {
    order: VecDeque<JobId>,
    members: HashSet<JobId>,
}

impl UniqueQueue {
    /// Append `id`. No-op returning false if it is already queued.
    pub(crate) fn offer(&mut self, id: JobId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.order.push_back(id);
        true
    }

    /// Remove and return the earliest inserted id.
    pub(crate) fn poll(&mut self) -> Option<JobId> {
        let id = self.order.pop_front()?;
        self.members.remove(&id);
        Some(id)
    }

    pub(crate) fn remove(&mut self, id: JobId) -> bool {
        if !self.members.remove(&id) {
            return false;
        }
        self.order.retain(|queued| *queued != id);
        true
    }

    pub(crate) fn contains(&self, id: JobId) -> bool {
        self.members.contains(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn ids(&self) -> Vec<JobId> {
        self.order.iter().copied().collect()
    }
}

/// Which queue a job sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Running,
    Waiting,
    Error,
    Paused,
}

/// Running, waiting, error and paused queues. A job id is in at most one of them.
#[derive(Debug, Default)]
pub(crate) struct QueueSet {
    pub(crate) running: UniqueQueue,
    pub(crate) waiting: UniqueQueue,
    pub(crate) error: UniqueQueue,
    pub(crate) paused: UniqueQueue,
}

impl QueueSet {
    /// Remove `id` from every queue; true if any queue held it.
    pub(crate) fn remove_everywhere(&mut self, id: JobId) -> bool {
        // Non-short-circuiting on purpose: all four must be cleared.
        self.running.remove(id)
            | self.waiting.remove(id)
            | self.error.remove(id)
            | self.paused.remove(id)
    }

    pub(crate) fn kind_of(&self, id: JobId) -> Option<QueueKind> {
        if self.running.contains(id) {
            Some(QueueKind::Running)
        } else if self.waiting.contains(id) {
            Some(QueueKind::Waiting)
        } else if self.error.contains(id) {
            Some(QueueKind::Error)
        } else if self.paused.contains(id) {
            Some(QueueKind::Paused)
        } else {
            None
        }
    }

    pub(crate) fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            running: self.running.ids(),
            waiting: self.waiting.ids(),
            error: self.error.ids(),
            paused: self.paused.ids(),
        }
    }
}

/// Point-in-time copy of the queues, earliest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub running: Vec<JobId>,
    pub waiting: Vec<JobId>,
    pub error: Vec<JobId>,
    pub paused: Vec<JobId>,
}

impl QueueSnapshot {
    /// Number of queues holding `id` (0 or 1 while the engine is consistent).
    pub fn occurrences(&self, id: JobId) -> usize {
        [&self.running, &self.waiting, &self.error, &self.paused]
            .iter()
            .filter(|q| q.contains(&id))
            .count()
    }

    pub fn kind_of(&self, id: JobId) -> Option<QueueKind> {
        if self.running.contains(&id) {
            Some(QueueKind::Running)
        } else if self.waiting.contains(&id) {
            Some(QueueKind::Waiting)
        } else if self.error.contains(&id) {
            Some(QueueKind::Error)
        } else if self.paused.contains(&id) {
            Some(QueueKind::Paused)
        } else {
            None
        }
    }
}
