//! Outward notifications.
//!
//! The serialized context never calls observers directly. It pushes
//! [`Notification`]s onto a channel drained by a single notifier task, so
//! delivery order matches the order of state transitions and a slow or
//! failing observer cannot stall scheduling. Delivery is best effort: an
//! observer error is logged and dropped.

use std::sync::{Arc, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::resume_db::{JobId, JobRecord};

/// Per-job lifecycle notification.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Connecting { id: JobId },
    Progress { id: JobId, total: u64, downloaded: u64, bps: f64 },
    Waiting { id: JobId },
    Started(JobRecord),
    Paused { id: JobId },
    Stopping { id: JobId },
    Error { id: JobId, code: i32, fatal: bool },
    Finished(JobRecord),
    Canceled { id: JobId },
    InfoUpdated(JobRecord),
}

impl JobEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            JobEvent::Connecting { id }
            | JobEvent::Progress { id, .. }
            | JobEvent::Waiting { id }
            | JobEvent::Paused { id }
            | JobEvent::Stopping { id }
            | JobEvent::Error { id, .. }
            | JobEvent::Canceled { id } => *id,
            JobEvent::Started(record)
            | JobEvent::Finished(record)
            | JobEvent::InfoUpdated(record) => record.id,
        }
    }
}

/// Change to the set of jobs the engine knows about.
#[derive(Debug, Clone, PartialEq)]
pub enum JobSetChange {
    Arrived(JobRecord),
    Removed(JobId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Job(JobEvent),
    JobSet(JobSetChange),
}

/// Receives per-job lifecycle notifications.
#[async_trait]
pub trait JobObserver: Send + Sync + 'static {
    async fn on_job_event(&self, event: &JobEvent) -> Result<()>;
}

/// Receives job arrival/removal notifications.
#[async_trait]
pub trait JobSetObserver: Send + Sync + 'static {
    async fn on_job_set_change(&self, change: &JobSetChange) -> Result<()>;
}

/// Currently installed observers. Replacement takes the write lock; delivery
/// clones an `Arc` snapshot and never holds the lock across an await.
#[derive(Default)]
pub(crate) struct Observers {
    job: RwLock<Option<Arc<dyn JobObserver>>>,
    job_set: RwLock<Option<Arc<dyn JobSetObserver>>>,
}

impl Observers {
    pub(crate) fn set_job_observer(&self, observer: Option<Arc<dyn JobObserver>>) {
        *self.job.write().unwrap_or_else(|e| e.into_inner()) = observer;
    }

    pub(crate) fn set_job_set_observer(&self, observer: Option<Arc<dyn JobSetObserver>>) {
        *self.job_set.write().unwrap_or_else(|e| e.into_inner()) = observer;
    }

    fn job_observer(&self) -> Option<Arc<dyn JobObserver>> {
        self.job.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn job_set_observer(&self) -> Option<Arc<dyn JobSetObserver>> {
        self.job_set.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn deliver(&self, notification: &Notification) {
        match notification {
            Notification::Job(event) => {
                let Some(observer) = self.job_observer() else {
                    return;
                };
                if let Err(e) = observer.on_job_event(event).await {
                    tracing::warn!(job_id = event.job_id(), "job observer delivery failed: {:#}", e);
                }
            }
            Notification::JobSet(change) => {
                let Some(observer) = self.job_set_observer() else {
                    return;
                };
                if let Err(e) = observer.on_job_set_change(change).await {
                    tracing::warn!("job set observer delivery failed: {:#}", e);
                }
            }
        }
    }
}

/// Spawn the notifier task. It exits once every sender is dropped and the
/// queue is drained.
pub(crate) fn spawn_notifier(
    observers: Arc<Observers>,
) -> (mpsc::UnboundedSender<Notification>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();
    let handle = tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            observers.deliver(&notification).await;
        }
        tracing::debug!("notifier stopped");
    });
    (tx, handle)
}
