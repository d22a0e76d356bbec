//! Public handle to a running engine.
//!
//! Fire-and-forget requests are queued onto the serialized context and return
//! as soon as they are sent; requests that arrive before recovery completed
//! are held there and replayed in order. Submission and queries wait for
//! recovery on the caller's task.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::resume_db::{unix_timestamp, CustomHeader, JobId, JobRecord, JobState, JobStore};
use crate::transfer::TransferFactory;

use super::actor;
use super::command::{ApiCommand, Command, Query};
use super::gate::{RecoveryGate, RecoveryWaiter};
use super::machine::Core;
use super::observer::{spawn_notifier, JobObserver, JobSetObserver, Observers};
use super::queues::QueueSnapshot;
use super::recovery;

/// A download to add to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub url: String,
    /// Destination directory.
    pub path: String,
    /// Destination file name; left to the transfer engine when `None`.
    pub filename: Option<String>,
    pub headers: Vec<CustomHeader>,
}

impl SubmitRequest {
    pub fn new(url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
            filename: None,
            headers: Vec::new(),
        }
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(CustomHeader {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.url.trim().is_empty() {
            return Err(EngineError::InvalidRequest("empty url".into()));
        }
        if self.path.trim().is_empty() {
            return Err(EngineError::InvalidRequest("empty destination path".into()));
        }
        if matches!(self.filename.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err(EngineError::InvalidRequest("empty file name".into()));
        }
        if let Some(h) = self.headers.iter().find(|h| h.name.trim().is_empty()) {
            return Err(EngineError::InvalidRequest(format!(
                "header with empty name (value {:?})",
                h.value
            )));
        }
        Ok(())
    }
}

/// Handle to the download engine. Cheap to clone; the engine shuts down when
/// [`Engine::shutdown`] is called or the last clone is dropped.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

struct Inner {
    tx: mpsc::UnboundedSender<Command>,
    waiter: RecoveryWaiter,
    store: Arc<dyn JobStore>,
    observers: Arc<Observers>,
    tasks: Mutex<Option<(JoinHandle<()>, JoinHandle<()>)>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
    }
}

impl Engine {
    /// Start the engine: spawns the serialized context, the notifier and the
    /// background recovery load. Must be called inside a tokio runtime.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn JobStore>,
        factory: Arc<dyn TransferFactory>,
    ) -> Self {
        let observers = Arc::new(Observers::default());
        let (notify_tx, notifier) = spawn_notifier(observers.clone());
        let (tx, rx) = mpsc::unbounded_channel();
        let (gate, waiter) = RecoveryGate::new();

        let core = Core::new(&config, gate, factory, tx.clone());
        let actor = tokio::spawn(actor::run(
            core,
            rx,
            tx.downgrade(),
            store.clone(),
            notify_tx,
        ));

        let recovery_store = store.clone();
        let recovery_tx = tx.clone();
        tokio::spawn(async move {
            let jobs = recovery::load_jobs(recovery_store.as_ref()).await;
            if recovery_tx.send(Command::Recovered(jobs)).is_err() {
                tracing::debug!("engine stopped before recovery completed");
            }
        });

        tracing::info!(
            max_running = config.max_running_jobs,
            speed_limit = config.speed_limit,
            allow_download = config.allow_download,
            "engine started"
        );

        Self {
            inner: Arc::new(Inner {
                tx,
                waiter,
                store,
                observers,
                tasks: Mutex::new(Some((actor, notifier))),
            }),
        }
    }

    /// Install (or clear) the per-job lifecycle observer.
    pub fn set_job_observer(&self, observer: Option<Arc<dyn JobObserver>>) {
        self.inner.observers.set_job_observer(observer);
    }

    /// Install (or clear) the job arrival/removal observer.
    pub fn set_job_set_observer(&self, observer: Option<Arc<dyn JobSetObserver>>) {
        self.inner.observers.set_job_set_observer(observer);
    }

    /// Resolve once the startup load is registered.
    pub async fn wait_recovered(&self) -> Result<(), EngineError> {
        self.inner.waiter.wait().await
    }

    pub fn is_recovered(&self) -> bool {
        self.inner.waiter.is_open()
    }

    /// Persist a new job and queue it. The returned record carries the id the
    /// store assigned. Nothing is created if the request is invalid, the
    /// insert fails or the engine stops before it takes the job over.
    pub async fn submit(&self, request: SubmitRequest) -> Result<JobRecord, EngineError> {
        request.validate()?;
        self.wait_recovered().await?;
        if self.inner.tx.is_closed() {
            return Err(EngineError::Closed);
        }

        let mut record = JobRecord::new_waiting(
            &request.url,
            &request.path,
            request.filename.as_deref(),
            unix_timestamp(),
        );
        record.custom_headers = request.headers;
        record.id = self
            .inner
            .store
            .insert(&record)
            .await
            .map_err(EngineError::Store)?;

        let (reply, rx) = oneshot::channel();
        let submitted = Command::Submitted {
            record: record.clone(),
            reply,
        };
        if self.send(submitted).is_ok() {
            if let Ok(record) = rx.await {
                return Ok(record);
            }
        }
        self.forget_submitted(&record).await
    }

    /// The engine stopped between the insert and the hand-off; drop the row
    /// so a refused submission leaves nothing behind.
    async fn forget_submitted(&self, record: &JobRecord) -> Result<JobRecord, EngineError> {
        if let Err(e) = self.inner.store.delete(record).await {
            tracing::warn!(job_id = record.id, "removing unsubmitted job failed: {:#}", e);
        }
        Err(EngineError::Closed)
    }

    /// Resume a paused or failed job, or re-download a finished one. With
    /// `restart` the previous progress is discarded and a job that is no
    /// longer registered is reloaded from the store.
    pub fn start_or_resume(&self, id: JobId, restart: bool) -> Result<(), EngineError> {
        self.api(ApiCommand::StartOrResume { id, restart })
    }

    pub fn pause(&self, id: JobId) -> Result<(), EngineError> {
        self.api(ApiCommand::Pause(id))
    }

    pub fn cancel(&self, id: JobId) -> Result<(), EngineError> {
        self.api(ApiCommand::Cancel(id))
    }

    /// Remove a job and its record, and the downloaded file if `delete_file`.
    pub fn delete(&self, id: JobId, delete_file: bool) -> Result<(), EngineError> {
        self.api(ApiCommand::Delete { id, delete_file })
    }

    pub fn pause_all(&self) -> Result<(), EngineError> {
        self.api(ApiCommand::PauseAll)
    }

    pub fn start_all(&self) -> Result<(), EngineError> {
        self.api(ApiCommand::StartAll)
    }

    pub fn set_max_running(&self, max: usize) -> Result<(), EngineError> {
        self.api(ApiCommand::SetMaxRunning(max))
    }

    /// Global switch; `false` stops admitting jobs and yields running ones.
    pub fn set_allow_download(&self, allow: bool) -> Result<(), EngineError> {
        self.api(ApiCommand::SetAllowDownload(allow))
    }

    /// Aggregate bandwidth cap in bytes per second; `<= 0` is unlimited.
    pub fn set_speed_limit(&self, limit: i64) -> Result<(), EngineError> {
        self.api(ApiCommand::SetSpeedLimit(limit))
    }

    pub fn set_avoid_frame_drop(&self, enabled: bool) -> Result<(), EngineError> {
        self.api(ApiCommand::SetAvoidFrameDrop(enabled))
    }

    /// Minimum spacing of progress notifications per job. Sub-millisecond
    /// parts are rounded up to the next whole millisecond.
    pub fn set_progress_interval(&self, interval: Duration) -> Result<(), EngineError> {
        self.api(ApiCommand::SetProgressInterval(interval))
    }

    /// Current admission knobs as seen by the serialized context.
    pub async fn config(&self) -> Result<EngineConfig, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Query(Query::Config(reply)))?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    pub async fn job(&self, id: JobId) -> Result<Option<JobRecord>, EngineError> {
        self.wait_recovered().await?;
        let (reply, rx) = oneshot::channel();
        self.send(Command::Query(Query::Job { id, reply }))?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Registered jobs that are not finished, newest created first.
    pub async fn active_jobs(&self) -> Result<Vec<JobRecord>, EngineError> {
        let mut jobs: Vec<JobRecord> = self
            .all_jobs()
            .await?
            .into_iter()
            .filter(|r| !r.state.is_terminal())
            .collect();
        jobs.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(jobs)
    }

    /// Finished jobs kept as history, most recently finished first.
    pub async fn finished_jobs(&self) -> Result<Vec<JobRecord>, EngineError> {
        let mut jobs: Vec<JobRecord> = self
            .all_jobs()
            .await?
            .into_iter()
            .filter(|r| r.state == JobState::Finished)
            .collect();
        jobs.sort_by(|a, b| (b.finished_at, b.id).cmp(&(a.finished_at, a.id)));
        Ok(jobs)
    }

    pub async fn queues(&self) -> Result<QueueSnapshot, EngineError> {
        self.wait_recovered().await?;
        let (reply, rx) = oneshot::channel();
        self.send(Command::Query(Query::Queues(reply)))?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Ask queued transfers to pause, stop the serialized context and wait
    /// until every pending notification was delivered.
    pub async fn shutdown(&self) {
        let _ = self.inner.tx.send(Command::Shutdown);
        let tasks = self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some((actor, notifier)) = tasks else {
            return;
        };
        if let Err(e) = actor.await {
            tracing::warn!("engine context ended abnormally: {}", e);
        }
        // The actor owned the notification sender; the notifier drains and exits.
        if let Err(e) = notifier.await {
            tracing::warn!("notifier ended abnormally: {}", e);
        }
        tracing::info!("engine stopped");
    }

    async fn all_jobs(&self) -> Result<Vec<JobRecord>, EngineError> {
        self.wait_recovered().await?;
        let (reply, rx) = oneshot::channel();
        self.send(Command::Query(Query::Jobs(reply)))?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    fn api(&self, api: ApiCommand) -> Result<(), EngineError> {
        self.send(Command::Api(api))
    }

    fn send(&self, command: Command) -> Result<(), EngineError> {
        self.inner.tx.send(command).map_err(|_| EngineError::Closed)
    }
}
