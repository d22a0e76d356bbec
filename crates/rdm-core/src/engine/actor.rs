//! The serialized context: one task owning [`Core`], applying commands in
//! arrival order and carrying out the effects they produce.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::resume_db::{delete_job_file, JobId, JobStore};

use super::command::{Command, Effect};
use super::machine::Core;
use super::observer::Notification;

pub(crate) async fn run(
    mut core: Core,
    mut rx: mpsc::UnboundedReceiver<Command>,
    tx: mpsc::WeakUnboundedSender<Command>,
    store: Arc<dyn JobStore>,
    notify_tx: mpsc::UnboundedSender<Notification>,
) {
    while let Some(command) = rx.recv().await {
        let shutting_down = matches!(command, Command::Shutdown);
        for effect in core.apply(command) {
            match effect {
                Effect::Notify(notification) => {
                    if notify_tx.send(notification).is_err() {
                        tracing::debug!("notifier gone, notification dropped");
                    }
                }
                Effect::Reload(id) => spawn_reload(id, store.clone(), tx.clone()),
                Effect::DeleteStored { id, delete_file } => {
                    spawn_delete_stored(id, delete_file, store.clone())
                }
            }
        }
        if shutting_down {
            break;
        }
    }
    tracing::debug!("engine context stopped");
}

/// Re-read a job that is no longer registered and feed it back for a restart.
fn spawn_reload(id: JobId, store: Arc<dyn JobStore>, tx: mpsc::WeakUnboundedSender<Command>) {
    tokio::spawn(async move {
        match store.load_by_id(id).await {
            Ok(Some(record)) => {
                if let Some(tx) = tx.upgrade() {
                    let _ = tx.send(Command::Reloaded(record));
                }
            }
            Ok(None) => tracing::warn!(job_id = id, "restart requested for unknown job"),
            Err(e) => tracing::warn!(job_id = id, "reloading job failed: {:#}", e),
        }
    });
}

fn spawn_delete_stored(id: JobId, delete_file: bool, store: Arc<dyn JobStore>) {
    tokio::spawn(async move {
        let record = match store.load_by_id(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!(job_id = id, "delete of unknown job ignored");
                return;
            }
            Err(e) => {
                tracing::warn!(job_id = id, "loading job for delete failed: {:#}", e);
                return;
            }
        };
        if delete_file {
            if let Err(e) = delete_job_file(&record).await {
                tracing::warn!(job_id = id, "deleting file failed: {:#}", e);
            }
        }
        if let Err(e) = store.delete(&record).await {
            tracing::warn!(job_id = id, "deleting stored job failed: {:#}", e);
        }
    });
}
