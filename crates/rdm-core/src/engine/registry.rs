//! Job id → transfer handle + record.
//!
//! Only the serialized context touches the registry, so it has no locking.

use std::collections::HashMap;

use crate::resume_db::{JobId, JobRecord};
use crate::transfer::TransferHandle;

pub(crate) struct TaskEntry {
    pub(crate) handle: Box<dyn TransferHandle>,
    pub(crate) record: JobRecord,
    /// Set once observers were told the job is removed (cancel request), so
    /// the later `canceled` report does not announce it twice.
    pub(crate) removal_announced: bool,
}

#[derive(Default)]
pub(crate) struct TaskRegistry {
    tasks: HashMap<JobId, TaskEntry>,
}

impl TaskRegistry {
    pub(crate) fn put(&mut self, id: JobId, handle: Box<dyn TransferHandle>, record: JobRecord) {
        self.tasks.insert(
            id,
            TaskEntry {
                handle,
                record,
                removal_announced: false,
            },
        );
    }

    pub(crate) fn get(&self, id: JobId) -> Option<&TaskEntry> {
        self.tasks.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: JobId) -> Option<&mut TaskEntry> {
        self.tasks.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: JobId) -> Option<TaskEntry> {
        self.tasks.remove(&id)
    }

    pub(crate) fn contains(&self, id: JobId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub(crate) fn record(&self, id: JobId) -> Option<&JobRecord> {
        self.tasks.get(&id).map(|entry| &entry.record)
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &JobRecord> {
        self.tasks.values().map(|entry| &entry.record)
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }
}
