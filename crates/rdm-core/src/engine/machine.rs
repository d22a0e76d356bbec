//! The job state machine.
//!
//! `Core` owns the registry, the queues and the admission knobs. It is only
//! ever touched by the actor task, one command at a time, which gives every
//! transition a total order. `apply` mutates state, drives transfer handles
//! and returns the side effects (notifications, store I/O) for the actor to
//! carry out.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::EngineConfig;
use crate::resume_db::JobRecord;
use crate::transfer::{TransferEvents, TransferFactory, TransferHandle};

use super::command::{ApiCommand, Command, Effect, Query};
use super::config_state::ConfigState;
use super::gate::RecoveryGate;
use super::observer::{JobEvent, JobSetChange, Notification};
use super::queues::QueueSet;
use super::registry::TaskRegistry;
use super::throttle::ThrottleTracker;

pub(crate) struct Core {
    pub(super) registry: TaskRegistry,
    pub(super) queues: QueueSet,
    pub(super) config: ConfigState,
    pub(super) throttle: ThrottleTracker,
    pub(super) gate: RecoveryGate,
    factory: Arc<dyn TransferFactory>,
    events_tx: mpsc::UnboundedSender<Command>,
    /// API commands that arrived before recovery, replayed in order afterwards.
    pub(super) deferred: Vec<ApiCommand>,
    effects: Vec<Effect>,
}

impl Core {
    pub(crate) fn new(
        cfg: &EngineConfig,
        gate: RecoveryGate,
        factory: Arc<dyn TransferFactory>,
        events_tx: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            registry: TaskRegistry::default(),
            queues: QueueSet::default(),
            config: ConfigState::from_config(cfg),
            throttle: ThrottleTracker::new(cfg.avoid_frame_drop, cfg.progress_interval()),
            gate,
            factory,
            events_tx,
            deferred: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// Apply one command and return the effects it produced, in order.
    pub(crate) fn apply(&mut self, command: Command) -> Vec<Effect> {
        match command {
            Command::Transfer(id, event) => self.on_transfer_event(id, event),
            Command::Api(api) => {
                if api.needs_recovery() && !self.gate.is_open() {
                    tracing::debug!(?api, "deferring request until recovery completes");
                    self.deferred.push(api);
                } else {
                    self.on_api(api);
                }
            }
            Command::Query(query) => self.answer(query),
            Command::Recovered(jobs) => self.finish_recovery(jobs),
            Command::Submitted { record, reply } => {
                self.on_submitted(record.clone());
                // The caller may have given up waiting; the job exists regardless.
                let _ = reply.send(record);
            }
            Command::Reloaded(record) => self.on_reloaded(record),
            Command::Shutdown => self.shutdown(),
        }
        std::mem::take(&mut self.effects)
    }

    /// Ask every queued transfer to stop. The engine stops processing reports
    /// right after, so confirmations are not awaited.
    pub(crate) fn shutdown(&mut self) {
        tracing::info!(
            running = self.queues.running.len(),
            waiting = self.queues.waiting.len(),
            "engine shutting down"
        );
        self.pause_all();
    }

    fn answer(&self, query: Query) {
        match query {
            Query::Job { id, reply } => {
                let _ = reply.send(self.registry.record(id).cloned());
            }
            Query::Jobs(reply) => {
                let _ = reply.send(self.registry.records().cloned().collect());
            }
            Query::Queues(reply) => {
                let _ = reply.send(self.queues.snapshot());
            }
            Query::Config(reply) => {
                let _ = reply.send(self.config_snapshot());
            }
        }
    }

    pub(super) fn config_snapshot(&self) -> EngineConfig {
        EngineConfig {
            max_running_jobs: self.config.max_running(),
            speed_limit: self.config.speed_limit(),
            allow_download: self.config.allow_download(),
            avoid_frame_drop: self.throttle.enabled(),
            progress_interval_ms: u64::try_from(self.throttle.interval().as_millis())
                .unwrap_or(u64::MAX),
        }
    }

    /// Build a transfer handle for `record` and register both.
    pub(super) fn register(&mut self, record: JobRecord) {
        let id = record.id;
        let events = TransferEvents::new(id, self.events_tx.clone());
        let handle: Box<dyn TransferHandle> = self.factory.create(&record, events);
        self.registry.put(id, handle, record);
    }

    pub(super) fn notify(&mut self, event: JobEvent) {
        self.effects.push(Effect::Notify(Notification::Job(event)));
    }

    pub(super) fn notify_set(&mut self, change: JobSetChange) {
        self.effects.push(Effect::Notify(Notification::JobSet(change)));
    }

    pub(super) fn push_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }
}
