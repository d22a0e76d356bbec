//! The job scheduler and lifecycle state machine.
//!
//! Everything that decides which job runs lives behind a single serialized
//! context (`actor`) that owns the `Core` state. The public surface is
//! [`Engine`]; transfer engines plug in through [`crate::transfer`], storage
//! through [`crate::resume_db::JobStore`].

mod actor;
mod api;
mod command;
mod config_state;
mod machine;
mod gate;
mod observer;
mod queues;
mod recovery;
mod registry;
mod router;
mod scheduler;
mod throttle;


pub use api::{Engine, SubmitRequest};
pub use observer::{JobEvent, JobObserver, JobSetChange, JobSetObserver, Notification};
pub use queues::{QueueKind, QueueSnapshot};

pub(crate) use command::Command;
