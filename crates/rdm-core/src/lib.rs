pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod resume_db;
pub mod transfer;

pub use engine::{Engine, JobEvent, JobObserver, JobSetChange, JobSetObserver, SubmitRequest};
pub use error::EngineError;
