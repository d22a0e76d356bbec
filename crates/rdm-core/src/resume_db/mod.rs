//! Persistent resume/job database (SQLite via sqlx).
//!
//! Stores job records with their progress counters, custom headers and the
//! transfer engine's chunk cursors so jobs survive a restart.

pub mod db;
mod jobs;
pub mod store;
pub mod types;

pub use db::*;
pub use store::*;
pub use types::*;
