//! CLI command handlers, one per file.

mod add;
mod config;
mod remove;
mod status;

#[cfg(test)]
pub use add::parse_header;
pub use add::run_add;
pub use config::run_config;
pub use remove::run_remove;
pub use status::run_status;
