//! CLI for the rdm download engine.
//!
//! Every command works directly on the job database. The engine recovers a
//! job added here as paused on its next start; it runs once the engine is
//! asked to resume it.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rdm_core::config;
use rdm_core::resume_db::ResumeDb;

use commands::{run_add, run_config, run_remove, run_status};

/// Top-level CLI for the rdm download engine.
#[derive(Debug, Parser)]
#[command(name = "rdm")]
#[command(about = "rdm: persistent, resumable download queue", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Add a download to the job database, paused.
    Add {
        /// Source URL.
        url: String,

        /// Destination directory (default: current directory).
        #[arg(long, short = 'd', value_name = "DIR")]
        dir: Option<String>,

        /// Destination file name (default: chosen by the transfer engine).
        #[arg(long, short = 'o', value_name = "NAME")]
        filename: Option<String>,

        /// Extra request header, `Name: value`. May be repeated.
        #[arg(long = "header", short = 'H', value_name = "HEADER")]
        headers: Vec<String>,
    },

    /// Show all jobs.
    Status,

    /// Remove a job by ID.
    Remove {
        /// Job identifier.
        id: i64,

        /// Also delete the downloaded file.
        #[arg(long)]
        delete_file: bool,
    },

    /// Print the configuration file path and its values.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Add {
                url,
                dir,
                filename,
                headers,
            } => {
                let dir = match dir {
                    Some(dir) => dir,
                    None => std::env::current_dir()?.to_string_lossy().into_owned(),
                };
                let db = ResumeDb::open_default().await?;
                run_add(&db, &url, &dir, filename.as_deref(), &headers).await?;
            }
            CliCommand::Status => run_status(&ResumeDb::open_default().await?).await?,
            CliCommand::Remove { id, delete_file } => {
                run_remove(&ResumeDb::open_default().await?, id, delete_file).await?
            }
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
