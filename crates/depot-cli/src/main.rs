//! Depot CLI: deposit content, import legacy version histories and inspect fixity.
//!
//! Configuration comes from the environment (and `.env`). Use
//! `DEPOT_STORAGE_BACKEND=local` with `DEPOT_STORAGE_PATH` to keep state between runs.

use std::path::PathBuf;

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use depot_cli::{load_descriptors, RunSummary};
use depot_core::models::{ObjectId, RemoteCredentials};
use depot_core::PipelineConfig;
use depot_pipeline::{init_telemetry, Pipeline};
use serde::Serialize;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "depot", about = "Depot content pipeline CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a file as the new current content of an object
    Deposit {
        /// Object identifier
        object_id: String,
        /// Path to the content file
        file: PathBuf,
        /// MIME type declared by the depositor
        #[arg(long)]
        mime: Option<String>,
        /// Version label (defaults to versionN)
        #[arg(long)]
        label: Option<String>,
        /// Only enqueue jobs, do not run them
        #[arg(long)]
        no_process: bool,
    },
    /// Import a version history from the legacy repository
    Import {
        /// Object identifier
        object_id: String,
        /// JSON file listing {uri, created, label} descriptors, oldest first
        descriptors: PathBuf,
        /// Legacy repository user (defaults to LEGACY_REPOSITORY_USER)
        #[arg(long)]
        user: Option<String>,
        /// Legacy repository password (defaults to LEGACY_REPOSITORY_PASSWORD)
        #[arg(long)]
        password: Option<String>,
        /// Only enqueue jobs, do not run them
        #[arg(long)]
        no_process: bool,
    },
    /// List the versions of an object
    Versions {
        /// Object identifier
        object_id: String,
    },
    /// Verify every stored version and append the results to the fixity log
    Audit {
        /// Object identifier
        object_id: String,
    },
    /// Show the fixity audit log of an object
    FixityLog {
        /// Object identifier
        object_id: String,
    },
    /// Characterize objects and run the resulting derivative jobs
    Work {
        /// Object identifiers
        #[arg(required = true)]
        object_ids: Vec<String>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn run_jobs(pipeline: &Arc<Pipeline>) -> anyhow::Result<()> {
    let reports = pipeline.run_pending().await;
    let summary = RunSummary::from_reports(&reports);
    print_json(&serde_json::json!({ "summary": summary, "jobs": reports }))?;
    if summary.failed > 0 {
        anyhow::bail!("{} job(s) failed", summary.failed);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    if let Err(e) = init_telemetry() {
        eprintln!("Failed to initialize tracing: {}", e);
    }

    let cli = Cli::parse();
    let config = PipelineConfig::from_env().context("Invalid configuration")?;
    let pipeline = Pipeline::from_config(config)
        .await
        .context("Failed to initialize pipeline")?;

    match cli.command {
        Commands::Deposit {
            object_id,
            file,
            mime,
            label,
            no_process,
        } => {
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let outcome = pipeline
                .deposit(
                    &ObjectId::from(object_id),
                    Bytes::from(content),
                    mime.as_deref(),
                    label.as_deref(),
                )
                .await?;
            print_json(&outcome)?;
            if !no_process {
                run_jobs(&pipeline).await?;
            }
        }
        Commands::Import {
            object_id,
            descriptors,
            user,
            password,
            no_process,
        } => {
            let descriptors = load_descriptors(&descriptors)?;
            let credentials =
                user.map(|user| RemoteCredentials::new(user, password.unwrap_or_default()));
            let report = pipeline
                .import_versions(&ObjectId::from(object_id), &descriptors, credentials.as_ref())
                .await?;
            print_json(&report)?;
            if !no_process {
                run_jobs(&pipeline).await?;
            }
        }
        Commands::Versions { object_id } => {
            let versions = pipeline.versions(&ObjectId::from(object_id)).await?;
            print_json(&versions)?;
        }
        Commands::Audit { object_id } => {
            let entries = pipeline.audit(&ObjectId::from(object_id)).await?;
            print_json(&entries)?;
        }
        Commands::FixityLog { object_id } => {
            let entries = pipeline.fixity_log(&ObjectId::from(object_id)).await?;
            print_json(&entries)?;
        }
        Commands::Work { object_ids } => {
            for object_id in object_ids {
                let job = pipeline
                    .enqueue_characterization(&ObjectId::from(object_id))
                    .await?;
                tracing::debug!(job.id = %job.id, "Characterization queued");
            }
            run_jobs(&pipeline).await?;
        }
    }

    Ok(())
}
