//! `recon` — operator front end for the recon-kit pipeline engine.
//!
//! The browser panel is the primary consumer of the engine; this binary
//! covers the same operations from a terminal: scaffolding a workspace,
//! listing the catalog, running a pipeline while streaming its output,
//! and probing the auxiliary trainer containers.

use clap::{Parser, Subcommand};
use color_eyre::eyre::eyre;
use colored::Colorize;
use rk_core::init::{generate_recon_kit_structure, InitOptions};
use rk_core::state::SessionManager;
use rk_protocol::ipc::Event;
use rk_protocol::run_models::{PipelineResult, RunOutcome};
use rk_protocol::ContainerStatus;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recon", version, about = "Pipeline engine for the 3D reconstruction toolchain")]
struct Cli {
    /// Workspace root containing the `.recon-kit/` directory.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a .recon-kit/ directory with config and sample pipelines
    Init {
        /// Overwrite an existing .recon-kit/ directory
        #[arg(long)]
        force: bool,

        /// Write config.toml only, no sample pipelines
        #[arg(long)]
        minimal: bool,
    },

    /// List the available pipelines
    Pipelines,

    /// Run a pipeline to completion, streaming its output
    Run {
        /// Catalog name of the pipeline
        name: String,

        /// Project whose workspace paths parameterize the run
        #[arg(long)]
        project: Option<String>,

        /// Additional parameter bindings for the command templates
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Probe the auxiliary trainer containers
    Probe {
        /// Container names; defaults to the configured ones
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force, minimal } => init(cli.root, force, minimal).await,
        Commands::Pipelines => pipelines(cli.root).await,
        Commands::Run {
            name,
            project,
            params,
        } => run(cli.root, name, project, params).await,
        Commands::Probe { names } => probe(cli.root, names).await,
    }
}

async fn init(root: PathBuf, force: bool, minimal: bool) -> color_eyre::Result<()> {
    let rk_dir = root.join(".recon-kit");
    generate_recon_kit_structure(InitOptions {
        target_dir: root,
        force,
        minimal,
    })
    .await?;
    println!("Initialized {}", rk_dir.display());
    Ok(())
}

async fn pipelines(root: PathBuf) -> color_eyre::Result<()> {
    let manager = SessionManager::load(&root).await?;
    for spec in manager.catalog().specs() {
        let name = format!("{:<24}", spec.name);
        println!("{} {}", name.bold(), spec.description);
    }
    Ok(())
}

async fn run(
    root: PathBuf,
    name: String,
    project: Option<String>,
    params: Vec<String>,
) -> color_eyre::Result<()> {
    let manager = SessionManager::load(&root).await?;

    let mut user_params = HashMap::new();
    if let Some(project) = project {
        user_params.insert("project".to_string(), project);
    }
    for pair in &params {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| eyre!("parameter '{pair}' is not of the form KEY=VALUE"))?;
        user_params.insert(key.to_string(), value.to_string());
    }

    let mut run = manager.run_pipeline(&name, &user_params)?;

    let mut failed = false;
    while let Some(event) = run.events.recv().await {
        match event {
            Event::PipelineStarted {
                pipeline,
                stages_total,
                ..
            } => {
                println!(
                    "{} {} ({} stages)",
                    "Running".green().bold(),
                    pipeline.bold(),
                    stages_total
                );
            }
            Event::StageStarted {
                stage_index,
                description,
                ..
            } => {
                let header = format!("[stage {}]", stage_index + 1);
                println!("{} {}", header.blue().bold(), description);
            }
            Event::LogLine { line, .. } => println!("{line}"),
            Event::ProgressUpdate {
                fraction, label, ..
            } => {
                let percent = format!("[{:>3.0}%]", fraction * 100.0);
                println!("{} {}", percent.cyan().bold(), label.dimmed());
            }
            Event::StageExited { exit_code, .. } => {
                if exit_code != 0 {
                    println!("{}", format!("stage exited with code {exit_code}").red());
                }
            }
            Event::PipelineFinished { result, .. } => {
                failed = !result.is_success();
                render_result(&result);
            }
            Event::ContainerReport { .. } => {}
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn render_result(result: &PipelineResult) {
    match &result.outcome {
        RunOutcome::Completed => {
            println!(
                "{} {} ({}/{} stages)",
                "completed".green().bold(),
                result.pipeline,
                result.succeeded_stages,
                result.stages_total
            );
        }
        RunOutcome::SpawnFailed { stage, reason } => {
            println!(
                "{} stage {} could not start: {}",
                "failed".red().bold(),
                stage + 1,
                reason
            );
        }
        RunOutcome::StageFailed { stage, exit_code } => {
            let description = result
                .failed_stage_description
                .as_deref()
                .unwrap_or("unknown stage");
            println!(
                "{} stage {} ({}) exited with code {}",
                "failed".red().bold(),
                stage + 1,
                description,
                exit_code
            );
        }
        RunOutcome::Cancelled { stage } => {
            println!("{} during stage {}", "cancelled".yellow().bold(), stage + 1);
        }
        RunOutcome::ArtifactMissing { artifact } => {
            println!(
                "{} every stage exited 0 but the expected artifact is missing: {}",
                "failed".red().bold(),
                artifact
            );
            println!("Inspect the log above before re-running; the tool produced no usable output.");
        }
    }
}

async fn probe(root: PathBuf, names: Vec<String>) -> color_eyre::Result<()> {
    let manager = SessionManager::load(&root).await?;
    let statuses = manager.probe_containers(&names).await;

    let mut names: Vec<_> = statuses.keys().cloned().collect();
    names.sort();
    for name in names {
        let label = match statuses[&name] {
            ContainerStatus::Running => "running".green(),
            ContainerStatus::BuiltNotRunning => "built, not running".yellow(),
            ContainerStatus::Absent => "absent".red(),
        };
        println!("{:<20} {}", name, label);
    }
    Ok(())
}
