//! Session manager coordinating pipeline runs for one panel session.
//!
//! The SessionManager is the facade the presentation layer talks to. It
//! owns the catalog, the single process supervisor, and the engine, and
//! provides operations for starting runs, cancelling the active job,
//! probing containers, and tailing the live log.

use crate::artifacts;
use crate::catalog::{CatalogError, PipelineCatalog};
use crate::config::AppConfig;
use crate::containers::{self, DockerCli};
use crate::engine::PipelineEngine;
use crate::jobs::ProcessSupervisor;
use rk_protocol::config_models::GlobalConfig;
use rk_protocol::container_models::ContainerStatus;
use rk_protocol::ipc::Event;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;
use uuid::Uuid;

/// One accepted pipeline run: its id plus the event channel to drain.
///
/// The channel carries `LogLine` and `ProgressUpdate` events as the run
/// proceeds and is terminated by a single `PipelineFinished`.
pub struct PipelineRun {
    /// Unique id of this run; every event carries it.
    pub run_id: Uuid,

    /// Receiver for the run's event stream.
    pub events: mpsc::Receiver<Event>,
}

impl PipelineRun {
    /// The event channel as a `Stream`, for consumers that prefer one.
    pub fn into_stream(self) -> ReceiverStream<Event> {
        ReceiverStream::new(self.events)
    }
}

/// Coordinates the catalog, supervisor, and engine for one session.
pub struct SessionManager {
    config: GlobalConfig,
    catalog: PipelineCatalog,
    supervisor: Arc<ProcessSupervisor>,
    engine: Arc<PipelineEngine>,
    runtime: DockerCli,
}

impl SessionManager {
    /// Create a manager from loaded configuration.
    pub fn new(config: AppConfig) -> Self {
        let supervisor = Arc::new(ProcessSupervisor::new());
        let engine = Arc::new(PipelineEngine::new(Arc::clone(&supervisor)));
        let runtime = DockerCli::new(
            config.global.docker_binary.clone(),
            config.global.probe_timeout_secs,
        );

        Self {
            config: config.global,
            catalog: PipelineCatalog::builtin().with_user_pipelines(config.pipelines),
            supervisor,
            engine,
            runtime,
        }
    }

    /// Load `.recon-kit/` from `root` and build a manager.
    pub async fn load(root: &Path) -> crate::config::ConfigResult<Self> {
        let config = crate::config::load_config(root).await?;
        Ok(Self::new(config))
    }

    /// The catalog of available pipelines.
    pub fn catalog(&self) -> &PipelineCatalog {
        &self.catalog
    }

    /// The session's global configuration.
    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Start a pipeline run in the background.
    ///
    /// Parameters are assembled from the global config (workspace paths,
    /// container names, a fresh timestamp, the newest checkpoint config)
    /// and then overridden by `user_params`, so an explicit value always
    /// wins. The run executes on a background task; starting a run while
    /// another is active terminates the older job at its next stage
    /// boundary crossing through the supervisor (last request wins).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the pipeline is unknown, a required
    /// parameter is missing, or the template fails validation. Rendering
    /// errors surface here, before anything is spawned.
    pub fn run_pipeline(
        &self,
        name: &str,
        user_params: &HashMap<String, String>,
    ) -> Result<PipelineRun, CatalogError> {
        let params = self.assemble_params(user_params);
        let pipeline = self.catalog.render(name, &params)?;
        self.ensure_directories(&params);

        let run_id = Uuid::new_v4();
        let (events_tx, events_rx) = mpsc::channel(256);
        let engine = Arc::clone(&self.engine);

        tokio::spawn(async move {
            let _ = events_tx
                .send(Event::PipelineStarted {
                    run_id,
                    pipeline: pipeline.name.clone(),
                    stages_total: pipeline.stages.len(),
                })
                .await;
            engine.run(run_id, &pipeline, &events_tx).await;
        });

        Ok(PipelineRun {
            run_id,
            events: events_rx,
        })
    }

    /// Terminate the active job, aborting its run.
    pub async fn cancel_active(&self) -> bool {
        self.supervisor.cancel_active().await
    }

    /// Probe the named containers, or the configured ones when `names`
    /// is empty.
    pub async fn probe_containers(&self, names: &[String]) -> HashMap<String, ContainerStatus> {
        let configured;
        let names = if names.is_empty() {
            configured = self.config.probe_names();
            &configured
        } else {
            names
        };
        containers::probe_containers(&self.runtime, names).await
    }

    /// The last `n` lines of the active job's log.
    pub fn tail_log(&self, n: usize) -> Vec<String> {
        self.supervisor.tail(n)
    }

    /// Training checkpoints for a project, newest first.
    pub fn checkpoints(&self, project: &str) -> Vec<PathBuf> {
        artifacts::newest_matching(&self.config.outputs_dir.join(project), "config.yml")
    }

    /// Exported meshes and point clouds for a project, newest first.
    pub fn exports(&self, project: &str) -> Vec<PathBuf> {
        let prefix = format!("{}_", project);
        let mut found: Vec<PathBuf> = Vec::new();
        for suffix in [".ply", ".glb"] {
            found.extend(
                artifacts::newest_matching(&self.config.exports_dir, suffix)
                    .into_iter()
                    .filter(|path| {
                        path.strip_prefix(&self.config.exports_dir)
                            .ok()
                            .and_then(|rel| rel.components().next())
                            .and_then(|first| first.as_os_str().to_str())
                            .is_some_and(|dir| dir.starts_with(&prefix))
                    }),
            );
        }
        found
    }

    /// Standard parameter bindings for this session, overridden by the
    /// caller's explicit values.
    fn assemble_params(&self, user_params: &HashMap<String, String>) -> HashMap<String, String> {
        let mut params = HashMap::new();
        let timestamp = chrono::Local::now().format("%Y-%m-%d_%H%M%S").to_string();

        params.insert("timestamp".to_string(), timestamp.clone());
        params.insert("docker".to_string(), self.config.docker_binary.clone());
        params.insert(
            "sugar_container".to_string(),
            self.config.sugar_container.clone(),
        );
        params.insert("dgs_container".to_string(), self.config.dgs_container.clone());
        params.insert(
            "scripts_dir".to_string(),
            "/workspace/scripts".to_string(),
        );
        params.insert(
            "outputs_root".to_string(),
            self.config.outputs_dir.display().to_string(),
        );
        params.insert("fps".to_string(), "2".to_string());
        params.insert("num_frames".to_string(), "300".to_string());

        if let Some(project) = user_params.get("project") {
            // Uploaded video wins over an image folder of the same name,
            // matching the upload convention.
            let video = self.config.uploads_dir.join(format!("{}.mp4", project));
            let input = if video.exists() {
                video
            } else {
                self.config.uploads_dir.join(project)
            };
            let dataset = self.config.data_dir.join(project);
            let workdir = self.config.outputs_dir.join(project).join("glomap");
            let export_dir = self
                .config
                .exports_dir
                .join(format!("{}_{}", project, timestamp));

            params.insert("input".to_string(), input.display().to_string());
            params.insert("output".to_string(), dataset.display().to_string());
            params.insert("data".to_string(), dataset.display().to_string());
            params.insert("workdir".to_string(), workdir.display().to_string());
            params.insert(
                "frames_dir".to_string(),
                workdir.join("images").display().to_string(),
            );
            params.insert("export_dir".to_string(), export_dir.display().to_string());
            params.insert(
                "output_file".to_string(),
                export_dir.with_extension("glb").display().to_string(),
            );

            if let Some(checkpoint) =
                artifacts::latest_checkpoint(&self.config.outputs_dir, project)
            {
                params.insert("config".to_string(), checkpoint.display().to_string());
            }

            // Newest exported mesh feeds the GLB conversion by default.
            if let Some(mesh) = self
                .exports(project)
                .iter()
                .find(|path| path.extension().is_some_and(|ext| ext == "ply"))
            {
                params.insert("input_file".to_string(), mesh.display().to_string());
            }
        }

        for (key, value) in user_params {
            params.insert(key.clone(), value.clone());
        }

        params
    }

    /// Create the directories a run writes into. External tools expect
    /// their output directories to exist.
    fn ensure_directories(&self, params: &HashMap<String, String>) {
        for root in [
            &self.config.uploads_dir,
            &self.config.data_dir,
            &self.config.outputs_dir,
            &self.config.exports_dir,
        ] {
            create_dir_logged(root);
        }

        for key in ["output", "workdir", "frames_dir", "export_dir"] {
            if let Some(dir) = params.get(key) {
                create_dir_logged(Path::new(dir));
            }
        }

        if let Some(file) = params.get("output_file") {
            if let Some(parent) = Path::new(file).parent() {
                create_dir_logged(parent);
            }
        }
    }
}

fn create_dir_logged(path: &Path) {
    if let Err(e) = std::fs::create_dir_all(path) {
        warn!(path = %path.display(), "failed to create directory: {}", e);
    }
}
