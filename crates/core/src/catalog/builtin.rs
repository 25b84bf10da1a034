//! Built-in pipeline definitions for the reconstruction toolchain.
//!
//! Two shapes exist and both run through the same engine: single-stage
//! pipelines that delegate entirely to one external tool (ns-process-data,
//! ns-train, ns-export, the containerized trainers), and the composite
//! GLOMAP chain where independent tools feed each other's output paths.
//!
//! Placeholders are resolved at render time from the session's parameter
//! map; see `SessionManager::assemble_params` for the standard bindings.

use rk_protocol::pipeline_models::{ArtifactCheckSpec, PipelineSpec, StageSpec};
use rk_protocol::progress_models::{ProgressSpec, StepPattern};

fn stage(description: &str, command: &[&str], progress: Option<ProgressSpec>) -> StageSpec {
    StageSpec {
        description: description.to_string(),
        command: command.iter().map(|arg| arg.to_string()).collect(),
        progress,
    }
}

fn step(pattern: &str, label: &str) -> StepPattern {
    StepPattern {
        pattern: pattern.to_string(),
        label: label.to_string(),
    }
}

/// COLMAP-phase progress for ns-process-data runs.
fn process_data_steps(with_frames: bool) -> ProgressSpec {
    let mut steps = Vec::new();
    if with_frames {
        steps.push(step("converting video", "Extracting frames"));
    }
    steps.extend([
        step("feature extraction", "Extracting features"),
        step("feature matching", "Matching features"),
        step("sparse reconstruction|bundle adjustment", "Solving camera poses"),
        step("saving|transforms", "Writing transforms"),
    ]);
    ProgressSpec::Steps { steps }
}

fn process_video() -> PipelineSpec {
    PipelineSpec {
        name: "process-video".to_string(),
        description: "Extract frames from a video and solve camera poses with COLMAP".to_string(),
        stages: vec![stage(
            "COLMAP processing (video)",
            &[
                "ns-process-data",
                "video",
                "--data",
                "${input}",
                "--output-dir",
                "${output}",
                "--num-frames-target",
                "${num_frames}",
            ],
            Some(process_data_steps(true)),
        )],
        post_condition: Some(ArtifactCheckSpec::File {
            path: "${output}/transforms.json".to_string(),
        }),
    }
}

fn process_images() -> PipelineSpec {
    PipelineSpec {
        name: "process-images".to_string(),
        description: "Solve camera poses for an image folder with COLMAP".to_string(),
        stages: vec![stage(
            "COLMAP processing (images)",
            &[
                "ns-process-data",
                "images",
                "--data",
                "${input}",
                "--output-dir",
                "${output}",
            ],
            Some(process_data_steps(false)),
        )],
        post_condition: Some(ArtifactCheckSpec::File {
            path: "${output}/transforms.json".to_string(),
        }),
    }
}

/// The composite chain: independent tools wired through shared paths.
fn glomap_reconstruct() -> PipelineSpec {
    PipelineSpec {
        name: "glomap-reconstruct".to_string(),
        description: "Frame extraction, COLMAP features/matches, GLOMAP global mapping"
            .to_string(),
        stages: vec![
            stage(
                "Frame extraction",
                &[
                    "ffmpeg",
                    "-i",
                    "${input}",
                    "-vf",
                    "fps=${fps}",
                    "${frames_dir}/%05d.jpg",
                ],
                None,
            ),
            stage(
                "COLMAP feature extraction",
                &[
                    "colmap",
                    "feature_extractor",
                    "--database_path",
                    "${workdir}/database.db",
                    "--image_path",
                    "${frames_dir}",
                ],
                Some(ProgressSpec::Ratio {
                    pattern: r"\[(\d+)/(\d+)\]".to_string(),
                }),
            ),
            stage(
                "COLMAP feature matching",
                &[
                    "colmap",
                    "exhaustive_matcher",
                    "--database_path",
                    "${workdir}/database.db",
                ],
                Some(ProgressSpec::Ratio {
                    pattern: r"\[(\d+)/(\d+)".to_string(),
                }),
            ),
            stage(
                "GLOMAP global mapping",
                &[
                    "glomap",
                    "mapper",
                    "--database_path",
                    "${workdir}/database.db",
                    "--image_path",
                    "${frames_dir}",
                    "--output_path",
                    "${workdir}/sparse",
                ],
                Some(ProgressSpec::Steps {
                    steps: vec![
                        step("view graph", "Building view graph"),
                        step("global positioning|translation", "Global positioning"),
                        step("bundle adjustment", "Bundle adjustment"),
                        step("retriangulation", "Retriangulation"),
                    ],
                }),
            ),
            stage(
                "Convert to transforms",
                &[
                    "ns-process-data",
                    "images",
                    "--data",
                    "${frames_dir}",
                    "--output-dir",
                    "${output}",
                    "--skip-colmap",
                    "--colmap-model-path",
                    "${workdir}/sparse/0",
                ],
                None,
            ),
        ],
        post_condition: Some(ArtifactCheckSpec::File {
            path: "${output}/transforms.json".to_string(),
        }),
    }
}

fn train(model: &str) -> PipelineSpec {
    PipelineSpec {
        name: format!("train-{}", model),
        description: format!("Train a {} model on processed data", model),
        stages: vec![StageSpec {
            description: format!("ns-train {}", model),
            command: [
                "ns-train",
                model,
                "--data",
                "${data}",
                "--output-dir",
                "${outputs_root}",
                "--project-name",
                "${project}",
                "--timestamp",
                "${timestamp}",
                "--viewer.quit-on-train-completion",
                "True",
                "--viewer.websocket-port",
                "7007",
                "--vis",
                "viewer",
            ]
            .iter()
            .map(|arg| arg.to_string())
            .collect(),
            progress: Some(ProgressSpec::Ratio {
                pattern: r"(\d+)\s*/\s*(\d+)".to_string(),
            }),
        }],
        // Training writes its checkpoint config under a timestamped run
        // directory; any config.yml below the project root counts.
        post_condition: Some(ArtifactCheckSpec::Within {
            root: "${outputs_root}/${project}".to_string(),
            suffix: "config.yml".to_string(),
        }),
    }
}

fn export(format: &str) -> PipelineSpec {
    PipelineSpec {
        name: format!("export-{}", format),
        description: format!("Export {} from the newest checkpoint", format),
        stages: vec![stage(
            &format!("ns-export {}", format),
            &[
                "ns-export",
                format,
                "--load-config",
                "${config}",
                "--output-dir",
                "${export_dir}",
            ],
            None,
        )],
        post_condition: Some(ArtifactCheckSpec::Within {
            root: "${export_dir}".to_string(),
            suffix: ".ply".to_string(),
        }),
    }
}

fn sugar_train() -> PipelineSpec {
    PipelineSpec {
        name: "sugar-train".to_string(),
        description: "SuGaR surface-aligned Gaussian training in its container".to_string(),
        stages: vec![stage(
            "SuGaR training",
            &[
                "${docker}",
                "exec",
                "${sugar_container}",
                "python3",
                "${scripts_dir}/sugar_train.py",
                "--data",
                "${data}",
                "--output",
                "${output}",
            ],
            Some(ProgressSpec::Steps {
                steps: vec![
                    step("pre-training", "3DGS pre-training"),
                    step("coarse", "SuGaR coarse optimization"),
                    step("refin", "Refined mesh extraction"),
                ],
            }),
        )],
        post_condition: Some(ArtifactCheckSpec::Within {
            root: "${output}".to_string(),
            suffix: ".obj".to_string(),
        }),
    }
}

fn dgs_train() -> PipelineSpec {
    PipelineSpec {
        name: "2dgs-train".to_string(),
        description: "2D Gaussian Splatting training and mesh extraction in its container"
            .to_string(),
        stages: vec![stage(
            "2DGS training",
            &[
                "${docker}",
                "exec",
                "${dgs_container}",
                "python3",
                "${scripts_dir}/2dgs_train.py",
                "--data",
                "${data}",
                "--output",
                "${output}",
            ],
            Some(ProgressSpec::Steps {
                steps: vec![
                    step("training", "Training 2DGS"),
                    step("extract", "Extracting mesh"),
                    step("export", "Exporting PLY"),
                ],
            }),
        )],
        post_condition: Some(ArtifactCheckSpec::Within {
            root: "${output}".to_string(),
            suffix: ".ply".to_string(),
        }),
    }
}

fn convert_glb() -> PipelineSpec {
    PipelineSpec {
        name: "convert-glb".to_string(),
        description: "Convert an exported PLY mesh to GLB".to_string(),
        stages: vec![stage(
            "PLY to GLB conversion",
            &[
                "python3",
                "${scripts_dir}/convert_ply_to_glb.py",
                "--input",
                "${input_file}",
                "--output",
                "${output_file}",
            ],
            None,
        )],
        post_condition: Some(ArtifactCheckSpec::File {
            path: "${output_file}".to_string(),
        }),
    }
}

/// Every pipeline the engine ships with.
pub fn builtin_pipelines() -> Vec<PipelineSpec> {
    vec![
        process_video(),
        process_images(),
        glomap_reconstruct(),
        train("splatfacto"),
        train("nerfacto"),
        export("gaussian-splat"),
        export("pointcloud"),
        export("mesh"),
        sugar_train(),
        dgs_train(),
        convert_glb(),
    ]
}
