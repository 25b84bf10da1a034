use rk_protocol::*;
use std::collections::HashMap;
use uuid::Uuid;

#[test]
fn test_pipeline_spec_deserialization_from_yaml() {
    // Shape of a user pipeline in .recon-kit/pipelines/*.yaml
    let yaml_str = r#"
name: process-video
description: Extract frames and solve camera poses from a video
stages:
  - description: "COLMAP processing"
    command:
      - ns-process-data
      - video
      - --data
      - "${input}"
      - --output-dir
      - "${output}"
    progress:
      type: steps
      steps:
        - pattern: "converting video"
          label: "Extracting frames"
        - pattern: "feature extraction"
          label: "Extracting features"
post-condition:
  type: file
  path: "${output}/transforms.json"
"#;

    let spec: PipelineSpec =
        serde_yaml::from_str(yaml_str).expect("Failed to deserialize PipelineSpec");

    assert_eq!(spec.name, "process-video");
    assert_eq!(spec.stages.len(), 1);
    assert_eq!(spec.stages[0].command[0], "ns-process-data");
    assert!(matches!(
        spec.stages[0].progress,
        Some(ProgressSpec::Steps { ref steps }) if steps.len() == 2
    ));
    assert_eq!(
        spec.post_condition,
        Some(ArtifactCheckSpec::File {
            path: "${output}/transforms.json".to_string()
        })
    );
}

#[test]
fn test_progress_spec_variants_from_yaml() {
    let iteration: ProgressSpec = serde_yaml::from_str(
        r#"
type: iteration
pattern: "iteration (\\d+)"
total: 30000
"#,
    )
    .expect("Failed to deserialize iteration spec");
    assert_eq!(
        iteration,
        ProgressSpec::Iteration {
            pattern: "iteration (\\d+)".to_string(),
            total: 30000
        }
    );

    let ratio: ProgressSpec = serde_yaml::from_str(
        r#"
type: ratio
pattern: "(\\d+)/(\\d+)"
"#,
    )
    .expect("Failed to deserialize ratio spec");
    assert_eq!(
        ratio,
        ProgressSpec::Ratio {
            pattern: "(\\d+)/(\\d+)".to_string()
        }
    );
}

#[test]
fn test_op_serialization_round_trip() {
    let mut params = HashMap::new();
    params.insert("project".to_string(), "garden".to_string());

    let op = Op::RunPipeline {
        name: "train-splatfacto".to_string(),
        params,
    };

    let json = serde_json::to_string(&op).expect("Failed to serialize Op");
    assert!(json.contains(r#""type":"runPipeline"#));

    let back: Op = serde_json::from_str(&json).expect("Failed to deserialize Op");
    assert!(matches!(back, Op::RunPipeline { name, .. } if name == "train-splatfacto"));
}

#[test]
fn test_event_serialization_tagged_format() {
    let event = Event::LogLine {
        run_id: Uuid::new_v4(),
        line: "Loaded 300 images".to_string(),
    };

    let json = serde_json::to_value(&event).expect("Failed to serialize Event");
    assert_eq!(json["type"], "logLine");
    assert_eq!(json["payload"]["line"], "Loaded 300 images");
}

#[test]
fn test_pipeline_result_round_trip() {
    let result = PipelineResult {
        pipeline: "glomap-reconstruct".to_string(),
        stages_total: 5,
        succeeded_stages: 1,
        failed_stage: Some(1),
        failed_stage_description: Some("COLMAP feature extraction".to_string()),
        exit_code: Some(1),
        post_condition_met: false,
        outcome: RunOutcome::StageFailed {
            stage: 1,
            exit_code: 1,
        },
    };

    let json = serde_json::to_string(&result).expect("Failed to serialize PipelineResult");
    let back: PipelineResult =
        serde_json::from_str(&json).expect("Failed to deserialize PipelineResult");

    assert_eq!(back, result);
    assert!(!back.is_success());
}

#[test]
fn test_container_status_serialization() {
    let json =
        serde_json::to_string(&ContainerStatus::BuiltNotRunning).expect("Failed to serialize");
    assert_eq!(json, r#""built-not-running""#);

    let back: ContainerStatus = serde_json::from_str(r#""absent""#).expect("Failed to deserialize");
    assert_eq!(back, ContainerStatus::Absent);
}

#[test]
fn test_global_config_defaults_from_empty_toml() {
    let config: GlobalConfig = toml::from_str("").expect("Empty config should use defaults");

    assert_eq!(
        config.data_dir,
        std::path::PathBuf::from("/workspace/data/nerfstudio")
    );
    assert_eq!(config.probe_names(), vec!["sugar", "2dgs"]);
    assert_eq!(config.docker_binary, "docker");
    assert_eq!(config.probe_timeout_secs, 3);
}

#[test]
fn test_global_config_partial_toml_overrides() {
    let config: GlobalConfig = toml::from_str(
        r#"
outputs-dir = "/srv/recon/outputs"
sugar-container = "sugar-trainer"
"#,
    )
    .expect("Partial config should parse");

    assert_eq!(
        config.outputs_dir,
        std::path::PathBuf::from("/srv/recon/outputs")
    );
    assert_eq!(config.probe_names(), vec!["sugar-trainer", "2dgs"]);
    // Untouched fields keep their defaults
    assert_eq!(
        config.uploads_dir,
        std::path::PathBuf::from("/workspace/data/uploads")
    );
}
