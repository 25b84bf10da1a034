//! Artifact presence checks and newest-first artifact discovery.
//!
//! The engine never reads the artifacts the external tools produce; it
//! only verifies they exist. Discovery is used twice: to evaluate a
//! pipeline's post-condition, and to locate the most recent checkpoint
//! config among several training runs (most-recently-modified wins, the
//! convention the export flow relies on).

use rk_protocol::ArtifactCheck;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Evaluate a rendered post-condition.
pub fn check(check: &ArtifactCheck) -> bool {
    match check {
        ArtifactCheck::File { path } => path.is_file(),
        ArtifactCheck::Within { root, suffix } => {
            !newest_matching(root, suffix).is_empty()
        }
    }
}

/// All files under `root` whose name ends with `suffix`, newest first.
///
/// Returns an empty list when `root` does not exist. Files whose
/// modification time cannot be read sort last.
pub fn newest_matching(root: &Path, suffix: &str) -> Vec<PathBuf> {
    let mut found: Vec<(SystemTime, PathBuf)> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(suffix))
        })
        .map(|entry| {
            let modified = entry
                .metadata()
                .ok()
                .and_then(|meta| meta.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.into_path())
        })
        .collect();

    found.sort_by(|a, b| b.0.cmp(&a.0));
    found.into_iter().map(|(_, path)| path).collect()
}

/// The most recent training checkpoint config for a project, if any.
///
/// Training runs write a `config.yml` under their timestamped output
/// directory; the newest one is the checkpoint exports should load.
pub fn latest_checkpoint(outputs_dir: &Path, project: &str) -> Option<PathBuf> {
    newest_matching(&outputs_dir.join(project), "config.yml")
        .into_iter()
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_file_check() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("transforms.json");

        let missing = ArtifactCheck::File { path: path.clone() };
        assert!(!check(&missing));

        fs::write(&path, "{}").unwrap();
        assert!(check(&missing));
    }

    #[test]
    fn test_file_check_rejects_directories() {
        let dir = tempdir().unwrap();
        let condition = ArtifactCheck::File {
            path: dir.path().to_path_buf(),
        };
        assert!(!check(&condition));
    }

    #[test]
    fn test_within_check_searches_recursively() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("point_cloud/iteration_30000");
        fs::create_dir_all(&nested).unwrap();

        let condition = ArtifactCheck::Within {
            root: dir.path().to_path_buf(),
            suffix: ".ply".to_string(),
        };
        assert!(!check(&condition));

        fs::write(nested.join("point_cloud.ply"), "ply").unwrap();
        assert!(check(&condition));
    }

    #[test]
    fn test_within_check_on_missing_root() {
        let condition = ArtifactCheck::Within {
            root: PathBuf::from("/definitely/not/a/real/dir"),
            suffix: ".ply".to_string(),
        };
        assert!(!check(&condition));
    }

    #[test]
    fn test_newest_matching_orders_by_mtime() {
        let dir = tempdir().unwrap();
        let older = dir.path().join("run_a/config.yml");
        let newer = dir.path().join("run_b/config.yml");
        fs::create_dir_all(older.parent().unwrap()).unwrap();
        fs::create_dir_all(newer.parent().unwrap()).unwrap();

        fs::write(&older, "a").unwrap();
        // Filesystem mtime granularity can be a full second
        std::thread::sleep(std::time::Duration::from_millis(1100));
        fs::write(&newer, "b").unwrap();

        let found = newest_matching(dir.path(), "config.yml");
        assert_eq!(found, vec![newer, older]);
    }

    #[test]
    fn test_latest_checkpoint_picks_newest_run() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("garden/splatfacto/2026-01-01_120000");
        let second = dir.path().join("garden/splatfacto/2026-01-02_120000");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();

        fs::write(first.join("config.yml"), "old").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        fs::write(second.join("config.yml"), "new").unwrap();

        let found = latest_checkpoint(dir.path(), "garden").unwrap();
        assert_eq!(found, second.join("config.yml"));
    }

    #[test]
    fn test_latest_checkpoint_none_for_untrained_project() {
        let dir = tempdir().unwrap();
        assert!(latest_checkpoint(dir.path(), "garden").is_none());
    }
}
