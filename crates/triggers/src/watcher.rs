//! Folder-watch trigger firing decisions.
//!
//! New-file detection is a set difference between polls: files matching the
//! glob pattern that are not in the known set fire once each and are then
//! remembered. The known set only grows, so a deleted and later recreated
//! path never fires again for the lifetime of the watcher; scan errors are
//! treated as an empty listing rather than a fault.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flowdeck_types::FolderWatchTriggerConfig;
use tracing::debug;

/// Poll period of the folder-watch trigger loop.
pub const WATCH_POLL: Duration = Duration::from_secs(2);

/// Detection state of one folder-watch trigger.
#[derive(Debug, Clone)]
pub struct FolderWatchState {
    config: FolderWatchTriggerConfig,
    known: HashSet<PathBuf>,
}

impl FolderWatchState {
    pub fn new(config: FolderWatchTriggerConfig) -> Self {
        Self { config, known: HashSet::new() }
    }

    pub fn config(&self) -> &FolderWatchTriggerConfig {
        &self.config
    }

    fn scan(&self) -> HashSet<PathBuf> {
        let pattern = Path::new(&self.config.watch_folder).join(&self.config.file_pattern);
        match glob::glob(&pattern.to_string_lossy()) {
            Ok(paths) => paths.filter_map(|entry| entry.ok()).collect(),
            Err(_) => HashSet::new(),
        }
    }

    /// Records the current folder contents as already seen, so files present
    /// before watching began never fire.
    pub fn snapshot(&mut self) {
        self.known = self.scan();
        debug!(trigger = %self.config.trigger_id, known = self.known.len(), "watch baseline recorded");
    }

    /// Returns files never seen before, each reported exactly once.
    pub fn poll(&mut self) -> Vec<PathBuf> {
        let current = self.scan();
        let new_files: Vec<PathBuf> = current.difference(&self.known).cloned().collect();
        // insert only, never replace: a path that disappears stays known
        self.known.extend(new_files.iter().cloned());
        new_files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn state_for(folder: &Path, pattern: &str) -> FolderWatchState {
        FolderWatchState::new(FolderWatchTriggerConfig {
            trigger_id: "w1".into(),
            flow_path: "flows/import.yaml".into(),
            watch_folder: folder.to_string_lossy().into_owned(),
            file_pattern: pattern.into(),
        })
    }

    #[test]
    fn pre_existing_files_never_fire() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("old.csv"), "").expect("write");

        let mut state = state_for(dir.path(), "*.csv");
        state.snapshot();
        assert!(state.poll().is_empty());
    }

    #[test]
    fn a_new_matching_file_fires_exactly_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut state = state_for(dir.path(), "*.csv");
        state.snapshot();

        fs::write(dir.path().join("fresh.csv"), "").expect("write");
        let fired = state.poll();
        assert_eq!(fired.len(), 1);
        assert!(fired[0].ends_with("fresh.csv"));

        assert!(state.poll().is_empty());
    }

    #[test]
    fn non_matching_files_are_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut state = state_for(dir.path(), "*.csv");
        state.snapshot();

        fs::write(dir.path().join("note.txt"), "").expect("write");
        assert!(state.poll().is_empty());
    }

    #[test]
    fn missing_folder_scans_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut state = state_for(&dir.path().join("absent"), "*");
        state.snapshot();
        assert!(state.poll().is_empty());
    }

    #[test]
    fn recreated_file_never_fires_again() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.csv");
        let mut state = state_for(dir.path(), "*.csv");
        state.snapshot();

        fs::write(&path, "").expect("write");
        assert_eq!(state.poll().len(), 1);

        fs::remove_file(&path).expect("remove");
        assert!(state.poll().is_empty());

        fs::write(&path, "").expect("rewrite");
        assert!(state.poll().is_empty());
    }
}
