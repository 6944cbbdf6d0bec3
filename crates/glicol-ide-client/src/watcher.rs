//! Workspace watcher for the settings file.
//!
//! The watcher observes the workspace root recursively and forwards
//! matching filesystem events to the server as
//! `workspace/didChangeWatchedFiles` notifications. Watcher errors are
//! logged and never tear down the session.

use std::path::{Path, PathBuf};
use std::sync::Weak;

use lsp_types::{FileChangeType, FileEvent};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use glicol_ide_config::SettingsWatchPattern;

use crate::client::ClientShared;
use crate::errors::ClientError;
use crate::uri::file_uri;

/// Log target for watcher operations.
const WATCHER_TARGET: &str = "glicol_ide_client::watcher";

/// Watches the workspace and forwards settings-file changes to the server.
///
/// Dropping the watcher uninstalls it; the callback holds only a weak
/// session reference so a stopped session is never revived.
#[derive(Debug)]
pub(crate) struct SettingsWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl SettingsWatcher {
    /// Installs a recursive watcher rooted at the workspace directory.
    pub(crate) fn spawn(
        root: &Path,
        pattern: SettingsWatchPattern,
        session: Weak<ClientShared>,
    ) -> Result<Self, ClientError> {
        let watch_root = root.to_path_buf();
        let event_root = watch_root.clone();

        let mut watcher = RecommendedWatcher::new(
            move |outcome: Result<Event, notify::Error>| match outcome {
                Ok(event) => {
                    let changes = settings_changes(&event, &pattern, &event_root);
                    if changes.is_empty() {
                        return;
                    }
                    let Some(session) = session.upgrade() else {
                        return;
                    };
                    if let Err(error) = session.notify_watched_files(changes) {
                        warn!(
                            target: WATCHER_TARGET,
                            %error,
                            "failed to forward watched file changes"
                        );
                    }
                }
                Err(error) => {
                    warn!(target: WATCHER_TARGET, %error, "settings watcher error");
                }
            },
            notify::Config::default(),
        )
        .map_err(|source| ClientError::WatchFailed {
            path: watch_root.display().to_string(),
            source,
        })?;

        watcher
            .watch(&watch_root, RecursiveMode::Recursive)
            .map_err(|source| ClientError::WatchFailed {
                path: watch_root.display().to_string(),
                source,
            })?;

        debug!(
            target: WATCHER_TARGET,
            root = %watch_root.display(),
            "settings watcher installed"
        );

        Ok(Self {
            _watcher: watcher,
            root: watch_root,
        })
    }

    /// Directory the watcher observes.
    pub(crate) fn root(&self) -> &Path {
        self.root.as_path()
    }
}

/// Maps a filesystem event to watched-file changes for the server.
///
/// Paths are matched against the pattern relative to the workspace root so
/// the glob anchors where the host anchors it.
pub(crate) fn settings_changes(
    event: &Event,
    pattern: &SettingsWatchPattern,
    root: &Path,
) -> Vec<FileEvent> {
    let Some(change_type) = change_type_for(&event.kind) else {
        return Vec::new();
    };

    event
        .paths
        .iter()
        .filter(|path| {
            let relative = path.strip_prefix(root).unwrap_or(path);
            pattern.matches(relative)
        })
        .filter_map(|path| match file_uri(path) {
            Ok(uri) => Some(FileEvent::new(uri, change_type)),
            Err(error) => {
                debug!(
                    target: WATCHER_TARGET,
                    path = %path.display(),
                    %error,
                    "skipping unrepresentable watched path"
                );
                None
            }
        })
        .collect()
}

fn change_type_for(kind: &EventKind) -> Option<FileChangeType> {
    match kind {
        EventKind::Create(_) => Some(FileChangeType::CREATED),
        EventKind::Modify(_) => Some(FileChangeType::CHANGED),
        EventKind::Remove(_) => Some(FileChangeType::DELETED),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

#[cfg(test)]
mod tests {
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};
    use rstest::rstest;

    use super::*;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[rstest]
    fn create_events_become_created_changes() {
        let event = event(
            EventKind::Create(CreateKind::File),
            &["/workspace/.clientrc"],
        );
        let changes = settings_changes(
            &event,
            &SettingsWatchPattern::default(),
            Path::new("/workspace"),
        );

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].typ, FileChangeType::CREATED);
        assert_eq!(changes[0].uri.as_str(), "file:///workspace/.clientrc");
    }

    #[rstest]
    fn modify_and_remove_map_to_changed_and_deleted() {
        let pattern = SettingsWatchPattern::default();
        let root = Path::new("/workspace");

        let modified = settings_changes(
            &event(
                EventKind::Modify(ModifyKind::Any),
                &["/workspace/sub/.clientrc"],
            ),
            &pattern,
            root,
        );
        let removed = settings_changes(
            &event(
                EventKind::Remove(RemoveKind::File),
                &["/workspace/.clientrc"],
            ),
            &pattern,
            root,
        );

        assert_eq!(modified[0].typ, FileChangeType::CHANGED);
        assert_eq!(removed[0].typ, FileChangeType::DELETED);
    }

    #[rstest]
    fn non_settings_paths_are_filtered_out() {
        let event = event(
            EventKind::Modify(ModifyKind::Any),
            &["/workspace/track.glicol", "/workspace/.clientrc"],
        );
        let changes = settings_changes(
            &event,
            &SettingsWatchPattern::default(),
            Path::new("/workspace"),
        );

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].uri.as_str(), "file:///workspace/.clientrc");
    }

    #[rstest]
    fn access_events_are_ignored() {
        let event = event(
            EventKind::Access(AccessKind::Any),
            &["/workspace/.clientrc"],
        );
        let changes = settings_changes(
            &event,
            &SettingsWatchPattern::default(),
            Path::new("/workspace"),
        );

        assert!(changes.is_empty());
    }

    #[rstest]
    fn watcher_installs_on_an_existing_directory() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let watcher = SettingsWatcher::spawn(
            dir.path(),
            SettingsWatchPattern::default(),
            Weak::new(),
        )
        .expect("watcher failed");

        assert_eq!(watcher.root(), dir.path());
    }

    #[rstest]
    fn watching_a_missing_directory_fails() {
        let error = SettingsWatcher::spawn(
            Path::new("/nonexistent/glicol/workspace"),
            SettingsWatchPattern::default(),
            Weak::new(),
        )
        .expect_err("watcher should fail");

        assert!(matches!(error, ClientError::WatchFailed { .. }));
    }
}
