use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::DocgenResult;

/// Filesystem change relevant to documentation generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Changed(PathBuf),
    Removed(PathBuf),
}

/// Recursive watcher over the components directory.
pub struct ComponentWatcher {
    _watcher: RecommendedWatcher,
    receiver: mpsc::Receiver<WatchEvent>,
}

impl ComponentWatcher {
    pub fn new(root: &Path) -> DocgenResult<Self> {
        let (tx, rx) = mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                for watch_event in classify_event(&event) {
                    if tx.blocking_send(watch_event).is_err() {
                        return;
                    }
                }
            }
        })?;

        watcher.watch(root, RecursiveMode::Recursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    pub async fn next_event(&mut self) -> Option<WatchEvent> {
        self.receiver.recv().await
    }
}

fn classify_event(event: &Event) -> Vec<WatchEvent> {
    let wrap: fn(PathBuf) -> WatchEvent = match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => WatchEvent::Changed,
        EventKind::Remove(_) => WatchEvent::Removed,
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter(|path| !path.is_dir())
        .cloned()
        .map(wrap)
        .collect()
}
