use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::io::task_file::STORE_FILE;

/// How long after our own write a change event is attributed to us
pub const SELF_WRITE_WINDOW: Duration = Duration::from_millis(500);

/// Events sent from the file watcher to the TUI event loop.
#[derive(Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// The task store changed on disk.
    Changed(PathBuf),
}

/// Watches the data directory for changes to the task store.
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<StoreEvent>,
    last_own_write: Option<Instant>,
}

impl StoreWatcher {
    /// Start watching `data_dir`, creating it if needed.
    /// Returns a `StoreWatcher` whose `poll()` method should be called each tick.
    pub fn start(data_dir: &Path) -> Result<Self, notify::Error> {
        std::fs::create_dir_all(data_dir)?;
        let (tx, rx) = mpsc::channel();
        let store_path = data_dir.join(STORE_FILE);

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                if !is_relevant_kind(&event.kind) {
                    return;
                }
                // the atomic rename shows up as a create of the store file
                if event.paths.iter().any(|p| p.file_name() == store_path.file_name()) {
                    let _ = tx.send(StoreEvent::Changed(store_path.clone()));
                }
            },
            Config::default(),
        )?;

        watcher.watch(data_dir, RecursiveMode::NonRecursive)?;
        Ok(StoreWatcher {
            _watcher: watcher,
            rx,
            last_own_write: None,
        })
    }

    /// Record that this process just wrote the store
    pub fn note_own_write(&mut self, at: Instant) {
        self.last_own_write = Some(at);
    }

    /// Non-blocking poll. Returns true when the store changed because of
    /// another process since the last poll.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut changed = false;
        while let Ok(StoreEvent::Changed(_)) = self.rx.try_recv() {
            changed = true;
        }
        changed && !within_window(self.last_own_write, now)
    }
}

fn is_relevant_kind(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

fn within_window(last_own_write: Option<Instant>, now: Instant) -> bool {
    last_own_write.is_some_and(|at| now.saturating_duration_since(at) < SELF_WRITE_WINDOW)
}
