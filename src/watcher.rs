//! Watches the config file and signals when it should be reloaded.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::{clog_debug, clog_warn, Result};

const DEBOUNCE: Duration = Duration::from_millis(200);

/// Keeps the underlying watcher alive; dropping it stops notifications.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl ConfigWatcher {
    /// Send `()` on `tx` once `path` has been created or modified and no
    /// further change arrived for [`DEBOUNCE`].
    ///
    /// The parent directory is watched rather than the file itself so that
    /// editors which save by rename are still seen.
    pub fn spawn(path: &Path, tx: Sender<()>) -> Result<Self> {
        let target = path.to_path_buf();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let file_name = target.file_name().map(|n| n.to_os_string());
        let (raw_tx, raw_rx) = crossbeam_channel::unbounded::<()>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        clog_warn!("Config watcher error: {}", e);
                        return;
                    }
                };
                if is_relevant(&event, file_name.as_deref()) {
                    clog_debug!("Config file event: {:?}", event.paths);
                    let _ = raw_tx.send(());
                }
            },
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        clog_debug!("Watching {} for config changes", dir.display());

        thread::spawn(move || debounce(raw_rx, tx, DEBOUNCE));

        Ok(Self {
            _watcher: watcher,
            path: target,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Forward one `()` per burst on `raw`, after the burst has been quiet for
/// `quiet`. Returns when either side of the channel pair is gone.
fn debounce(raw: Receiver<()>, out: Sender<()>, quiet: Duration) {
    while raw.recv().is_ok() {
        loop {
            match raw.recv_timeout(quiet) {
                Ok(()) => continue,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
        clog_debug!("Config change settled, requesting reload");
        if out.send(()).is_err() {
            return;
        }
    }
}

fn is_relevant(event: &Event, file_name: Option<&std::ffi::OsStr>) -> bool {
    match event.kind {
        EventKind::Modify(_) | EventKind::Create(_) => {}
        _ => return false,
    }
    let Some(file_name) = file_name else {
        return false;
    };
    event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name))
}
