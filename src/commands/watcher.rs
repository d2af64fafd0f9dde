use notify::Watcher;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Watches the directory holding `history_path` and sends the path on
/// `changes` once writes to that file have been quiet for `debounce`.
/// The watcher thread exits when the receiving side is dropped.
pub fn start_history_watcher(
    history_path: &Path,
    debounce: Duration,
    changes: UnboundedSender<PathBuf>,
) -> Result<(), String> {
    let target = history_path.to_path_buf();
    let file_name = target
        .file_name()
        .map(|name| name.to_os_string())
        .ok_or_else(|| format!("Not a file path: {}", target.display()))?;
    let watch_dir = target
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let (tx, rx) = mpsc::channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) => {
                let _ = tx.send(event);
            }
            Err(e) => log::warn!("History watcher error: {e}"),
        }
    })
    .map_err(|e| format!("Watcher init error: {e}"))?;

    watcher
        .watch(&watch_dir, notify::RecursiveMode::NonRecursive)
        .map_err(|e| format!("Watch error: {e}"))?;
    log::info!("Watching {} for changes", target.display());

    std::thread::spawn(move || {
        let _watcher = watcher; // Keep watcher alive
        let mut pending: Option<Instant> = None;

        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(event) => {
                    let touches_history = !event.kind.is_access()
                        && event
                            .paths
                            .iter()
                            .any(|path| path.file_name() == Some(file_name.as_os_str()));
                    if touches_history {
                        pending = Some(Instant::now());
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }

            if changes.is_closed() {
                break;
            }

            if pending.is_some_and(|at| at.elapsed() >= debounce) {
                pending = None;
                log::debug!("{} changed", target.display());
                if changes.send(target.clone()).is_err() {
                    break;
                }
            }
        }
    });

    Ok(())
}
