use file_sorter_core::EnabledCategories;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::organizer::Organizer;
use crate::types::OrganizeReport;

/// Organize `root` once, then again whenever files appear in it.
///
/// Runs until the watcher shuts down. Each pass waits for `debounce` of
/// quiet so files still being written are not moved mid-copy. Passes that
/// found nothing to do are not reported.
pub fn watch_directory<F>(
    organizer: &Organizer,
    root: &Path,
    enabled: &EnabledCategories,
    debounce: Duration,
    on_report: F,
) -> anyhow::Result<()>
where
    F: FnMut(&OrganizeReport),
{
    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(tx, notify::Config::default())?;
    watcher.watch(root, RecursiveMode::NonRecursive)?;
    info!(root = %root.display(), "watching");

    drive(organizer, root, enabled, debounce, rx, on_report)?;
    Ok(())
}

/// Event loop behind [`watch_directory`]; returns the number of passes run
/// once the channel closes.
fn drive<F>(
    organizer: &Organizer,
    root: &Path,
    enabled: &EnabledCategories,
    debounce: Duration,
    rx: Receiver<notify::Result<Event>>,
    mut on_report: F,
) -> anyhow::Result<usize>
where
    F: FnMut(&OrganizeReport),
{
    let mut passes = 0;
    let mut run = |passes: &mut usize| -> anyhow::Result<()> {
        let report = organizer.organize(root, enabled)?;
        *passes += 1;
        if !report.is_empty() {
            on_report(&report);
        }
        Ok(())
    };

    run(&mut passes)?;

    while let Ok(event) = rx.recv() {
        if !triggers_pass(&event) {
            continue;
        }

        // Let a burst of events settle into one pass.
        while rx.recv_timeout(debounce).is_ok() {}
        debug!("change detected");
        run(&mut passes)?;
    }

    Ok(passes)
}

fn triggers_pass(event: &notify::Result<Event>) -> bool {
    match event {
        Ok(event) => matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)),
        Err(e) => {
            warn!(error = %e, "watch error");
            false
        }
    }
}
