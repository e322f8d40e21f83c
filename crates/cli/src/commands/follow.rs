// Follow a run until it leaves the active states

use std::time::Duration;

use anyhow::Result;
use parley_core::{SyncController, SyncView};
use tokio::time::{sleep_until, Instant};

use crate::output::TimelinePrinter;

/// Watch controller snapshots, printing new timeline entries in text mode.
///
/// Returns the first snapshot whose run is idle or terminal.
pub async fn follow(
    controller: &SyncController,
    printer: &mut TimelinePrinter,
    print: bool,
    timeout_secs: u64,
) -> Result<SyncView> {
    let deadline = Instant::now() + Duration::from_secs(timeout_secs);
    let mut views = controller.subscribe();
    let mut degraded_reported = false;

    loop {
        let view = views.borrow_and_update().clone();

        if print {
            printer.print_new(&view);
        }
        if view.degraded && !degraded_reported {
            degraded_reported = true;
            eprintln!("Live updates unavailable, polling for progress");
        }
        if !view.status.is_some_and(|s| s.is_active()) {
            return Ok(view);
        }

        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    return Ok(controller.view());
                }
            }
            _ = sleep_until(deadline) => {
                tracing::warn!(run_id = ?view.run_id, status = %view.status_label(), "Gave up waiting for run");
                anyhow::bail!("Timeout waiting for run to finish (last status: {})", view.status_label());
            }
        }
    }
}
