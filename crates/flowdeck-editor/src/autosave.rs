//! Background auto-save.
//!
//! A session with auto-save enabled runs one background task that calls
//! save on a fixed cadence. The save itself decides whether there is
//! anything to do, so a cycle on a clean document is a no-op.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use crate::session::SessionCore;

/// Handle to a running auto-save task. Dropping it stops the task.
#[derive(Debug)]
pub(crate) struct AutosaveHandle {
    cancel: CancellationToken,
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn the auto-save task for a session.
pub(crate) fn spawn_autosave(core: Arc<SessionCore>, period: Duration) -> AutosaveHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let span = info_span!("autosave", flow_id = %core.flow_id());

    tokio::spawn(
        async move {
            let mut interval = time::interval(period);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("Auto-save task stopping");
                        break;
                    }
                    _ = interval.tick() => {}
                }

                match core.save_now().await {
                    Ok(status) => debug!(?status, "Auto-save cycle finished"),
                    Err(source) => {
                        warn!(%source, "Auto-save failed");
                        core.note_save_failure(&source).await;
                    }
                }
            }
        }
        .instrument(span),
    );

    AutosaveHandle { cancel }
}
