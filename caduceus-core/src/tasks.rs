//! First-error task-group helpers
//!
//! Download, preparation and copy fan-outs all share the same contract: await
//! a set of spawned tasks, stop at the first failure, cancel whatever has not
//! finished, and propagate the failing task's error.

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::task::{JoinError, JoinHandle};

use crate::error::{CaduceusError, CaduceusResult};
use crate::shutdown::ShutdownSignal;

/// Await every task; on the first failure abort the rest and propagate.
pub async fn process_tasks(handles: Vec<JoinHandle<CaduceusResult<()>>>) -> CaduceusResult<()> {
    let aborts: Vec<_> = handles.iter().map(|handle| handle.abort_handle()).collect();
    let mut stream: FuturesUnordered<_> = handles.into_iter().collect();

    while let Some(joined) = stream.next().await {
        if let Err(err) = flatten_join(joined) {
            for abort in &aborts {
                abort.abort();
            }
            return Err(err);
        }
    }

    Ok(())
}

/// [`process_tasks`] for worker groups coordinated through the shutdown flag.
///
/// The first failure sets the flag before peers are cancelled. If every task
/// returned cleanly but the flag is set (a worker signalled without
/// surfacing its own error), `fallback` is raised instead.
pub async fn process_tasks_with_shutdown(
    handles: Vec<JoinHandle<CaduceusResult<()>>>,
    shutdown: &ShutdownSignal,
    fallback: impl FnOnce() -> CaduceusError,
) -> CaduceusResult<()> {
    let aborts: Vec<_> = handles.iter().map(|handle| handle.abort_handle()).collect();
    let mut stream: FuturesUnordered<_> = handles.into_iter().collect();

    while let Some(joined) = stream.next().await {
        if let Err(err) = flatten_join(joined) {
            shutdown.set();
            for abort in &aborts {
                abort.abort();
            }
            return Err(err);
        }
    }

    if shutdown.is_set() {
        return Err(fallback());
    }

    Ok(())
}

fn flatten_join(joined: Result<CaduceusResult<()>, JoinError>) -> CaduceusResult<()> {
    match joined {
        Ok(result) => result,
        Err(err) if err.is_cancelled() => Ok(()),
        Err(err) => Err(CaduceusError::Setup(format!("worker task panicked: {err}"))),
    }
}
