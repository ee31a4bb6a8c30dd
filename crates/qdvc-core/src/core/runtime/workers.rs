use std::num::NonZeroUsize;
use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;

use tracing::debug;

const MAX_WORKERS: usize = 64;
// File tasks mostly wait on disk and network, so oversubscribe the cores.
const WORKERS_PER_CORE: usize = 4;

/// Worker count for `total` queued items, honoring an explicit request.
pub(crate) fn worker_count(requested: Option<usize>, total: usize) -> usize {
    let available = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
        .max(1);
    let max_workers = requested
        .unwrap_or(available * WORKERS_PER_CORE)
        .clamp(1, MAX_WORKERS);
    max_workers.min(total.max(1))
}

/// Runs `task` over every item on a scoped worker pool draining a shared queue.
///
/// Items carry no ordering guarantee relative to each other. The call returns
/// only after every item has been processed.
pub(crate) fn fan_out<T, F>(items: Vec<T>, requested: Option<usize>, task: F)
where
    T: Send,
    F: Fn(T) + Sync,
{
    if items.is_empty() {
        return;
    }
    let workers = worker_count(requested, items.len());
    debug!(workers, items = items.len(), "dispatching file tasks");

    let (job_tx, job_rx) = mpsc::channel();
    for item in items {
        // The receiver lives until the end of this function.
        let _ = job_tx.send(item);
    }
    drop(job_tx);

    let job_rx = Mutex::new(job_rx);
    let task = &task;
    let job_rx = &job_rx;
    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(move || loop {
                let next = {
                    let guard = job_rx.lock().unwrap_or_else(PoisonError::into_inner);
                    guard.recv()
                };
                match next {
                    Ok(item) => task(item),
                    Err(_) => break,
                }
            });
        }
    });
}
