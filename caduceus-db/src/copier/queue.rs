//! Bounded queue of in-flight copy tasks plus its worker pool
//!
//! One manager lives inside each copy worker's cooperative scheduler. The
//! producer enqueues already-spawned copy tasks; queue workers await them
//! with a timeout and convert failures into the fail-fast protocol: record
//! the first error, set the shutdown signal, die. Cooperative exit drains
//! the queue before cancelling workers; abrupt exit cancels everything.

use std::sync::{Arc, Mutex};

use caduceus_core::error::{CaduceusError, CaduceusResult};
use caduceus_core::shutdown::ShutdownSignal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;

use crate::config::QueueConfig;

/// A spawned, already-running copy task.
pub type CopyTask = JoinHandle<CaduceusResult<()>>;

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<CopyTask>>>;
type FirstError = Arc<Mutex<Option<CaduceusError>>>;

pub struct AsyncQueueManager {
    sender: mpsc::Sender<CopyTask>,
    receiver: SharedReceiver,
    workers: Vec<JoinHandle<CaduceusResult<()>>>,
    first_error: FirstError,
    shutdown: ShutdownSignal,
    config: QueueConfig,
}

impl AsyncQueueManager {
    /// Launch the worker pool immediately.
    pub fn start(config: QueueConfig, shutdown: ShutdownSignal) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_max_size.max(1));
        let receiver: SharedReceiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let first_error: FirstError = Arc::new(Mutex::new(None));

        let workers = (0..config.queue_workers_number)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    receiver.clone(),
                    shutdown.clone(),
                    first_error.clone(),
                    config,
                ))
            })
            .collect();

        Self {
            sender,
            receiver,
            workers,
            first_error,
            shutdown,
            config,
        }
    }

    /// Enqueue a copy task. Backpressure: blocks while the queue is full,
    /// up to `task_timeout`.
    pub async fn enqueue_task(&self, task: CopyTask) -> CaduceusResult<()> {
        match timeout(self.config.task_timeout, self.sender.send(task)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(CaduceusError::CopyToDb(
                "queue workers are gone, cannot enqueue copy task".to_string(),
            )),
            Err(_) => Err(CaduceusError::CopyToDb(format!(
                "enqueue timed out, queue stayed full for {:?}",
                self.config.task_timeout
            ))),
        }
    }

    /// Exit the manager. Cooperative when nothing failed: the queue is
    /// drained and joined before the workers are cancelled. Abrupt when the
    /// shutdown signal is set or a worker recorded an error: pending tasks
    /// are cancelled without being awaited.
    pub async fn finish(self) -> CaduceusResult<()> {
        debug!("queue manager exiting");

        let Self {
            sender,
            receiver,
            workers,
            first_error,
            shutdown,
            config,
        } = self;
        drop(sender);

        let failed = shutdown.is_set() || first_error.lock().unwrap().is_some();

        if failed {
            abrupt_shutdown(receiver, workers, first_error).await
        } else {
            graceful_shutdown(workers, first_error, config).await
        }
    }
}

async fn graceful_shutdown(
    workers: Vec<JoinHandle<CaduceusResult<()>>>,
    first_error: FirstError,
    config: QueueConfig,
) -> CaduceusResult<()> {
    let aborts: Vec<_> = workers.iter().map(|worker| worker.abort_handle()).collect();

    let joined = timeout(config.join_timeout, futures::future::join_all(workers)).await;

    match joined {
        Ok(_) => {
            if let Some(cause) = first_error.lock().unwrap().take() {
                return Err(CaduceusError::CopyToDb(format!(
                    "a copy task failed: {cause}"
                )));
            }
            Ok(())
        }
        Err(_) => {
            for abort in &aborts {
                abort.abort();
            }
            Err(CaduceusError::CopyToDb(format!(
                "queue did not drain within {:?}",
                config.join_timeout
            )))
        }
    }
}

async fn abrupt_shutdown(
    receiver: SharedReceiver,
    workers: Vec<JoinHandle<CaduceusResult<()>>>,
    first_error: FirstError,
) -> CaduceusResult<()> {
    for worker in &workers {
        worker.abort();
    }

    // Cancel whatever is still queued without awaiting it.
    let mut receiver = receiver.lock().await;
    while let Ok(task) = receiver.try_recv() {
        task.abort();
    }

    match first_error.lock().unwrap().take() {
        Some(cause) => Err(CaduceusError::CopyToDb(format!(
            "a copy task failed: {cause}"
        ))),
        None => Err(CaduceusError::NeighbouringProcess),
    }
}

async fn worker_loop(
    worker_id: usize,
    receiver: SharedReceiver,
    shutdown: ShutdownSignal,
    first_error: FirstError,
    config: QueueConfig,
) -> CaduceusResult<()> {
    loop {
        if shutdown.is_set() {
            return Err(CaduceusError::NeighbouringProcess);
        }

        let task = { receiver.lock().await.recv().await };
        let Some(task) = task else {
            debug!(worker_id, "queue closed, worker exiting");
            return Ok(());
        };

        let abort = task.abort_handle();
        let outcome = match timeout(config.task_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(CaduceusError::CopyToDb(format!(
                "copy task panicked: {join_err}"
            ))),
            Err(_) => {
                abort.abort();
                Err(CaduceusError::CopyToDb(format!(
                    "copy task exceeded {:?}",
                    config.task_timeout
                )))
            }
        };

        if let Err(err) = outcome {
            debug!(worker_id, error = %err, "queue worker failed");
            register_error(&first_error, &err);
            shutdown.set();
            return Err(err);
        }
    }
}

fn register_error(first_error: &FirstError, err: &CaduceusError) {
    let mut slot = first_error.lock().unwrap();
    if slot.is_none() {
        *slot = Some(CaduceusError::CopyToDb(err.to_string()));
    }
}
