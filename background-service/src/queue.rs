use pulse_core::{CoreError, ErrorExt};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::collector::Collector;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionJob {
    pub keyword: String,
    pub limit: usize,
}

/// Fire-and-forget collection jobs drained by a fixed pool of worker tasks.
///
/// Each worker runs one job at a time. Jobs for different keywords may run
/// concurrently and finish in any order.
pub struct CollectionQueue {
    sender: RwLock<Option<mpsc::UnboundedSender<CollectionJob>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl CollectionQueue {
    pub fn start(collector: Arc<Collector>, workers: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(Mutex::new(receiver));
        let workers = workers.max(1);

        info!("Starting {} collection workers", workers);
        let handles = (0..workers)
            .map(|worker_id| {
                let receiver = Arc::clone(&receiver);
                let collector = Arc::clone(&collector);
                tokio::spawn(run_worker(worker_id, receiver, collector))
            })
            .collect();

        Self {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(handles),
        }
    }

    pub async fn enqueue(&self, job: CollectionJob) -> Result<(), CoreError> {
        let sender = self.sender.read().await;
        let sender = sender.as_ref().ok_or_else(|| CoreError::Internal {
            message: "collection queue is shut down".to_string(),
        })?;

        debug!("Queueing collection of '{}' (limit {})", job.keyword, job.limit);
        sender.send(job).map_err(|_| CoreError::Internal {
            message: "collection workers have stopped".to_string(),
        })
    }

    /// Stops accepting jobs. Workers finish what is already queued, then exit.
    pub async fn shutdown(&self) {
        if self.sender.write().await.take().is_some() {
            info!("Collection queue closed");
        }
    }

    /// Waits for every worker to exit. Call after [`CollectionQueue::shutdown`].
    pub async fn join(&self) {
        let handles: Vec<JoinHandle<()>> = self.workers.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Collection worker panicked: {}", e);
            }
        }
    }
}

async fn run_worker(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<CollectionJob>>>,
    collector: Arc<Collector>,
) {
    loop {
        let job = receiver.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };

        debug!("Worker {} collecting '{}'", worker_id, job.keyword);
        match collector.collect(&job.keyword, job.limit).await {
            Ok(report) => debug!(
                "Worker {} finished '{}' with {} posts",
                worker_id, report.keyword, report.collected
            ),
            Err(e) => {
                e.log_error();
            }
        }
    }
    debug!("Collection worker {} stopped", worker_id);
}
