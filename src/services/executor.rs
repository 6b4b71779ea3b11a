use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, Mutex};

use crate::{
    error::{AppError, AppResult},
    models::RawCandidate,
    services::providers::UpstreamResolver,
};

/// A resolve request waiting for a free worker
struct ResolveJob {
    query: String,
    enqueued_at: Instant,
    reply_tx: oneshot::Sender<anyhow::Result<Vec<RawCandidate>>>,
}

/// Fixed-size pool of workers calling the upstream resolver
///
/// Jobs queue in FIFO order when every worker is busy; nothing is rejected.
/// Callers stop waiting once their timeout elapses. A job whose caller gave
/// up while it was queued is skipped; one already running is left to finish,
/// bounded by the resolver's own deadline.
#[derive(Clone)]
pub struct WorkerPool {
    job_tx: mpsc::UnboundedSender<ResolveJob>,
}

impl WorkerPool {
    /// Spawns `size` workers that share a single job queue
    ///
    /// Workers exit once every `WorkerPool` handle has been dropped.
    pub fn new(resolver: Arc<dyn UpstreamResolver>, size: usize) -> Self {
        let size = size.max(1);
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let job_rx = Arc::new(Mutex::new(job_rx));

        for worker_id in 0..size {
            let resolver = resolver.clone();
            let job_rx = job_rx.clone();
            tokio::spawn(async move {
                Self::worker_task(worker_id, resolver, job_rx).await;
            });
        }

        tracing::info!(workers = size, "Resolver worker pool started");

        Self { job_tx }
    }

    async fn worker_task(
        worker_id: usize,
        resolver: Arc<dyn UpstreamResolver>,
        job_rx: Arc<Mutex<mpsc::UnboundedReceiver<ResolveJob>>>,
    ) {
        loop {
            // tokio's Mutex is fair, so idle workers take turns in FIFO order.
            let job = job_rx.lock().await.recv().await;
            let Some(job) = job else { break };

            if job.reply_tx.is_closed() {
                tracing::debug!(
                    worker = worker_id,
                    query = %job.query,
                    queued_ms = job.enqueued_at.elapsed().as_millis() as u64,
                    "Skipping resolve job abandoned while queued"
                );
                continue;
            }

            tracing::debug!(
                worker = worker_id,
                query = %job.query,
                queued_ms = job.enqueued_at.elapsed().as_millis() as u64,
                provider = resolver.name(),
                "Worker picked up resolve job"
            );

            let result = resolver.resolve(&job.query).await;

            if job.reply_tx.send(result).is_err() {
                tracing::debug!(
                    worker = worker_id,
                    query = %job.query,
                    "Caller gave up before the resolver finished"
                );
            }
        }

        tracing::debug!(worker = worker_id, "Resolver worker stopped");
    }

    /// Resolves `query` on a pool worker, waiting at most `timeout`
    ///
    /// The timeout covers both queueing and the resolver call itself.
    pub async fn fetch(&self, query: &str, timeout: Duration) -> AppResult<Vec<RawCandidate>> {
        let (reply_tx, reply_rx) = oneshot::channel();

        let job = ResolveJob {
            query: query.to_string(),
            enqueued_at: Instant::now(),
            reply_tx,
        };

        self.job_tx
            .send(job)
            .map_err(|_| AppError::Internal("Resolver worker pool has shut down".to_string()))?;

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(Ok(candidates))) => Ok(candidates),
            Ok(Ok(Err(e))) => Err(AppError::Upstream(format!("{:#}", e))),
            Ok(Err(_)) => Err(AppError::Internal(
                "Resolver worker dropped the job".to_string(),
            )),
            Err(_) => Err(AppError::Timeout(timeout)),
        }
    }
}
