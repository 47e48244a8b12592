/*!
 * Bounded, order-preserving worker pool with cooperative cancellation.
 *
 * Every pipeline phase hands the pool a list of items and an async task.
 * At most `concurrency` tasks run at once. Results come back in input order
 * whatever order the tasks finish in. When the cancellation flag is raised,
 * in-flight tasks are aborted and the phase fails with `Cancelled`, so no
 * later phase starts on partial results.
 */

use std::future::Future;
use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};

use crate::errors::PipelineError;

/// Shared cancellation signal, cheap to clone
#[derive(Debug, Clone)]
pub struct CancellationFlag {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for CancellationFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationFlag {
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Raise the flag; every waiter wakes up
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolve once the flag is raised
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }

    /// Fail fast between phases
    pub fn check(&self) -> Result<(), PipelineError> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Raise the flag on Ctrl-C
    pub fn cancel_on_ctrl_c(&self) -> JoinHandle<()> {
        let flag = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling");
                flag.cancel();
            }
        })
    }
}

/// Fixed-size pool of concurrent tasks
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    concurrency: usize,
}

impl WorkerPool {
    /// Create a pool; a concurrency of zero is raised to one
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `task` over every item and return the results in input order.
    ///
    /// # Arguments
    /// * `items` - Inputs, one task each
    /// * `cancel` - Flag that aborts the whole map when raised
    /// * `task` - Builds the future for item `i`
    /// * `progress` - Called with `(completed, total)` after each task
    ///
    /// # Returns
    /// * `Result<Vec<R>, PipelineError>` - One result per item, or the reason the map stopped
    pub async fn map_ordered<T, R, F, Fut, P>(
        &self,
        items: Vec<T>,
        cancel: &CancellationFlag,
        task: F,
        progress: P,
    ) -> Result<Vec<R>, PipelineError>
    where
        R: Send + 'static,
        F: Fn(usize, T) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
        P: Fn(usize, usize),
    {
        cancel.check()?;

        let total = items.len();
        let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
        let mut pending = items.into_iter().enumerate();
        let mut running = JoinSet::new();
        let mut completed = 0;

        for (index, item) in pending.by_ref().take(self.concurrency) {
            let future = task(index, item);
            running.spawn(async move { (index, future.await) });
        }

        while !running.is_empty() {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    Self::shutdown(&mut running).await;
                    return Err(PipelineError::Cancelled);
                }
                joined = running.join_next() => joined,
            };

            match joined {
                Some(Ok((index, result))) => {
                    slots[index] = Some(result);
                    completed += 1;
                    progress(completed, total);

                    if let Some((index, item)) = pending.next() {
                        let future = task(index, item);
                        running.spawn(async move { (index, future.await) });
                    }
                }
                Some(Err(e)) => {
                    Self::shutdown(&mut running).await;
                    return Err(PipelineError::WorkerFailed(e.to_string()));
                }
                None => break,
            }
        }

        let results: Vec<R> = slots.into_iter().flatten().collect();
        if results.len() != total {
            return Err(PipelineError::CountMismatch {
                phase: "worker pool",
                expected: total,
                actual: results.len(),
            });
        }
        debug!("Worker pool finished {} tasks", total);
        Ok(results)
    }

    async fn shutdown<R: 'static>(running: &mut JoinSet<R>) {
        running.abort_all();
        while running.join_next().await.is_some() {}
    }
}
