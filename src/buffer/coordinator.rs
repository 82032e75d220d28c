use super::submitter::{HANDOFF_CAPACITY, Submission};
use super::{Batch, BatchConfig, FlushTrigger, LogSubmitter};
use crate::domain::LogRecord;
use crate::sender::{BatchTransmitter, Deliver};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Stand-in deadline for ages too large to add to the current instant.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Owns the pending queue and the age timer, and decides when to flush.
///
/// A single task drives the coordinator. It waits for whichever comes first of a
/// new record, the age timer, or the shutdown token. Flushes run inline, so a slow
/// delivery holds back both the timer and further submissions.
pub struct BatchCoordinator<D> {
    config: BatchConfig,
    queue: Vec<LogRecord>,
    receiver: mpsc::Receiver<Submission>,
    transmitter: BatchTransmitter<D>,
    shutdown: CancellationToken,
}

impl<D: Deliver> BatchCoordinator<D> {
    pub fn new(
        config: BatchConfig,
        transmitter: BatchTransmitter<D>,
        shutdown: CancellationToken,
    ) -> (Self, LogSubmitter) {
        let config = config.with_defaults();
        let (tx, receiver) = mpsc::channel(HANDOFF_CAPACITY);

        let coordinator = Self {
            queue: Vec::with_capacity(config.max_size),
            config,
            receiver,
            transmitter,
            shutdown,
        };
        (coordinator, LogSubmitter::new(tx))
    }

    pub async fn run(mut self) {
        let max_age = self.config.max_age;
        info!(
            "Starting batch coordinator (max_size={}, max_age={:?})",
            self.config.max_size, max_age
        );

        let age_timer = sleep_until(deadline_after(max_age));
        tokio::pin!(age_timer);

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    info!("Received shutdown signal, stopping batch coordinator");
                    break;
                }
                submission = self.receiver.recv() => {
                    let Some(submission) = submission else {
                        info!("All submitters dropped, stopping batch coordinator");
                        break;
                    };
                    self.accept(submission);
                    if self.queue.len() >= self.config.max_size {
                        self.flush(FlushTrigger::SizeBased).await;
                        age_timer.as_mut().reset(deadline_after(max_age));
                    }
                }
                () = &mut age_timer => {
                    if !self.queue.is_empty() {
                        self.flush(FlushTrigger::AgeBased).await;
                    }
                    age_timer.as_mut().reset(deadline_after(max_age));
                }
            }
        }

        self.drain().await;
        info!("Batch coordinator stopped");
    }

    fn accept(&mut self, submission: Submission) {
        let Submission { record, ack } = submission;
        self.queue.push(record);
        // The producer may have given up waiting; the record stays queued.
        let _ = ack.send(());
        debug!("Queued record ({} pending)", self.queue.len());
    }

    /// Takes records still sitting in the hand-off channel, then sends whatever
    /// is pending as the final batch.
    async fn drain(&mut self) {
        self.receiver.close();
        while let Some(submission) = self.receiver.recv().await {
            self.accept(submission);
        }

        if !self.queue.is_empty() {
            self.flush(FlushTrigger::Shutdown).await;
        }
    }

    async fn flush(&mut self, trigger: FlushTrigger) {
        let records = std::mem::take(&mut self.queue);
        self.queue.reserve(self.config.max_size);
        let outcome = self.transmitter.send_batch(Batch::new(records, trigger)).await;
        if !outcome.is_delivered() {
            debug!("Batch dropped, continuing with an empty queue");
        }
    }
}

fn deadline_after(max_age: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(max_age)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
