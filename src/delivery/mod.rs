//! Batch delivery with bounded retries and local fallback.
//!
//! Each batch walks an explicit state machine:
//!
//! ```text
//! Pending → Attempting{n} → Delivered{n}
//!                         → Attempting{n+1}   (while n < max_attempts)
//!                         → Exhausted{n}      (persist payload locally)
//! ```
//!
//! Batches resolve strictly one after another in assembly order; a batch's
//! retry loop finishes (Delivered or Exhausted) before the next batch starts,
//! so at most one request is in flight at any time. Every attempt resends the
//! whole payload: success is all-or-nothing per request.

pub mod transport;

use anyhow::Context;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::artifact::ArtifactSink;
use crate::batch::Batch;
use crate::clock::{Clock, SystemClock};

pub use transport::{HttpTransport, Transport, TransportError};

/// Terminal result for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The endpoint accepted the batch on attempt number `attempts`.
    Delivered { attempts: u32 },
    /// Every attempt failed; the payload was handed to the artifact sink
    /// under `artifact`.
    Exhausted { attempts: u32, artifact: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BatchState {
    Pending,
    Attempting { attempt: u32 },
    Delivered { attempts: u32 },
    Exhausted { attempts: u32 },
}

/// Drives batches through the retry state machine.
///
/// Generic over its collaborators so tests can substitute a scripted
/// transport and a recording sink.
pub struct DeliveryEngine<T, S> {
    transport: T,
    sink: S,
    clock: Box<dyn Clock>,
    max_attempts: u32,
    job_id: String,
}

impl<T, S> DeliveryEngine<T, S>
where
    T: Transport,
    S: ArtifactSink,
{
    pub fn new(transport: T, sink: S, max_attempts: u32, job_id: impl Into<String>) -> Self {
        Self {
            transport,
            sink,
            clock: Box::new(SystemClock),
            max_attempts: max_attempts.max(1),
            job_id: job_id.into(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Deliver every batch in order. Exhaustion is a per-batch outcome, not
    /// an error; the only error path out of here is payload serialization.
    pub async fn deliver_all(&self, batches: &[Batch]) -> anyhow::Result<Vec<DeliveryOutcome>> {
        if batches.is_empty() {
            info!("no records to deliver");
            return Ok(Vec::new());
        }

        info!("delivering {} batch(es)", batches.len());
        let mut outcomes = Vec::with_capacity(batches.len());
        for (index, batch) in batches.iter().enumerate() {
            outcomes.push(self.deliver(index, batch).await?);
        }
        Ok(outcomes)
    }

    /// Resolve a single batch to a terminal state.
    pub async fn deliver(&self, index: usize, batch: &Batch) -> anyhow::Result<DeliveryOutcome> {
        let payload = batch
            .payload()
            .context("failed to serialize batch payload")?;
        debug!("batch {index} payload: {}", String::from_utf8_lossy(&payload));

        let mut state = BatchState::Pending;
        loop {
            state = match state {
                BatchState::Pending => BatchState::Attempting { attempt: 1 },

                BatchState::Attempting { attempt } => match self.transport.send(&payload).await {
                    Ok(()) => BatchState::Delivered { attempts: attempt },
                    Err(err) if attempt < self.max_attempts => {
                        warn!("batch {index} attempt {attempt} failed, retrying: {err}");
                        BatchState::Attempting { attempt: attempt + 1 }
                    }
                    Err(err) => {
                        warn!("batch {index} attempt {attempt} failed: {err}");
                        BatchState::Exhausted { attempts: attempt }
                    }
                },

                BatchState::Delivered { attempts } => {
                    info!(
                        "batch {index} delivered ({} record(s), attempt {attempts})",
                        batch.len()
                    );
                    return Ok(DeliveryOutcome::Delivered { attempts });
                }

                BatchState::Exhausted { attempts } => {
                    let artifact = self.fallback_name();
                    warn!(
                        "batch {index} undelivered after {attempts} attempt(s), keeping payload as {artifact}"
                    );
                    if let Err(err) = self.sink.store(&artifact, &payload).await {
                        warn!("could not persist undelivered batch {index}: {err:#}");
                    }
                    return Ok(DeliveryOutcome::Exhausted { attempts, artifact });
                }
            };
        }
    }

    fn fallback_name(&self) -> String {
        let stamp = self.clock.now().format("%Y-%m-%d-%H-%M-%S");
        format!("failed-batch_{}_{}_{stamp}.json", Uuid::new_v4(), self.job_id)
    }
}
