//! Batch assembly: normalized records partitioned into request payloads.

use serde::Serialize;

use crate::classify::{self, DeliveryRecord, Outcome};
use crate::clock::Clock;
use crate::metadata::RunMetadata;
use crate::report::RawReport;

/// Log type tag carried in every envelope.
pub const LOG_TYPE: &str = "test.case";

/// Common envelope shared by every record in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    #[serde(rename = "logType")]
    pub log_type: &'static str,
    /// Wall-clock time of assembly, epoch milliseconds.
    pub timestamp: i64,
    pub attributes: RunMetadata,
}

/// A bounded group of delivery records sent as one request.
#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    pub logs: Vec<DeliveryRecord>,
    pub common: Envelope,
}

impl Batch {
    /// The exact request body: a JSON array holding this one envelope.
    pub fn payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(std::slice::from_ref(self))
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

/// Convert a report into delivery-ready batches.
///
/// Passed and Skipped records come from `tests`; cases there that classify as
/// Failed are dropped, Failed records come from `failures` alone so hook
/// failures are not counted twice. The concatenated sequence
/// {passed…, skipped…, failed…} is sliced into consecutive chunks of at most
/// `max_batch_size` records, preserving order. Zero records yields zero
/// batches.
pub fn assemble(
    report: &RawReport,
    metadata: &RunMetadata,
    project_root: Option<&str>,
    max_batch_size: usize,
    clock: &dyn Clock,
) -> Vec<Batch> {
    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for case in &report.tests {
        match classify::classify(case) {
            Outcome::Passed => {
                records.push(DeliveryRecord::from_case(case, Outcome::Passed, project_root));
            }
            Outcome::Skipped => {
                skipped.push(DeliveryRecord::from_case(case, Outcome::Skipped, project_root));
            }
            Outcome::Failed => {}
        }
    }
    records.extend(skipped);
    records.extend(
        report
            .failures
            .iter()
            .map(|case| DeliveryRecord::from_case(case, Outcome::Failed, project_root)),
    );

    let size = max_batch_size.max(1);
    records
        .chunks(size)
        .map(|chunk| Batch {
            logs: chunk.to_vec(),
            common: Envelope {
                log_type: LOG_TYPE,
                timestamp: clock.now().timestamp_millis(),
                attributes: metadata.clone(),
            },
        })
        .collect()
}
