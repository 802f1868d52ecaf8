//! testwire: ship CI test-run results to a remote log endpoint.
//!
//! This crate reads the JSON report produced by a Mocha-style test framework,
//! reshapes every test case into a log record, and delivers the records to a
//! log-ingestion endpoint in size-bounded batches. Batches that cannot be
//! delivered within the attempt budget are kept as local artifacts so no data
//! is silently dropped.
//!
//! # Architecture
//!
//! The main components are:
//!
//! - **Report**: read and validate the raw test report
//! - **Classify**: derive an outcome per test case and normalize it
//! - **Batch**: partition the records into size-bounded request payloads
//! - **Delivery**: send each batch with bounded retries and local fallback
//! - **Artifact**: durable local storage for undelivered payloads
//! - **Metadata / Summary**: CI run context and the operator-facing
//!   failure table

pub mod artifact;
pub mod batch;
pub mod classify;
pub mod clock;
pub mod config;
pub mod delivery;
pub mod metadata;
pub mod report;
pub mod summary;

// Re-export commonly used types
pub use batch::{Batch, assemble};
pub use classify::{DeliveryRecord, Outcome, classify};
pub use config::Settings;
pub use delivery::{DeliveryEngine, DeliveryOutcome};
pub use metadata::{RunContext, RunMetadata};
pub use report::{RawReport, RawTestCase, read_report};
