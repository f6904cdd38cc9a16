//! Streaming: moves packing batches from a worker thread to the presenter.
//!
//! # Invariants
//! - Batches arrive in acceptance order, never duplicated.
//! - The presenter never blocks on the worker; ingest is budgeted per frame.
//! - The only state shared across threads is the cancel flag.

mod ingest;
mod wire;
mod worker;

pub use ingest::{BatchIngest, BatchSource, IngestConfig, IngestStats, IngestStatus};
pub use wire::{BatchMessage, WireError};
pub use worker::{PackingWorker, WorkerCommand, WorkerError, WorkerEvent};
