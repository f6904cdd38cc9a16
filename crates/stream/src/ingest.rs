use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use cubefield_common::Placement;
use cubefield_packer::PackError;

use crate::worker::{PackingWorker, WorkerError, WorkerEvent};

/// Anything the presenter can poll for worker events without blocking.
pub trait BatchSource {
    fn try_next(&self) -> Result<Option<WorkerEvent>, WorkerError>;
}

impl BatchSource for PackingWorker {
    fn try_next(&self) -> Result<Option<WorkerEvent>, WorkerError> {
        PackingWorker::try_next(self)
    }
}

impl BatchSource for Receiver<WorkerEvent> {
    fn try_next(&self) -> Result<Option<WorkerEvent>, WorkerError> {
        match self.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(WorkerError::Disconnected),
        }
    }
}

/// Per-frame ingest budget.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Maximum number of batches consumed in one frame.
    pub batches_per_frame: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batches_per_frame: 16,
        }
    }
}

/// Where the run stands, as seen by the presenter.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestStatus {
    Running,
    Done,
    Failed(PackError),
    /// The worker went away without a final event.
    Lost,
}

/// Per-frame ingest statistics for the HUD and logs.
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    pub batches_this_frame: usize,
    pub placements_this_frame: usize,
    /// Latest cumulative count reported by the worker.
    pub n: usize,
    /// Latest cumulative sample count reported by the worker.
    pub tests_n: u64,
    pub malformed_batches: usize,
    pub frame_time: Duration,
}

/// Drains worker events a frame at a time, never blocking.
pub struct BatchIngest {
    pub config: IngestConfig,
    status: IngestStatus,
    stats: IngestStats,
}

impl BatchIngest {
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            status: IngestStatus::Running,
            stats: IngestStats::default(),
        }
    }

    /// Pull up to `batches_per_frame` batches from `source` and return their
    /// placements in arrival order.
    pub fn poll(&mut self, source: &impl BatchSource) -> Vec<Placement> {
        let _span = tracing::trace_span!("batch_ingest").entered();
        let frame_start = Instant::now();
        let mut placements = Vec::new();
        let mut batches = 0;

        while self.status == IngestStatus::Running && batches < self.config.batches_per_frame {
            match source.try_next() {
                Ok(Some(WorkerEvent::Batch(msg))) => {
                    batches += 1;
                    match msg.placements() {
                        Ok(batch) => placements.extend(batch),
                        Err(e) => {
                            tracing::warn!("dropping batch: {e}");
                            self.stats.malformed_batches += 1;
                        }
                    }
                    self.stats.n = msg.n;
                    self.stats.tests_n = msg.tests_n;
                }
                Ok(Some(WorkerEvent::Done { n, tests_n })) => {
                    tracing::info!(n, tests_n, "packing stream finished");
                    self.stats.n = n;
                    self.stats.tests_n = tests_n;
                    self.status = IngestStatus::Done;
                }
                Ok(Some(WorkerEvent::Failed(e))) => {
                    tracing::warn!("packing stream failed: {e}");
                    self.status = IngestStatus::Failed(e);
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("packing stream lost: {e}");
                    self.status = IngestStatus::Lost;
                }
            }
        }

        self.stats.batches_this_frame = batches;
        self.stats.placements_this_frame = placements.len();
        self.stats.frame_time = frame_start.elapsed();
        placements
    }

    pub fn status(&self) -> &IngestStatus {
        &self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == IngestStatus::Running
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }
}

impl Default for BatchIngest {
    fn default() -> Self {
        Self::new(IngestConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::BatchMessage;
    use std::sync::mpsc;

    fn batch(n: usize, len: usize) -> WorkerEvent {
        let placements: Vec<Placement> = (0..len)
            .map(|i| Placement::new(i as f32 * 0.01, 0.0, 0.0, 0.003))
            .collect();
        WorkerEvent::Batch(BatchMessage::from_placements(n, n as u64 * 3, &placements))
    }

    #[test]
    fn ingest_config_defaults() {
        assert_eq!(IngestConfig::default().batches_per_frame, 16);
    }

    #[test]
    fn respects_frame_budget() {
        let (tx, rx) = mpsc::channel();
        for i in 1..=5 {
            tx.send(batch(i * 2, 2)).unwrap();
        }
        let mut ingest = BatchIngest::new(IngestConfig {
            batches_per_frame: 2,
        });

        let first = ingest.poll(&rx);
        assert_eq!(first.len(), 4);
        assert_eq!(ingest.stats().batches_this_frame, 2);
        assert_eq!(ingest.stats().n, 4);

        ingest.poll(&rx);
        let last = ingest.poll(&rx);
        assert_eq!(last.len(), 2);
        assert_eq!(ingest.stats().n, 10);
        assert_eq!(ingest.stats().tests_n, 30);
        assert!(ingest.is_running());
    }

    #[test]
    fn empty_channel_does_not_block() {
        let (_tx, rx) = mpsc::channel::<WorkerEvent>();
        let mut ingest = BatchIngest::default();
        assert!(ingest.poll(&rx).is_empty());
        assert!(ingest.is_running());
    }

    #[test]
    fn done_ends_the_stream() {
        let (tx, rx) = mpsc::channel();
        tx.send(batch(3, 3)).unwrap();
        tx.send(WorkerEvent::Done { n: 3, tests_n: 40 }).unwrap();
        let mut ingest = BatchIngest::default();

        assert_eq!(ingest.poll(&rx).len(), 3);
        assert_eq!(ingest.status(), &IngestStatus::Done);
        assert_eq!(ingest.stats().tests_n, 40);

        // Status is final; later polls read nothing.
        drop(tx);
        assert!(ingest.poll(&rx).is_empty());
        assert_eq!(ingest.status(), &IngestStatus::Done);
    }

    #[test]
    fn failure_and_disconnect_are_reported() {
        let (tx, rx) = mpsc::channel();
        tx.send(WorkerEvent::Failed(PackError::Cancelled)).unwrap();
        let mut ingest = BatchIngest::default();
        ingest.poll(&rx);
        assert_eq!(ingest.status(), &IngestStatus::Failed(PackError::Cancelled));

        let (tx, rx) = mpsc::channel::<WorkerEvent>();
        drop(tx);
        let mut ingest = BatchIngest::default();
        ingest.poll(&rx);
        assert_eq!(ingest.status(), &IngestStatus::Lost);
    }

    #[test]
    fn malformed_batch_is_counted_and_skipped() {
        let (tx, rx) = mpsc::channel();
        tx.send(WorkerEvent::Batch(BatchMessage {
            n: 1,
            tests_n: 1,
            data: vec![0.0; 3],
        }))
        .unwrap();
        tx.send(batch(2, 1)).unwrap();
        let mut ingest = BatchIngest::default();
        let placements = ingest.poll(&rx);
        assert_eq!(placements.len(), 1);
        assert_eq!(ingest.stats().malformed_batches, 1);
    }

    #[test]
    fn drains_a_real_worker() {
        let config = cubefield_packer::PackConfig {
            target_count: 60,
            seed: Some(21),
            ..Default::default()
        };
        let mut worker = PackingWorker::spawn(config).unwrap();
        worker.start().unwrap();

        let mut ingest = BatchIngest::default();
        let mut received = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(30);
        while ingest.is_running() && Instant::now() < deadline {
            received.extend(ingest.poll(&worker));
            std::thread::yield_now();
        }
        assert_eq!(ingest.status(), &IngestStatus::Done);
        assert_eq!(received.len(), 60);
    }
}
