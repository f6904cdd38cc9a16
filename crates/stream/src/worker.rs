use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;

use cubefield_packer::{CancelToken, ConfigError, PackConfig, PackError, Packer, generate};

use crate::wire::BatchMessage;

/// Messages from the presenter to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Begin generating. Only the first one counts.
    Start,
}

/// Messages from the worker to the presenter.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Batch(BatchMessage),
    /// Every requested placement has been sent.
    Done { n: usize, tests_n: u64 },
    /// The run stopped early. No further events follow.
    Failed(PackError),
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("worker channel disconnected")]
    Disconnected,
    #[error("worker thread panicked")]
    Panicked,
}

/// Packing run on a dedicated thread.
///
/// The thread idles until [`PackingWorker::start`] is called, then runs the
/// packer to completion and streams each batch back. Dropping the worker
/// cancels the run and joins the thread.
pub struct PackingWorker {
    commands: Option<Sender<WorkerCommand>>,
    events: Receiver<WorkerEvent>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
    started: bool,
}

impl PackingWorker {
    /// Validate `config` and spawn the (idle) worker thread.
    pub fn spawn(config: PackConfig) -> Result<Self, WorkerError> {
        let cancel = CancelToken::new();
        let packer = generate(config)?.with_cancel(cancel.clone());

        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("cubefield-packer".into())
            .spawn(move || run(packer, command_rx, event_tx))?;

        Ok(Self {
            commands: Some(command_tx),
            events: event_rx,
            cancel,
            handle: Some(handle),
            started: false,
        })
    }

    /// Send the start signal. Calling again is a no-op.
    pub fn start(&mut self) -> Result<(), WorkerError> {
        if self.started {
            return Ok(());
        }
        let commands = self.commands.as_ref().ok_or(WorkerError::Disconnected)?;
        commands
            .send(WorkerCommand::Start)
            .map_err(|_| WorkerError::Disconnected)?;
        self.started = true;
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Next pending event without blocking.
    pub fn try_next(&self) -> Result<Option<WorkerEvent>, WorkerError> {
        match self.events.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(WorkerError::Disconnected),
        }
    }

    /// Block until the next event.
    pub fn recv(&self) -> Result<WorkerEvent, WorkerError> {
        self.events.recv().map_err(|_| WorkerError::Disconnected)
    }

    /// Ask the run to stop. The worker answers with `Failed(Cancelled)`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the thread to exit.
    pub fn join(mut self) -> Result<(), WorkerError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), WorkerError> {
        // An unstarted worker is parked on the command channel.
        self.commands.take();
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked),
            None => Ok(()),
        }
    }
}

impl Drop for PackingWorker {
    fn drop(&mut self) {
        self.cancel();
        if let Err(e) = self.shutdown() {
            tracing::error!("packing worker shutdown: {e}");
        }
    }
}

fn run(mut packer: Packer, commands: Receiver<WorkerCommand>, events: Sender<WorkerEvent>) {
    let _span = tracing::info_span!("packing_worker").entered();

    match commands.recv() {
        Ok(WorkerCommand::Start) => {}
        Err(_) => {
            tracing::debug!("worker dropped before start");
            return;
        }
    }
    tracing::info!(
        target_count = packer.config().target_count,
        batch_size = packer.config().batch_size,
        "packing started"
    );

    for result in packer.by_ref() {
        let event = match result {
            Ok(batch) => WorkerEvent::Batch(BatchMessage::from(&batch)),
            Err(e) => WorkerEvent::Failed(e),
        };
        if events.send(event).is_err() {
            tracing::debug!("presenter gone, stopping worker");
            return;
        }
    }

    if packer.is_complete() {
        let _ = events.send(WorkerEvent::Done {
            n: packer.accepted(),
            tests_n: packer.tests_n(),
        });
    }
}
