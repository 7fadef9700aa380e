use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use domain::printer::{TransportConfig, TransportError, TransportState};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::context::TransportContext;

/// Outcome of handing a payload to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Accepted; `seq` is its position in the global write order
    Queued { seq: u64 },
    /// No transport was open, the payload was discarded
    Dropped,
}

type Completion = oneshot::Sender<Result<(), TransportError>>;

struct WriteJob {
    seq: u64,
    payload: Vec<u8>,
    completion: Option<Completion>,
}

enum Command {
    Write(WriteJob),
    Activate {
        config: TransportConfig,
        reply: oneshot::Sender<Result<(), TransportError>>,
    },
    Deactivate {
        reply: oneshot::Sender<()>,
    },
    Barrier {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

struct Sequencer {
    next_seq: u64,
    tx: mpsc::UnboundedSender<Command>,
}

/// Strictly ordered, one-at-a-time writer for the active transport.
///
/// Payloads are sent in the order they were accepted. The next send starts only after
/// the previous one drained or failed, and a failure never blocks later entries.
/// Transport switches travel through the same queue, so they take effect between writes.
#[derive(Clone)]
pub struct WriteScheduler {
    sequencer: Arc<Mutex<Sequencer>>,
    state: watch::Receiver<TransportState>,
    writing: Arc<AtomicBool>,
    pending: Arc<AtomicUsize>,
}

impl WriteScheduler {
    /// Start the worker that owns `context`
    pub fn spawn(context: TransportContext) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let writing = Arc::new(AtomicBool::new(false));
        let pending = Arc::new(AtomicUsize::new(0));

        let scheduler = Self {
            sequencer: Arc::new(Mutex::new(Sequencer { next_seq: 0, tx })),
            state: context.subscribe(),
            writing: writing.clone(),
            pending: pending.clone(),
        };
        let worker = SchedulerWorker {
            context,
            rx,
            writing,
            pending,
        };

        (scheduler, tokio::spawn(worker.run()))
    }

    pub fn transport_state(&self) -> TransportState {
        *self.state.borrow()
    }

    /// True while a payload is on the wire
    pub fn is_writing(&self) -> bool {
        self.writing.load(Ordering::SeqCst)
    }

    /// Accepted payloads not yet sent or dropped
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Queue a payload without waiting for it. Never blocks.
    pub fn enqueue(&self, payload: impl Into<Vec<u8>>) -> Enqueued {
        self.push(payload.into(), None)
    }

    /// Queue a payload and wait until it has drained or failed
    pub async fn submit(&self, payload: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        let (tx, rx) = oneshot::channel();
        self.push(payload.into(), Some(tx));
        rx.await.unwrap_or(Err(TransportError::NotOpen))
    }

    /// Replace the active transport once everything queued before this call is written
    pub async fn activate(&self, config: TransportConfig) -> Result<(), TransportError> {
        let (reply, rx) = oneshot::channel();
        if !self.send_command(Command::Activate { config, reply }) {
            return Err(stopped());
        }
        rx.await.unwrap_or_else(|_| Err(stopped()))
    }

    /// Close the active transport once everything queued before this call is written
    pub async fn deactivate(&self) {
        let (reply, rx) = oneshot::channel();
        if self.send_command(Command::Deactivate { reply }) {
            let _ = rx.await;
        }
    }

    /// Wait until everything queued before this call has been sent or dropped
    pub async fn drained(&self) {
        let (reply, rx) = oneshot::channel();
        if self.send_command(Command::Barrier { reply }) {
            let _ = rx.await;
        }
    }

    /// Finish queued work, close the transport and stop the worker
    pub async fn shutdown(&self) {
        let (reply, rx) = oneshot::channel();
        if self.send_command(Command::Shutdown { reply }) {
            let _ = rx.await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Sequencer> {
        self.sequencer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, payload: Vec<u8>, completion: Option<Completion>) -> Enqueued {
        let bytes = payload.len();
        if !self.transport_state().is_open() {
            warn!(bytes, "⚠️ Printer transport not open, dropping payload");
            if let Some(completion) = completion {
                let _ = completion.send(Err(TransportError::NotOpen));
            }
            return Enqueued::Dropped;
        }

        // Sequence assignment and channel send happen under one lock so seq order is queue order
        let mut sequencer = self.lock();
        let seq = sequencer.next_seq;
        self.pending.fetch_add(1, Ordering::SeqCst);
        let job = WriteJob {
            seq,
            payload,
            completion,
        };
        if sequencer.tx.send(Command::Write(job)).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            warn!(bytes, "Write scheduler stopped, dropping payload");
            return Enqueued::Dropped;
        }
        sequencer.next_seq += 1;
        debug!(seq, bytes, "Payload queued");
        Enqueued::Queued { seq }
    }

    fn send_command(&self, command: Command) -> bool {
        self.lock().tx.send(command).is_ok()
    }
}

fn stopped() -> TransportError {
    TransportError::OpenFailed("write scheduler stopped".to_string())
}

struct SchedulerWorker {
    context: TransportContext,
    rx: mpsc::UnboundedReceiver<Command>,
    writing: Arc<AtomicBool>,
    pending: Arc<AtomicUsize>,
}

impl SchedulerWorker {
    async fn run(mut self) {
        info!("🖨️ Write scheduler started");

        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Write(job) => self.write(job).await,
                Command::Activate { config, reply } => {
                    let result = self.context.activate(&config).await;
                    let _ = reply.send(result);
                }
                Command::Deactivate { reply } => {
                    self.context.deactivate().await;
                    let _ = reply.send(());
                }
                Command::Barrier { reply } => {
                    let _ = reply.send(());
                }
                Command::Shutdown { reply } => {
                    self.shutdown(reply).await;
                    return;
                }
            }
        }

        // All handles dropped
        self.context.deactivate().await;
        info!("🖨️ Write queue closed. Write scheduler stopped.");
    }

    async fn shutdown(&mut self, reply: oneshot::Sender<()>) {
        // Refuse anything sent after this point, then finish what was already accepted
        self.rx.close();
        let mut replies = vec![reply];
        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Write(job) => self.write(job).await,
                Command::Activate { config, reply } => {
                    warn!(transport = %config, "Write scheduler shutting down, transport not opened");
                    let _ = reply.send(Err(stopped()));
                }
                Command::Deactivate { reply } => {
                    self.context.deactivate().await;
                    let _ = reply.send(());
                }
                Command::Barrier { reply } => {
                    let _ = reply.send(());
                }
                Command::Shutdown { reply } => replies.push(reply),
            }
        }

        self.context.deactivate().await;
        info!("🖨️ Write scheduler shutting down");
        for reply in replies {
            let _ = reply.send(());
        }
    }

    async fn write(&mut self, job: WriteJob) {
        let bytes = job.payload.len();

        self.writing.store(true, Ordering::SeqCst);
        let result = self.context.send(&job.payload).await;
        self.writing.store(false, Ordering::SeqCst);
        self.pending.fetch_sub(1, Ordering::SeqCst);

        match &result {
            Ok(()) => debug!(seq = job.seq, bytes, "✅ Payload drained"),
            Err(e) => error!(seq = job.seq, bytes, error = %e, "❌ Send failed, payload dropped"),
        }

        if let Some(completion) = job.completion {
            let _ = completion.send(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::printer::{SerialSettings, TransportKind};
    use infrastructure::{SimulatedHardware, WireEvent};
    use std::time::Duration;

    fn serial() -> TransportConfig {
        TransportConfig::Serial(SerialSettings::new("COM3"))
    }

    fn start(hardware: &SimulatedHardware) -> WriteScheduler {
        let context = TransportContext::new(Arc::new(hardware.clone()));
        WriteScheduler::spawn(context).0
    }

    #[tokio::test]
    async fn test_enqueue_without_transport_is_dropped() {
        let hardware = SimulatedHardware::new();
        let scheduler = start(&hardware);

        assert_eq!(scheduler.enqueue(b"A".to_vec()), Enqueued::Dropped);
        assert_eq!(scheduler.submit(b"B".to_vec()).await, Err(TransportError::NotOpen));
        scheduler.drained().await;

        assert!(hardware.events().is_empty());
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_writes_in_order_one_at_a_time() {
        let hardware = SimulatedHardware::new().with_drain_delay(Duration::from_millis(20));
        let scheduler = start(&hardware);
        scheduler.activate(serial()).await.unwrap();

        assert_eq!(scheduler.enqueue(b"A".to_vec()), Enqueued::Queued { seq: 0 });
        assert_eq!(scheduler.enqueue(b"B".to_vec()), Enqueued::Queued { seq: 1 });
        assert_eq!(scheduler.enqueue(b"C".to_vec()), Enqueued::Queued { seq: 2 });
        scheduler.drained().await;

        assert_eq!(
            hardware.events(),
            vec![
                WireEvent::Opened(TransportKind::Serial),
                WireEvent::SendStarted(b"A".to_vec()),
                WireEvent::Drained(b"A".to_vec()),
                WireEvent::SendStarted(b"B".to_vec()),
                WireEvent::Drained(b"B".to_vec()),
                WireEvent::SendStarted(b"C".to_vec()),
                WireEvent::Drained(b"C".to_vec()),
            ]
        );
        assert_eq!(hardware.max_in_flight(), 1);
        assert!(!scheduler.is_writing());
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_failure_does_not_block_queue() {
        let hardware = SimulatedHardware::new();
        hardware.fail_payload(b"B".to_vec());
        let scheduler = start(&hardware);
        scheduler.activate(serial()).await.unwrap();

        scheduler.enqueue(b"A".to_vec());
        let failed = scheduler.submit(b"B".to_vec()).await;
        scheduler.enqueue(b"C".to_vec());
        scheduler.drained().await;

        assert!(matches!(failed, Err(TransportError::SendFailed(_))));
        assert_eq!(hardware.drained_payloads(), vec![b"A".to_vec(), b"C".to_vec()]);
        // Transport stays open after a failed send
        assert_eq!(scheduler.transport_state(), TransportState::Open);
    }

    #[tokio::test]
    async fn test_is_writing_during_send() {
        let hardware = SimulatedHardware::new().with_drain_delay(Duration::from_millis(200));
        let scheduler = start(&hardware);
        scheduler.activate(serial()).await.unwrap();

        scheduler.enqueue(b"slow".to_vec());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(scheduler.is_writing());

        scheduler.drained().await;
        assert!(!scheduler.is_writing());
    }

    #[tokio::test]
    async fn test_shutdown_closes_transport() {
        let hardware = SimulatedHardware::new();
        let scheduler = start(&hardware);
        scheduler.activate(serial()).await.unwrap();
        scheduler.enqueue(b"last".to_vec());

        scheduler.shutdown().await;

        assert_eq!(hardware.drained_payloads(), vec![b"last".to_vec()]);
        assert_eq!(hardware.live_handles(), 0);
        assert_eq!(scheduler.enqueue(b"late".to_vec()), Enqueued::Dropped);
        assert!(scheduler.activate(serial()).await.is_err());
    }

    #[tokio::test]
    async fn test_writes_accepted_behind_shutdown_are_flushed() {
        let hardware = SimulatedHardware::new().with_drain_delay(Duration::from_millis(100));
        let scheduler = start(&hardware);
        scheduler.activate(serial()).await.unwrap();

        assert_eq!(scheduler.enqueue(b"A".to_vec()), Enqueued::Queued { seq: 0 });
        let stopping = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.shutdown().await })
        };
        // Shutdown is queued while A is still draining
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(scheduler.enqueue(b"B".to_vec()), Enqueued::Queued { seq: 1 });
        let late_activation = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.activate(serial()).await })
        };
        stopping.await.unwrap();

        assert_eq!(hardware.drained_payloads(), vec![b"A".to_vec(), b"B".to_vec()]);
        assert_eq!(scheduler.pending(), 0);
        assert!(late_activation.await.unwrap().is_err());
        assert_eq!(hardware.live_handles(), 0);
        assert_eq!(scheduler.transport_state(), TransportState::Closed);
    }

    #[tokio::test]
    async fn test_failed_activation_reports_error() {
        let hardware = SimulatedHardware::new();
        hardware.set_fail_open(true);
        let scheduler = start(&hardware);

        let result = scheduler.activate(serial()).await;

        assert!(result.unwrap_err().is_open_failure());
        assert_eq!(scheduler.transport_state(), TransportState::Closed);
    }
}
