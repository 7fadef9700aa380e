use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use domain::printer::{
    PrinterTransport, TransportConfig, TransportError, TransportFactory, TransportKind,
    TransportState,
};
use tracing::debug;

/// What the simulated link observed, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    Opened(TransportKind),
    OpenFailed(TransportKind),
    SendStarted(Vec<u8>),
    Drained(Vec<u8>),
    SendFailed(Vec<u8>),
    Closed(TransportKind),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct HardwareState {
    events: Mutex<Vec<WireEvent>>,
    drain_delay: Mutex<Duration>,
    failing_payloads: Mutex<Vec<Vec<u8>>>,
    fail_open: AtomicBool,
    fail_sends: AtomicBool,
    live_handles: AtomicUsize,
    max_live_handles: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// In-memory printer hardware shared by every transport it creates.
#[derive(Clone, Default)]
pub struct SimulatedHardware {
    inner: Arc<HardwareState>,
}

impl SimulatedHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time each payload takes to drain
    pub fn with_drain_delay(self, delay: Duration) -> Self {
        *lock(&self.inner.drain_delay) = delay;
        self
    }

    /// Sends of exactly this payload fail mid-transfer
    pub fn fail_payload(&self, payload: impl Into<Vec<u8>>) {
        lock(&self.inner.failing_payloads).push(payload.into());
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.inner.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Every send fails mid-transfer
    pub fn set_fail_sends(&self, fail: bool) {
        self.inner.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<WireEvent> {
        lock(&self.inner.events).clone()
    }

    /// Payloads that drained, in wire order
    pub fn drained_payloads(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                WireEvent::Drained(payload) => Some(payload),
                _ => None,
            })
            .collect()
    }

    pub fn live_handles(&self) -> usize {
        self.inner.live_handles.load(Ordering::SeqCst)
    }

    pub fn max_live_handles(&self) -> usize {
        self.inner.max_live_handles.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, event: WireEvent) {
        lock(&self.inner.events).push(event);
    }

    fn drain_delay(&self) -> Duration {
        *lock(&self.inner.drain_delay)
    }

    fn should_fail(&self, payload: &[u8]) -> bool {
        self.inner.fail_sends.load(Ordering::SeqCst)
            || lock(&self.inner.failing_payloads)
                .iter()
                .any(|p| p == payload)
    }
}

impl TransportFactory for SimulatedHardware {
    fn create(&self, config: &TransportConfig) -> Box<dyn PrinterTransport> {
        Box::new(SimulatedTransport::new(config.kind(), self.clone()))
    }
}

pub struct SimulatedTransport {
    kind: TransportKind,
    hardware: SimulatedHardware,
    state: TransportState,
}

impl SimulatedTransport {
    pub fn new(kind: TransportKind, hardware: SimulatedHardware) -> Self {
        Self {
            kind,
            hardware,
            state: TransportState::Closed,
        }
    }
}

#[async_trait]
impl PrinterTransport for SimulatedTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn state(&self) -> TransportState {
        self.state
    }

    async fn open(&mut self) -> Result<(), TransportError> {
        if self.state.is_open() {
            self.close().await;
        }
        self.state = TransportState::Opening;

        if self.hardware.inner.fail_open.load(Ordering::SeqCst) {
            self.hardware.record(WireEvent::OpenFailed(self.kind));
            self.state = TransportState::Closed;
            return Err(TransportError::OpenFailed(format!(
                "simulated {} device busy",
                self.kind
            )));
        }

        let live = self.hardware.inner.live_handles.fetch_add(1, Ordering::SeqCst) + 1;
        self.hardware
            .inner
            .max_live_handles
            .fetch_max(live, Ordering::SeqCst);
        self.hardware.record(WireEvent::Opened(self.kind));
        self.state = TransportState::Open;
        Ok(())
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.state.is_open() {
            return Err(TransportError::NotOpen);
        }

        let inner = &self.hardware.inner;
        let in_flight = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        inner.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        self.hardware.record(WireEvent::SendStarted(payload.to_vec()));

        tokio::time::sleep(self.hardware.drain_delay()).await;

        let result = if self.hardware.should_fail(payload) {
            self.hardware.record(WireEvent::SendFailed(payload.to_vec()));
            Err(TransportError::SendFailed("simulated device unplugged".to_string()))
        } else {
            self.hardware.record(WireEvent::Drained(payload.to_vec()));
            debug!(kind = %self.kind, bytes = payload.len(), "Simulated drain");
            Ok(())
        };

        inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn close(&mut self) {
        if self.state.is_open() {
            self.hardware.inner.live_handles.fetch_sub(1, Ordering::SeqCst);
            self.hardware.record(WireEvent::Closed(self.kind));
        }
        self.state = TransportState::Closed;
    }
}
