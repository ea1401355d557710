//! Engine facade
//!
//! Ties transport, frame reader, property store, command protocol, and
//! scheduler into the single object collaborators talk to. The host calls
//! [`SpaLink::tick`] on a regular cadence; everything else is queries and
//! queued writes. All I/O inside a tick is blocking with bounded
//! timeouts, so a tick never stalls indefinitely.

use std::time::{Duration, Instant};

use crate::protocol::{self, FrameReader, ProtocolError, Transport, Variant, WriteRequest};
use crate::registers::{DecodedValue, PropertyId, WriteValue};
use crate::scheduler::{Action, UpdateScheduler};
use crate::store::{Listener, PropertyStore};

/// Engine construction parameters.
///
/// Owned configuration passed in at construction; the engine keeps no
/// global state.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Steady-state poll interval between successful polls
    pub steady_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            steady_interval: Duration::from_secs(30),
        }
    }
}

/// Cumulative engine counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineCounters {
    /// Polls that produced a valid, decoded frame
    pub polls_ok: u64,
    /// Polls rejected or timed out
    pub polls_failed: u64,
    /// Writes acknowledged by the controller
    pub writes_ok: u64,
    /// Writes refused or unanswered
    pub writes_failed: u64,
    /// Bytes written to the link
    pub tx_bytes: u64,
    /// Bytes read or discarded from the link
    pub rx_bytes: u64,
}

/// What one tick did
#[derive(Debug)]
pub enum TickOutcome {
    /// Nothing was due
    Idle,
    /// A poll succeeded; this many properties changed
    Polled {
        /// Properties whose value actually changed
        changed: Vec<PropertyId>,
    },
    /// A poll failed and the short retry interval was scheduled
    PollFailed(ProtocolError),
    /// A queued write was acknowledged
    Wrote(Option<PropertyId>),
    /// A queued write failed; no retry is attempted
    WriteFailed(Option<PropertyId>, ProtocolError),
}

/// The protocol engine for one controller connection
pub struct SpaLink<T: Transport> {
    transport: T,
    reader: FrameReader,
    store: PropertyStore,
    scheduler: UpdateScheduler,
    ready: bool,
    counters: EngineCounters,
}

impl<T: Transport> SpaLink<T> {
    /// Create an engine owning the given transport
    pub fn new(transport: T, config: EngineConfig) -> Self {
        Self {
            transport,
            reader: FrameReader::new(),
            store: PropertyStore::new(),
            scheduler: UpdateScheduler::new(config.steady_interval),
            ready: false,
            counters: EngineCounters::default(),
        }
    }

    /// One scheduler step: drain a queued write, poll, or wait.
    ///
    /// Never aborts the host; every failure is folded into the outcome
    /// and the scheduler's backoff state.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        match self.scheduler.decide(now) {
            Action::Wait => TickOutcome::Idle,
            Action::DrainWrite => {
                // decide() only returns DrainWrite when the queue is non-empty
                let Some(mut request) = self.scheduler.pop_write() else {
                    return TickOutcome::Idle;
                };
                let result =
                    protocol::command::send(&mut self.transport, &mut self.store, &mut request);
                self.scheduler.note_write(now);
                match result {
                    Ok(()) => {
                        self.counters.writes_ok += 1;
                        TickOutcome::Wrote(request.target)
                    }
                    Err(e) => {
                        self.counters.writes_failed += 1;
                        tracing::warn!(command = %request.command, error = %e, "write failed");
                        TickOutcome::WriteFailed(request.target, e)
                    }
                }
            }
            Action::Poll => match self.reader.poll(&mut self.transport) {
                Ok(frame) => {
                    let changed = self.store.decode(&frame);
                    self.ready = true;
                    self.counters.polls_ok += 1;
                    self.scheduler.note_poll_success(now);
                    tracing::debug!(
                        fields = frame.field_count(),
                        changed = changed.len(),
                        "poll decoded"
                    );
                    TickOutcome::Polled { changed }
                }
                Err(e) => {
                    self.counters.polls_failed += 1;
                    self.scheduler.note_poll_failure(now);
                    tracing::debug!(
                        error = %e,
                        failures = self.scheduler.consecutive_failures(),
                        "poll failed"
                    );
                    TickOutcome::PollFailed(e)
                }
            },
        }
    }

    /// Current decoded value for a property
    pub fn get_value(&self, id: PropertyId) -> Option<DecodedValue> {
        self.store.get(id).cloned()
    }

    /// Register a change listener; fired synchronously inside `tick()`
    /// on true value transitions only
    pub fn subscribe(&mut self, id: PropertyId, listener: Listener) {
        self.store.subscribe(id, listener);
    }

    /// Queue a write for a writable property.
    ///
    /// Validation (writability, encoding, range) happens here; the send
    /// itself happens on a following tick and its result is delivered via
    /// listeners or by polling [`get_value`](Self::get_value).
    pub fn request_write(
        &mut self,
        id: PropertyId,
        value: impl Into<WriteValue>,
    ) -> Result<(), ProtocolError> {
        let request = WriteRequest::for_property(id, &value.into())?;
        self.scheduler.enqueue(request);
        Ok(())
    }

    /// Queue a raw command with an explicit expected reply. Bypasses the
    /// property table; the store is not updated on ack.
    pub fn request_raw_write(
        &mut self,
        command: impl Into<String>,
        expected_ack: impl Into<String>,
    ) {
        self.scheduler.enqueue(WriteRequest::raw(command, expected_ack));
    }

    /// True once at least one valid frame has been decoded
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Whether a written value is still awaiting hardware confirmation
    pub fn is_dirty(&self, id: PropertyId) -> bool {
        self.store.is_dirty(id)
    }

    /// Firmware variant detected from the frame stream
    pub fn variant(&self) -> Option<Variant> {
        self.reader.variant()
    }

    /// Failed polls since the last success
    pub fn consecutive_failures(&self) -> u32 {
        self.scheduler.consecutive_failures()
    }

    /// Writes queued but not yet sent
    pub fn pending_writes(&self) -> usize {
        self.scheduler.pending_writes()
    }

    /// Cumulative diagnostics counters, including link byte totals
    pub fn counters(&self) -> EngineCounters {
        let stats = self.transport.stats();
        EngineCounters {
            tx_bytes: stats.tx_bytes,
            rx_bytes: stats.rx_bytes,
            ..self.counters
        }
    }
}
