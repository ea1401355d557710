//! Update scheduler
//!
//! A tick-driven state machine balancing read freshness, write latency,
//! and burst debouncing. Each tick decides exactly one of: drain a queued
//! write, start a poll, or wait. Writes always win over polls, and every
//! write defers the next poll by a short debounce window so a burst of
//! writes is never raced by a poll.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::protocol::WriteRequest;

/// Poll deferral after any write outcome, long enough to re-check the
/// queue for more writes, short enough not to starve reads
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Retry interval after a failed poll; strictly shorter than any sane
/// steady-state interval so connectivity loss is noticed quickly
pub const SHORT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// What the scheduler wants done this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing is due
    Wait,
    /// Pop and send one queued write
    DrainWrite,
    /// Run a status poll
    Poll,
}

/// Scheduler state; the engine is its only driver
pub struct UpdateScheduler {
    steady_interval: Duration,
    /// `None` means a poll is due immediately (startup, or never polled)
    next_poll_due: Option<Instant>,
    last_command_at: Option<Instant>,
    consecutive_failures: u32,
    queue: VecDeque<WriteRequest>,
}

impl UpdateScheduler {
    /// Create a scheduler with the host-supplied steady-state interval
    pub fn new(steady_interval: Duration) -> Self {
        Self {
            steady_interval,
            next_poll_due: None,
            last_command_at: None,
            consecutive_failures: 0,
            queue: VecDeque::new(),
        }
    }

    /// Queue a write; strictly FIFO, at most one in flight at a time
    pub fn enqueue(&mut self, request: WriteRequest) {
        self.queue.push_back(request);
    }

    /// Decide what this tick should do
    pub fn decide(&self, now: Instant) -> Action {
        if !self.queue.is_empty() {
            return Action::DrainWrite;
        }
        match self.next_poll_due {
            None => Action::Poll,
            Some(due) if now >= due => Action::Poll,
            Some(_) => Action::Wait,
        }
    }

    /// Take the next queued write
    pub fn pop_write(&mut self) -> Option<WriteRequest> {
        self.queue.pop_front()
    }

    /// Record a completed write attempt, success or not, and defer the
    /// next poll by the debounce window
    pub fn note_write(&mut self, now: Instant) {
        self.last_command_at = Some(now);
        self.next_poll_due = Some(now + DEBOUNCE_WINDOW);
    }

    /// Record a successful poll
    pub fn note_poll_success(&mut self, now: Instant) {
        self.consecutive_failures = 0;
        self.next_poll_due = Some(now + self.steady_interval);
    }

    /// Record a failed poll and schedule a quick retry
    pub fn note_poll_failure(&mut self, now: Instant) {
        self.consecutive_failures += 1;
        self.next_poll_due = Some(now + SHORT_RETRY_INTERVAL);
    }

    /// Consecutive failed polls since the last success; host-level policy
    /// decides what an elevated count means
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Writes still waiting to be drained
    pub fn pending_writes(&self) -> usize {
        self.queue.len()
    }

    /// When the next poll is due, if one is scheduled
    pub fn next_poll_due(&self) -> Option<Instant> {
        self.next_poll_due
    }

    /// Time of the most recent write attempt
    pub fn last_command_at(&self) -> Option<Instant> {
        self.last_command_at
    }
}
