//! Consumer control state for the simulation driver.
//!
//! Shared between the driver task and whatever delivers consumer signals
//! (the observer's HTTP handlers, a test, a CLI). All fields are atomics or
//! [`Notify`] handles so neither side ever blocks the other on a lock.
//!
//! `advance` signals coalesce: [`Notify`] stores at most one permit, so
//! several advances sent while the driver is still busy release a single
//! wait.
//!
//! `reset` is a flag the driver takes between iterations. It also releases
//! a pending consumer wait, since the consumer is discarding what it had.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tokio::sync::Notify;
use trailwear_types::{ControlSignal, DriverPhase};

/// Shared start/advance/stop/reset state and the driver's current phase.
#[derive(Debug)]
pub struct ControlState {
    /// Whether the driver may begin iterating.
    started: AtomicBool,

    /// Wakes the driver when started (or stopped before starting).
    start_notify: Notify,

    /// Wakes the driver when the consumer is ready for the next route.
    advance_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Whether a usage reset is waiting for the driver.
    reset_requested: AtomicBool,

    /// Current [`DriverPhase`], encoded by [`phase_code`].
    phase: AtomicU8,
}

impl ControlState {
    /// Create control state. With `auto_start` the driver does not wait
    /// for a `start` signal.
    pub fn new(auto_start: bool) -> Self {
        Self {
            started: AtomicBool::new(auto_start),
            start_notify: Notify::new(),
            advance_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            reset_requested: AtomicBool::new(false),
            phase: AtomicU8::new(phase_code(DriverPhase::Idle)),
        }
    }

    // -----------------------------------------------------------------------
    // Start
    // -----------------------------------------------------------------------

    /// Allow the driver to begin iterating.
    pub fn start(&self) {
        self.started.store(true, Ordering::Release);
        self.start_notify.notify_one();
    }

    /// Whether the driver has been allowed to start.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Wait until started or stopped. Returns immediately if either has
    /// already happened.
    pub async fn wait_for_start(&self) {
        while !self.is_started() && !self.is_stop_requested() {
            self.start_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Advance
    // -----------------------------------------------------------------------

    /// Signal that the consumer is ready for the next route.
    pub fn advance(&self) {
        self.advance_notify.notify_one();
    }

    /// Wait for an `advance` (or a stop). Consumes one stored permit if an
    /// advance arrived before the wait began.
    pub async fn wait_for_advance(&self) {
        if self.is_stop_requested() {
            return;
        }
        self.advance_notify.notified().await;
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop. The driver finishes its current search and
    /// exits before selecting the next pair.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.start_notify.notify_one();
        self.advance_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    /// Ask the driver to clear usage before its next iteration.
    pub fn request_reset(&self) {
        self.reset_requested.store(true, Ordering::Release);
        self.advance_notify.notify_one();
    }

    /// Consume a pending reset request. Returns `true` at most once per
    /// request.
    pub fn take_reset(&self) -> bool {
        self.reset_requested.swap(false, Ordering::AcqRel)
    }

    // -----------------------------------------------------------------------
    // Signals and phase
    // -----------------------------------------------------------------------

    /// Apply a consumer signal.
    pub fn apply(&self, signal: ControlSignal) {
        match signal {
            ControlSignal::Start => self.start(),
            ControlSignal::Advance => self.advance(),
            ControlSignal::Stop => self.request_stop(),
            ControlSignal::Reset => self.request_reset(),
        }
    }

    /// The driver's current phase.
    pub fn phase(&self) -> DriverPhase {
        phase_from_code(self.phase.load(Ordering::Acquire))
    }

    /// Record a phase transition.
    pub fn set_phase(&self, phase: DriverPhase) {
        self.phase.store(phase_code(phase), Ordering::Release);
    }
}

const fn phase_code(phase: DriverPhase) -> u8 {
    match phase {
        DriverPhase::Idle => 0,
        DriverPhase::Selecting => 1,
        DriverPhase::Searching => 2,
        DriverPhase::Emitting => 3,
        DriverPhase::AwaitingConsumer => 4,
        DriverPhase::Stopped => 5,
    }
}

const fn phase_from_code(code: u8) -> DriverPhase {
    match code {
        1 => DriverPhase::Selecting,
        2 => DriverPhase::Searching,
        3 => DriverPhase::Emitting,
        4 => DriverPhase::AwaitingConsumer,
        5 => DriverPhase::Stopped,
        _ => DriverPhase::Idle,
    }
}
