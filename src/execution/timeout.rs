//! Query Timeout Module
//!
//! Provides timeout and cancellation control for one invocation.
//!
//! ## Design
//!
//! Uses a combination of:
//! - Atomic state word for cooperative interruption
//! - Wall-clock deadline measured from when the statement handle is created
//!
//! The driver polls [`QueryTimeout::check`] while the statement runs (from a
//! progress callback and between rows). The first interruption recorded wins:
//! a timeout that fires after an explicit cancel still reports the cancel.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const LIVE: u8 = 0;
const CANCELLED: u8 = 1;
const TIMED_OUT: u8 = 2;

/// Timeout error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Query exceeded timeout of {timeout:?} (ran for {elapsed:?})")]
pub struct TimeoutError {
    /// The timeout duration that was exceeded
    pub timeout: Duration,
    /// How long the query actually ran
    pub elapsed: Duration,
}

/// Why a running statement must stop
#[derive(Debug, Clone, PartialEq)]
pub enum Interrupt {
    TimedOut(TimeoutError),
    Cancelled { elapsed: Duration },
}

/// Query timeout controller
///
/// Clones share the interruption state, so the driver's progress callback and
/// a [`CancelHandle`] held by another thread observe the same flag.
#[derive(Clone)]
pub struct QueryTimeout {
    /// Interruption state (shared across threads)
    state: Arc<AtomicU8>,

    /// When the statement handle was created
    start_time: Instant,

    /// Maximum allowed duration
    timeout_duration: Option<Duration>,
}

impl QueryTimeout {
    /// Create a new timeout controller with the specified duration.
    ///
    /// The clock starts now.
    pub fn new(timeout: Option<Duration>) -> Self {
        QueryTimeout::with_handle(timeout, &CancelHandle::new())
    }

    /// Create a controller that shares its state with an existing handle.
    ///
    /// Cancel requests made on `handle` before this call are preserved.
    pub fn with_handle(timeout: Option<Duration>, handle: &CancelHandle) -> Self {
        QueryTimeout {
            state: Arc::clone(&handle.state),
            start_time: Instant::now(),
            timeout_duration: timeout,
        }
    }

    /// Check if the statement may keep running
    ///
    /// Returns the recorded interruption once the statement was cancelled or
    /// its timeout elapsed. A zero timeout fails on the first check.
    pub fn check(&self) -> Result<(), Interrupt> {
        if let Some(interrupt) = self.interrupt() {
            return Err(interrupt);
        }

        if let Some(timeout) = self.timeout_duration {
            let elapsed = self.start_time.elapsed();
            if elapsed >= timeout {
                let _ = self.state.compare_exchange(
                    LIVE,
                    TIMED_OUT,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                // A concurrent cancel may have won the race
                return Err(self.interrupt().unwrap_or(Interrupt::TimedOut(TimeoutError {
                    timeout,
                    elapsed,
                })));
            }
        }

        Ok(())
    }

    /// The interruption recorded so far, if any
    pub fn interrupt(&self) -> Option<Interrupt> {
        let elapsed = self.start_time.elapsed();
        match self.state.load(Ordering::Acquire) {
            CANCELLED => Some(Interrupt::Cancelled { elapsed }),
            TIMED_OUT => Some(Interrupt::TimedOut(TimeoutError {
                timeout: self.timeout_duration.unwrap_or(Duration::ZERO),
                elapsed,
            })),
            _ => None,
        }
    }

    /// Cancel the statement explicitly
    pub fn cancel(&self) {
        record_cancel(&self.state);
    }

    /// Get the elapsed time since the handle was created
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get the remaining time before timeout (if any)
    pub fn remaining(&self) -> Option<Duration> {
        self.timeout_duration
            .map(|timeout| timeout.saturating_sub(self.start_time.elapsed()))
    }

}

fn record_cancel(state: &AtomicU8) -> bool {
    state
        .compare_exchange(LIVE, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
}

/// Handle for cancelling a statement from another thread
#[derive(Clone)]
pub struct CancelHandle {
    state: Arc<AtomicU8>,
}

impl CancelHandle {
    pub fn new() -> Self {
        CancelHandle {
            state: Arc::new(AtomicU8::new(LIVE)),
        }
    }

    /// Cancel the associated statement.
    ///
    /// Returns `false` if an interruption was already recorded.
    pub fn cancel(&self) -> bool {
        record_cancel(&self.state)
    }

}

impl Default for CancelHandle {
    fn default() -> Self {
        CancelHandle::new()
    }
}
