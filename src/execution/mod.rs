//! Query Execution Module
//!
//! Provides the execution envelope shared by every statement:
//! - Invocation lifecycle with guaranteed handle release
//! - Timeout enforcement and cancellation via cooperative interruption
//! - Result interpretation by cardinality

mod invocation;
mod policy;
mod timeout;

pub use invocation::{Canceller, Invocation, InvocationState};
pub use policy::Outcome;
pub use timeout::{CancelHandle, Interrupt, QueryTimeout, TimeoutError};
