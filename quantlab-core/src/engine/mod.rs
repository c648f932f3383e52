//! The event engine: routing table, dispatch loop, handler wiring, and the
//! assembled backtest.

mod backtest;
mod dispatcher;
pub mod handlers;

pub use backtest::{Backtest, EngineContext};
pub use dispatcher::{EventDispatcher, EventQueue, Handler};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::EventKind;

/// Fatal engine faults. Data gaps and non-marketable orders are not errors;
/// these are wiring bugs or corrupted input, and they abort the run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("handler already registered for {kind:?}; use replace_handler to overwrite")]
    DuplicateHandler { kind: EventKind },

    #[error("no handler registered for {kind:?}")]
    UnroutedEvent { kind: EventKind },

    #[error("feed timestamp went backwards: {current} after {previous}")]
    OutOfOrderEvent {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("handler for {expected:?} received a {actual:?} event")]
    KindMismatch {
        expected: EventKind,
        actual: EventKind,
    },
}
