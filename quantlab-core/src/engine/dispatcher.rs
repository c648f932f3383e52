//! Dispatch loop and routing table.
//!
//! The dispatcher pulls market events from the feed one at a time. Each
//! pulled event seeds the derived-event queue, and the queue is drained to
//! completion before the next pull, so an Order → Fill cascade settles
//! entirely within its originating timestamp.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::domain::{Event, EventKind};
use crate::engine::{EngineContext, EngineError};
use crate::feed::MarketDataFeed;

/// FIFO queue of derived events. Handlers push; only the dispatch loop pops.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }
}

/// A routed event handler. Plain function pointer: all mutable state lives
/// on the context, so handlers stay freely copyable out of the table.
pub type Handler = fn(&mut EngineContext, &Event, &mut EventQueue) -> Result<(), EngineError>;

/// Explicit `EventKind → Handler` routing table plus the dispatch loop.
pub struct EventDispatcher {
    handlers: HashMap<EventKind, Handler>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            last_timestamp: None,
        }
    }

    /// Route `kind` to `handler`. Registering a kind twice is a wiring bug.
    pub fn register_handler(
        &mut self,
        kind: EventKind,
        handler: Handler,
    ) -> Result<(), EngineError> {
        if self.handlers.contains_key(&kind) {
            return Err(EngineError::DuplicateHandler { kind });
        }
        self.handlers.insert(kind, handler);
        Ok(())
    }

    /// Explicit overwrite for the rare case a caller swaps a route on purpose.
    pub fn replace_handler(&mut self, kind: EventKind, handler: Handler) {
        self.handlers.insert(kind, handler);
    }

    pub fn is_routed(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Drive the feed to exhaustion. Returns the number of events dispatched
    /// (feed events plus derived events).
    ///
    /// The stop flag is checked between top-level feed pulls only, never
    /// mid-cascade, so a stopped run still ends in a settled state.
    pub fn run(
        &mut self,
        feed: &mut dyn MarketDataFeed,
        ctx: &mut EngineContext,
        stop: Option<&AtomicBool>,
    ) -> Result<u64, EngineError> {
        let mut dispatched = 0u64;
        let mut queue = EventQueue::new();

        loop {
            if let Some(flag) = stop {
                if flag.load(Ordering::Relaxed) {
                    trace!(dispatched, "stop requested; ending run");
                    break;
                }
            }
            let Some(event) = feed.next_event() else {
                break;
            };

            let timestamp = event.timestamp();
            if let Some(previous) = self.last_timestamp {
                if timestamp < previous {
                    return Err(EngineError::OutOfOrderEvent {
                        previous,
                        current: timestamp,
                    });
                }
            }
            self.last_timestamp = Some(timestamp);
            ctx.clock = Some(timestamp);

            queue.push(event);
            while let Some(event) = queue.pop() {
                self.dispatch(&event, ctx, &mut queue)?;
                dispatched += 1;
            }
        }

        Ok(dispatched)
    }

    fn dispatch(
        &self,
        event: &Event,
        ctx: &mut EngineContext,
        queue: &mut EventQueue,
    ) -> Result<(), EngineError> {
        let kind = event.kind();
        let handler = self
            .handlers
            .get(&kind)
            .copied()
            .ok_or(EngineError::UnroutedEvent { kind })?;
        trace!(?kind, timestamp = %event.timestamp(), "dispatching");
        handler(ctx, event, queue)
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut EngineContext, _: &Event, _: &mut EventQueue) -> Result<(), EngineError> {
        Ok(())
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register_handler(EventKind::Tick, noop).unwrap();
        let err = dispatcher.register_handler(EventKind::Tick, noop).unwrap_err();
        assert!(matches!(
            err,
            EngineError::DuplicateHandler {
                kind: EventKind::Tick
            }
        ));
    }

    #[test]
    fn replace_handler_overwrites() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register_handler(EventKind::Tick, noop).unwrap();
        dispatcher.replace_handler(EventKind::Tick, noop);
        assert!(dispatcher.is_routed(EventKind::Tick));
    }

    #[test]
    fn queue_is_fifo() {
        use crate::domain::TickEvent;
        use chrono::{TimeZone, Utc};

        let mut queue = EventQueue::new();
        for price in [1.0, 2.0] {
            queue.push(Event::Tick(TickEvent {
                instrument: "AAPL".into(),
                timestamp: Utc.timestamp_opt(0, 0).unwrap(),
                price,
            }));
        }
        let Some(Event::Tick(first)) = queue.pop() else {
            panic!("expected tick");
        };
        assert_eq!(first.price, 1.0);
        assert_eq!(queue.len(), 1);
    }
}
