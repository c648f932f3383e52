//! Handler functions wired into the routing table by [`Backtest`].
//!
//! The tick/bar handlers fix the anti-look-ahead ordering in code: the
//! performance snapshot runs first, against the state from *before* this
//! event's mark, then the ledger re-marks, then the board absorbs the event,
//! and only then does the strategy see it. Changing this sequence changes
//! what the equity curve can observe.

use tracing::{debug, warn};

use crate::domain::{Event, EventKind};
use crate::engine::{EngineContext, EngineError, EventQueue};

pub fn tick_handler(
    ctx: &mut EngineContext,
    event: &Event,
    queue: &mut EventQueue,
) -> Result<(), EngineError> {
    let Event::Tick(tick) = event else {
        return Err(EngineError::KindMismatch {
            expected: EventKind::Tick,
            actual: event.kind(),
        });
    };

    ctx.performance
        .update_performance(tick.timestamp, ctx.ledger.portfolio(), &ctx.board);
    ctx.ledger
        .mark_to_market(tick.timestamp, &tick.instrument, tick.price);
    ctx.board.on_tick(tick);

    let mut orders = Vec::new();
    ctx.strategy.on_tick(tick, &ctx.board, &mut orders);
    for order in orders {
        queue.push(Event::Order(order));
    }
    Ok(())
}

pub fn bar_handler(
    ctx: &mut EngineContext,
    event: &Event,
    queue: &mut EventQueue,
) -> Result<(), EngineError> {
    let Event::Bar(bar) = event else {
        return Err(EngineError::KindMismatch {
            expected: EventKind::Bar,
            actual: event.kind(),
        });
    };

    ctx.performance
        .update_performance(bar.end, ctx.ledger.portfolio(), &ctx.board);
    ctx.ledger
        .mark_to_market(bar.end, &bar.instrument, bar.adj_close);
    ctx.board.on_bar(bar);

    let mut orders = Vec::new();
    ctx.strategy.on_bar(bar, &ctx.board, &mut orders);
    for order in orders {
        queue.push(Event::Order(order));
    }
    Ok(())
}

pub fn order_handler(
    ctx: &mut EngineContext,
    event: &Event,
    queue: &mut EventQueue,
) -> Result<(), EngineError> {
    let Event::Order(order) = event else {
        return Err(EngineError::KindMismatch {
            expected: EventKind::Order,
            actual: event.kind(),
        });
    };

    let verdict = ctx.risk.check(order, ctx.ledger.portfolio());
    if let crate::risk::RiskVerdict::Rejected { reason } = verdict {
        ctx.risk_rejections += 1;
        warn!(
            instrument = %order.instrument,
            quantity = order.quantity,
            %reason,
            "order rejected by risk gate"
        );
        return Ok(());
    }

    match ctx.brokerage.place_order(order, &ctx.board) {
        Some(fill) => queue.push(Event::Fill(fill)),
        None => debug!(instrument = %order.instrument, "order produced no fill"),
    }
    Ok(())
}

pub fn fill_handler(
    ctx: &mut EngineContext,
    event: &Event,
    _queue: &mut EventQueue,
) -> Result<(), EngineError> {
    let Event::Fill(fill) = event else {
        return Err(EngineError::KindMismatch {
            expected: EventKind::Fill,
            actual: event.kind(),
        });
    };

    ctx.ledger.on_fill(fill);
    ctx.performance.on_fill(fill);
    Ok(())
}
