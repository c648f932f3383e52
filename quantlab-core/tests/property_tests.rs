//! Property tests over randomized inputs: ordering, conservation, and
//! fill-shape invariants that must hold for any price path.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use quantlab_core::board::DataBoard;
use quantlab_core::brokerage::SimBrokerage;
use quantlab_core::domain::{Event, Fill, Order, OrderSide, OrderType, TickEvent};
use quantlab_core::engine::Backtest;
use quantlab_core::feed::VecFeed;
use quantlab_core::ledger::PortfolioLedger;
use quantlab_core::strategy::MovingAverageCross;

const DAY: i64 = 86_400;

fn tick(secs: i64, price: f64) -> Event {
    Event::Tick(TickEvent {
        instrument: "X".into(),
        timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        price,
    })
}

fn price_series() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..1_000.0, 1..60)
}

fn run_ma_cross(prices: &[f64]) -> quantlab_core::performance::PerformanceRecord {
    let events: Vec<Event> = prices
        .iter()
        .enumerate()
        .map(|(i, &p)| tick(i as i64 * DAY, p))
        .collect();
    let mut backtest = Backtest::new(
        1_000_000.0,
        vec!["X".into()],
        Box::new(MovingAverageCross::new("X", 3, 8, 100.0)),
    )
    .unwrap();
    let mut feed = VecFeed::new(events);
    backtest.run(&mut feed).unwrap();
    backtest.finalize()
}

proptest! {
    #[test]
    fn record_timestamps_are_non_decreasing(prices in price_series()) {
        let record = run_ma_cross(&prices);
        prop_assert_eq!(record.rows.len(), prices.len());
        prop_assert!(record
            .rows
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
        prop_assert!(record
            .trades
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn every_row_balances_cash_plus_holdings(prices in price_series()) {
        let record = run_ma_cross(&prices);
        for row in &record.rows {
            let holdings: f64 = row.holdings.values().sum();
            prop_assert!((row.equity - (row.cash + holdings)).abs() < 1e-6);
        }
    }

    #[test]
    fn fills_match_their_orders(
        price in 1.0f64..1_000.0,
        quantity in 1.0f64..10_000.0,
        is_buy in any::<bool>(),
        limit_offset in -50.0f64..50.0,
        use_limit in any::<bool>(),
    ) {
        let mut board = DataBoard::new();
        board.on_tick(&TickEvent {
            instrument: "X".into(),
            timestamp: Utc.timestamp_opt(0, 0).unwrap(),
            price,
        });

        let side = if is_buy { OrderSide::Buy } else { OrderSide::Sell };
        let mut order = Order::market("X", Utc.timestamp_opt(0, 0).unwrap(), side, quantity);
        if use_limit {
            order.order_type = OrderType::Limit {
                limit_price: (price + limit_offset).max(0.01),
            };
        }

        let brokerage = SimBrokerage::default();
        if let Some(fill) = brokerage.place_order(&order, &board) {
            prop_assert_eq!(&fill.instrument, &order.instrument);
            prop_assert_eq!(fill.side, order.side);
            prop_assert!(fill.quantity.abs() <= order.quantity.abs());
            prop_assert_eq!(fill.fill_price, price);
            if let OrderType::Limit { limit_price } = order.order_type {
                match order.side {
                    OrderSide::Buy => prop_assert!(fill.fill_price <= limit_price),
                    OrderSide::Sell => prop_assert!(fill.fill_price >= limit_price),
                }
            }
        }
    }

    #[test]
    fn ledger_accounting_identity_holds(
        trades in prop::collection::vec(
            (any::<bool>(), 1.0f64..500.0, 1.0f64..200.0, 0.0f64..5.0),
            1..30,
        ),
    ) {
        let mut ledger = PortfolioLedger::new(1_000_000.0);
        for (is_buy, quantity, price, commission) in trades {
            ledger.on_fill(&Fill {
                instrument: "X".into(),
                timestamp: Utc.timestamp_opt(0, 0).unwrap(),
                side: if is_buy { OrderSide::Buy } else { OrderSide::Sell },
                quantity,
                fill_price: price,
                commission,
            });
        }
        let p = ledger.portfolio();
        let identity = p.initial_cash + p.realized_pnl + p.unrealized_pnl() - p.total_commission;
        prop_assert!((p.equity() - identity).abs() < 1e-6);
    }

    #[test]
    fn mark_to_market_is_idempotent(
        quantity in 1.0f64..500.0,
        cost in 1.0f64..200.0,
        mark in 1.0f64..200.0,
    ) {
        let mut ledger = PortfolioLedger::new(1_000_000.0);
        ledger.on_fill(&Fill {
            instrument: "X".into(),
            timestamp: Utc.timestamp_opt(0, 0).unwrap(),
            side: OrderSide::Buy,
            quantity,
            fill_price: cost,
            commission: 0.0,
        });

        let ts = Utc.timestamp_opt(DAY, 0).unwrap();
        ledger.mark_to_market(ts, "X", mark);
        let once = ledger.equity();
        ledger.mark_to_market(ts, "X", mark);
        prop_assert_eq!(ledger.equity(), once);
        prop_assert_eq!(ledger.cash(), 1_000_000.0 - quantity * cost);
    }
}
