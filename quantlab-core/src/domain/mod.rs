//! Domain types — events, orders, fills, positions, portfolio.

pub mod event;
pub mod fill;
pub mod order;
pub mod portfolio;
pub mod position;

pub use event::{BarEvent, Event, EventKind, TickEvent};
pub use fill::Fill;
pub use order::{Order, OrderSide, OrderType};
pub use portfolio::Portfolio;
pub use position::Position;
