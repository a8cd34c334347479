//! Time-limited customer orders.

use serde::{Deserialize, Serialize};

use crate::id::{ItemTypeId, OrderId};

/// A request for one finished item, valid for a limited number of ticks.
///
/// Orders are destroyed either by delivery or by expiry; nothing else
/// removes them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    /// Unique, monotonically assigned id.
    pub order_id: OrderId,
    /// The dish type that satisfies this order.
    pub item_type: ItemTypeId,
    /// Ticks left before the order expires. Removed as soon as it is `<= 0`.
    pub time_remaining: i64,
    /// Time-to-live the order was created with.
    pub max_time: u32,
}

impl Order {
    /// Create an order with a full countdown.
    pub fn new(order_id: OrderId, item_type: ItemTypeId, ttl: u32) -> Self {
        Self {
            order_id,
            item_type,
            time_remaining: i64::from(ttl),
            max_time: ttl,
        }
    }

    /// Whether the countdown has run out.
    pub fn is_expired(&self) -> bool {
        self.time_remaining <= 0
    }
}
