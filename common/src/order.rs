use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MarketError;
use crate::identity::ConsumerRef;
use crate::product::ProductId;
use crate::supply::MilletType;

/// Unique order identifier (server-assigned, opaque).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

/// Fulfilment status over a fixed linear sequence, with `Cancelled` as an
/// absorbing alternative from any non-terminal state. There is deliberately
/// no set-arbitrary-status primitive: callers advance one step at a time,
/// which keeps the timeline's completed steps a prefix of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    OrderPlaced,
    Confirmed,
    PickedUp,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The fulfilment sequence. `Cancelled` is not a step.
    pub const SEQUENCE: [OrderStatus; 5] = [
        OrderStatus::OrderPlaced,
        OrderStatus::Confirmed,
        OrderStatus::PickedUp,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
    ];

    /// Next step in the sequence, or `None` at the end (and for `Cancelled`).
    pub fn next(self) -> Option<OrderStatus> {
        let idx = Self::SEQUENCE.iter().position(|s| *s == self)?;
        Self::SEQUENCE.get(idx + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            OrderStatus::OrderPlaced => "order_placed",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Human label derived from the wire name: separators become spaces,
    /// words are capitalized. Pure formatting, not a business rule.
    pub fn label(self) -> String {
        self.wire_name()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One ordered line: a product reference with the quantity and the price
/// captured at placement time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub millet_type: MilletType,
    pub quantity_kg: Decimal,
    pub price_per_kg: Decimal,
    pub line_total: Decimal,
}

/// One entry of an order's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
}

/// A consumer purchase of one or more product quantities. The total is
/// fixed at placement and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub consumer: ConsumerRef,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub dropoff_location: String,
    pub status: OrderStatus,
    pub history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Advance exactly one step along the fulfilment sequence. Fails with
    /// `AlreadyTerminal` on a delivered or cancelled order.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<OrderStatus, MarketError> {
        if self.status.is_terminal() {
            return Err(MarketError::AlreadyTerminal {
                status: self.status.wire_name().into(),
            });
        }
        let next = self
            .status
            .next()
            .ok_or_else(|| MarketError::AlreadyTerminal {
                status: self.status.wire_name().into(),
            })?;
        self.status = next;
        self.history.push(StatusChange { status: next, at: now });
        Ok(next)
    }

    /// Cancel the order. Valid from any state except delivered or cancelled.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), MarketError> {
        if self.status.is_terminal() {
            return Err(MarketError::AlreadyTerminal {
                status: self.status.wire_name().into(),
            });
        }
        self.status = OrderStatus::Cancelled;
        self.history.push(StatusChange {
            status: OrderStatus::Cancelled,
            at: now,
        });
        Ok(())
    }
}
