use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{ArtId, OrderId, UserId};
use crate::order::OrderStatus;

/// Events emitted after successful state changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GalleryEvent {
    ArtAvailabilityChanged(AvailabilityEvent),
    BasketUpdated(BasketEvent),
    OrderPlaced(OrderPlacedEvent),
    OrderStatusChanged(OrderStatusEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityEvent {
    pub art_id: ArtId,
    pub is_available: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketEvent {
    pub user_id: UserId,
    pub item_count: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlacedEvent {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub currency: String,
    pub item_count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusEvent {
    pub order_id: OrderId,
    pub previous: OrderStatus,
    pub current: OrderStatus,
    pub timestamp: DateTime<Utc>,
}
