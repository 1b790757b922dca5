//! Orders are immutable purchase records created at checkout. Items carry
//! frozen copies of the art and variant details so the history survives
//! later edits or deletions of the catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::basket::BasketLine;
use crate::error::GalleryError;
use crate::ids::{ArtId, BasketItemId, OrderId, OrderItemId, UserId, VariantId};
use crate::money::{self, MAX_AMOUNT};
use crate::validate::{self, ValidationError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
    Refunded,
}

text_enum!(OrderStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

impl OrderStatus {
    /// Forward-only lifecycle: pending → processing → completed, with
    /// cancellation before completion and refunds once money has moved.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Cancelled)
                | (Processing, Refunded)
                | (Completed, Refunded)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub payment_reference: String,
    pub email: String,
    pub full_name: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    /// Cleared when the art is deleted; the frozen fields remain.
    pub art_id: Option<ArtId>,
    pub artwork_title: String,
    pub artwork_artist: String,
    pub artwork_medium: String,
    pub quantity: i32,
    pub price: Decimal,
    pub variant_id: Option<VariantId>,
    pub variant_medium: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Billing and shipping details collected at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutDetails {
    pub email: String,
    pub full_name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl CheckoutDetails {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            email: validate::email("email", &self.email)?,
            full_name: validate::required_text("full_name", &self.full_name, 200)?,
            address_line1: validate::required_text("address_line1", &self.address_line1, 255)?,
            address_line2: validate::optional_text("address_line2", &self.address_line2, 255)?,
            city: validate::required_text("city", &self.city, 100)?,
            postal_code: validate::required_text("postal_code", &self.postal_code, 20)?,
            country: validate::required_text("country", &self.country, 100)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub art_id: Option<ArtId>,
    pub artwork_title: String,
    pub artwork_artist: String,
    pub artwork_medium: String,
    pub quantity: i32,
    pub price: Decimal,
    pub variant_id: Option<VariantId>,
    pub variant_medium: String,
}

impl NewOrderItem {
    fn snapshot(line: &BasketLine) -> Self {
        Self {
            art_id: Some(line.item.art_id),
            artwork_title: line.art_title.clone(),
            artwork_artist: line.artist_name.clone(),
            artwork_medium: line.art_medium.clone(),
            quantity: line.item.quantity,
            price: line.item.price_at_addition,
            variant_id: Some(line.item.variant_id),
            variant_medium: line.variant_medium.label().to_string(),
        }
    }
}

/// The frozen contents of a basket about to become an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub items: Vec<NewOrderItem>,
    pub total_amount: Decimal,
    pub currency: String,
    /// Basket lines consumed by this order, with the quantity they had when
    /// the draft was taken.
    pub source_items: Vec<(BasketItemId, i32)>,
}

impl OrderDraft {
    /// Snapshot basket lines. Refuses an empty basket, lines whose variant is
    /// no longer available, baskets mixing currencies, and totals a price
    /// column cannot hold.
    pub fn from_lines(lines: &[BasketLine]) -> Result<Self, GalleryError> {
        let first = lines.first().ok_or(GalleryError::EmptyBasket)?;
        let currency = first.item.currency.clone();

        let mut total_amount = Decimal::ZERO;
        let mut items = Vec::with_capacity(lines.len());
        let mut source_items = Vec::with_capacity(lines.len());
        for line in lines {
            if !line.variant_available {
                return Err(GalleryError::Unavailable(format!(
                    "{} ({}) is no longer available",
                    line.art_title,
                    line.variant_medium.label()
                )));
            }
            if line.item.currency != currency {
                return Err(GalleryError::MixedCurrencies(format!(
                    "{currency} and {}",
                    line.item.currency
                )));
            }
            total_amount = total_amount
                .checked_add(line.item.line_total()?)
                .ok_or_else(|| GalleryError::AmountOutOfRange("order total".into()))?;
            items.push(NewOrderItem::snapshot(line));
            source_items.push((line.item.id, line.item.quantity));
        }
        if total_amount > MAX_AMOUNT {
            return Err(GalleryError::AmountOutOfRange(format!(
                "order total {} exceeds {}",
                money::format_price(total_amount, &currency),
                money::format_amount(MAX_AMOUNT)
            )));
        }

        Ok(Self {
            items,
            total_amount,
            currency,
            source_items,
        })
    }
}

/// Everything the store needs to persist an order atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub draft: OrderDraft,
    pub details: CheckoutDetails,
    pub payment_method: String,
    pub payment_reference: String,
}

/// Owner request to move an order along its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// Owner listing filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub status: Option<OrderStatus>,
}
