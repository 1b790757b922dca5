//! Per-user baskets. Each line snapshots the variant price at the moment it
//! was first added.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::VariantMedium;
use crate::error::{GalleryError, GalleryResult};
use crate::ids::{ArtId, BasketId, BasketItemId, UserId, VariantId};
use crate::money::Money;
use crate::validate::ValidationError;

/// Upper bound for a single line's quantity.
pub const MAX_ITEM_QUANTITY: i32 = 99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basket {
    pub id: BasketId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketItem {
    pub id: BasketItemId,
    pub basket_id: BasketId,
    pub art_id: ArtId,
    pub variant_id: VariantId,
    pub quantity: i32,
    pub price_at_addition: Decimal,
    pub currency: String,
    pub added_at: DateTime<Utc>,
}

impl BasketItem {
    pub fn line_total(&self) -> GalleryResult<Decimal> {
        self.price_at_addition
            .checked_mul(Decimal::from(self.quantity))
            .ok_or_else(|| GalleryError::AmountOutOfRange(format!("basket item {}", self.id)))
    }
}

/// A line to insert, or to merge into an existing `(basket, art, variant)` line.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBasketItem {
    pub art_id: ArtId,
    pub variant_id: VariantId,
    pub quantity: i32,
    pub price: Decimal,
    pub currency: String,
}

/// A basket item joined with the art and variant it points at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasketLine {
    #[serde(flatten)]
    pub item: BasketItem,
    pub art_title: String,
    pub artist_name: String,
    pub art_medium: String,
    pub variant_medium: VariantMedium,
    pub variant_available: bool,
}

/// Request body for adding to the basket. Without a medium the default
/// variant of the art is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddToBasket {
    pub art_id: ArtId,
    #[serde(default)]
    pub medium: Option<VariantMedium>,
    #[serde(default)]
    pub quantity: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: i32,
}

/// Basket page payload.
#[derive(Debug, Clone, Serialize)]
pub struct BasketView {
    pub basket: Basket,
    pub lines: Vec<BasketLine>,
    pub totals: Vec<Money>,
    pub item_count: i64,
}

impl BasketView {
    pub fn new(basket: Basket, lines: Vec<BasketLine>) -> GalleryResult<Self> {
        let items: Vec<&BasketItem> = lines.iter().map(|l| &l.item).collect();
        Ok(Self {
            totals: totals(items.iter().copied())?,
            item_count: item_count(items.iter().copied()),
            basket,
            lines,
        })
    }
}

/// Subtotals per currency, ordered by currency code.
pub fn totals<'a>(items: impl IntoIterator<Item = &'a BasketItem>) -> GalleryResult<Vec<Money>> {
    let mut by_currency: BTreeMap<&str, Decimal> = BTreeMap::new();
    for item in items {
        let line = item.line_total()?;
        let subtotal = by_currency.entry(item.currency.as_str()).or_default();
        *subtotal = subtotal
            .checked_add(line)
            .ok_or_else(|| GalleryError::AmountOutOfRange(format!("{} subtotal", item.currency)))?;
    }
    Ok(by_currency
        .into_iter()
        .map(|(currency, amount)| Money::new(amount, currency))
        .collect())
}

/// Number of pieces in the basket (sum of quantities).
pub fn item_count<'a>(items: impl IntoIterator<Item = &'a BasketItem>) -> i64 {
    items.into_iter().map(|i| i64::from(i.quantity)).sum()
}

pub fn check_quantity(quantity: i32) -> Result<i32, ValidationError> {
    if (1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        Ok(quantity)
    } else {
        Err(ValidationError::Quantity {
            min: 1,
            max: MAX_ITEM_QUANTITY,
        })
    }
}
