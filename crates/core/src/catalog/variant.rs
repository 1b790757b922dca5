use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{ArtId, VariantId};
use crate::money::Money;
use crate::validate::{self, ValidationError};

/// The fixed set of formats an art piece can be sold in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantMedium {
    OriginalPiece,
    PrintedPoster,
    DigitalCopy,
}

impl VariantMedium {
    pub const ALL: [VariantMedium; 3] = [
        VariantMedium::OriginalPiece,
        VariantMedium::PrintedPoster,
        VariantMedium::DigitalCopy,
    ];

    /// Label shown to buyers and frozen into order items.
    pub fn label(self) -> &'static str {
        match self {
            VariantMedium::OriginalPiece => "Original Piece",
            VariantMedium::PrintedPoster => "Printed Poster",
            VariantMedium::DigitalCopy => "Digital Copy",
        }
    }
}

text_enum!(VariantMedium {
    OriginalPiece => "original_piece",
    PrintedPoster => "printed_poster",
    DigitalCopy => "digital_copy",
});

/// One purchasable format of an art piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtVariant {
    pub id: VariantId,
    pub art_id: ArtId,
    pub medium: VariantMedium,
    pub is_available: bool,
    pub price: Option<Decimal>,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArtVariant {
    /// Available and priced: the only state a basket accepts.
    pub fn is_purchasable(&self) -> bool {
        self.is_available && self.price.is_some()
    }

    pub fn money(&self) -> Option<Money> {
        self.price.map(|amount| Money::new(amount, self.currency.clone()))
    }
}

/// Owner form for one `(art, medium)` variant; saving is an upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantInput {
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl VariantInput {
    pub fn validated(self) -> Result<Self, ValidationError> {
        let price = validate::amount("price", self.price)?;
        if self.is_available && price.is_none() {
            return Err(ValidationError::AvailableWithoutPrice);
        }
        Ok(Self {
            is_available: self.is_available,
            price,
            currency: Some(validate::currency("currency", self.currency.as_deref())?),
        })
    }

    pub fn currency_or_default(&self) -> String {
        self.currency
            .clone()
            .unwrap_or_else(|| crate::money::DEFAULT_CURRENCY.to_string())
    }
}

/// An art piece is available when any of its variants is.
pub fn derive_availability(variants: &[ArtVariant]) -> bool {
    variants.iter().any(|v| v.is_available)
}

/// Variant picked when a buyer does not name one: an available original,
/// then any available variant in medium order.
pub fn default_variant(variants: &[ArtVariant]) -> Option<&ArtVariant> {
    let mut purchasable: Vec<&ArtVariant> = variants.iter().filter(|v| v.is_purchasable()).collect();
    purchasable.sort_by_key(|v| v.medium);
    purchasable.first().copied()
}

/// Cheapest available, priced variant.
pub fn cheapest_available(variants: &[ArtVariant]) -> Option<Money> {
    variants
        .iter()
        .filter(|v| v.is_purchasable())
        .filter_map(ArtVariant::money)
        .min_by(|a, b| a.amount.cmp(&b.amount))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn variant(id: i64, medium: VariantMedium, available: bool, price: Option<i64>) -> ArtVariant {
        ArtVariant {
            id: VariantId(id),
            art_id: ArtId(1),
            medium,
            is_available: available,
            price: price.map(|p| Decimal::new(p, 0)),
            currency: "USD".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn medium_round_trips_through_text() {
        for medium in VariantMedium::ALL {
            assert_eq!(medium.as_str().parse::<VariantMedium>().unwrap(), medium);
        }
        assert!("canvas".parse::<VariantMedium>().is_err());
        assert_eq!(VariantMedium::PrintedPoster.label(), "Printed Poster");
    }

    #[test]
    fn availability_is_any_variant() {
        assert!(!derive_availability(&[]));
        let variants = vec![
            variant(1, VariantMedium::OriginalPiece, false, Some(900)),
            variant(2, VariantMedium::DigitalCopy, true, Some(40)),
        ];
        assert!(derive_availability(&variants));
        assert!(!derive_availability(&variants[..1]));
    }

    #[test]
    fn default_prefers_available_original() {
        let variants = vec![
            variant(1, VariantMedium::DigitalCopy, true, Some(40)),
            variant(2, VariantMedium::OriginalPiece, true, Some(900)),
        ];
        assert_eq!(default_variant(&variants).unwrap().id, VariantId(2));

        let variants = vec![
            variant(1, VariantMedium::DigitalCopy, true, Some(40)),
            variant(2, VariantMedium::OriginalPiece, false, Some(900)),
            variant(3, VariantMedium::PrintedPoster, true, Some(120)),
        ];
        assert_eq!(default_variant(&variants).unwrap().id, VariantId(3));

        let variants = vec![variant(1, VariantMedium::OriginalPiece, false, Some(900))];
        assert!(default_variant(&variants).is_none());
    }

    #[test]
    fn cheapest_ignores_unavailable() {
        let variants = vec![
            variant(1, VariantMedium::OriginalPiece, true, Some(900)),
            variant(2, VariantMedium::PrintedPoster, true, Some(120)),
            variant(3, VariantMedium::DigitalCopy, false, Some(40)),
        ];
        assert_eq!(cheapest_available(&variants).unwrap().amount, Decimal::new(120, 0));
    }

    #[test]
    fn available_variant_needs_a_price() {
        let input = VariantInput {
            is_available: true,
            price: None,
            currency: None,
        };
        assert_eq!(input.validated(), Err(ValidationError::AvailableWithoutPrice));

        let input = VariantInput {
            is_available: false,
            price: None,
            currency: Some("gbp".into()),
        }
        .validated()
        .unwrap();
        assert_eq!(input.currency.as_deref(), Some("GBP"));
    }

    #[test]
    fn price_is_rounded_and_bounded() {
        let input = VariantInput {
            is_available: true,
            price: Some(Decimal::new(12345, 3)),
            currency: None,
        }
        .validated()
        .unwrap();
        assert_eq!(input.price, Some(Decimal::new(1235, 2)));

        let input = VariantInput {
            is_available: true,
            price: Some(Decimal::MAX),
            currency: None,
        };
        assert_eq!(input.validated(), Err(ValidationError::TooLarge { field: "price" }));
    }
}
