use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::media::Media;
use super::variant::{self, ArtVariant};
use crate::ids::{ArtId, ArtistId, CollectionId};
use crate::money::{self, Money, DEFAULT_CURRENCY};
use crate::validate::{self, ValidationError};

/// A gallery piece, the unit of sale.
///
/// `is_available` is derived from the variants and is rewritten after every
/// variant change; it is never taken from client input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Art {
    pub id: ArtId,
    pub collection_id: CollectionId,
    pub title: String,
    pub medium: String,
    pub year_created: Option<i32>,
    pub description: String,
    pub width_cm: Option<Decimal>,
    pub height_cm: Option<Decimal>,
    pub depth_cm: Option<Decimal>,
    pub price: Option<Decimal>,
    pub currency: String,
    pub is_available: bool,
    pub is_featured: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Art {
    /// `W x H cm`, `W x H x D cm`, or `Size not specified`.
    pub fn size_display(&self) -> String {
        match (self.width_cm, self.height_cm, self.depth_cm) {
            (Some(w), Some(h), Some(d)) => {
                format!("{} x {} x {} cm", money::fixed2(w), money::fixed2(h), money::fixed2(d))
            }
            (Some(w), Some(h), None) => format!("{} x {} cm", money::fixed2(w), money::fixed2(h)),
            _ => "Size not specified".to_string(),
        }
    }

    /// Base price with currency, e.g. `USD 1,500.00`.
    pub fn price_display(&self) -> String {
        match self.price {
            Some(amount) => money::format_price(amount, &self.currency),
            None => "Price not available".to_string(),
        }
    }

    pub fn display_name(&self, artist_name: &str) -> String {
        format!("{} by {}", self.title, artist_name)
    }
}

/// Create/edit form for an art piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtInput {
    pub collection_id: CollectionId,
    pub title: String,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub year_created: Option<i32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub width_cm: Option<Decimal>,
    #[serde(default)]
    pub height_cm: Option<Decimal>,
    #[serde(default)]
    pub depth_cm: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ArtInput {
    pub fn validated(self) -> Result<Self, ValidationError> {
        if let Some(year) = self.year_created {
            if !(0..=9999).contains(&year) {
                return Err(ValidationError::Invalid {
                    field: "year_created",
                    reason: "must be a four-digit year".into(),
                });
            }
        }
        Ok(Self {
            collection_id: self.collection_id,
            title: validate::required_text("title", &self.title, 200)?,
            medium: validate::optional_text("medium", &self.medium, 100)?,
            year_created: self.year_created,
            description: validate::optional_text("description", &self.description, 10_000)?,
            width_cm: validate::amount("width_cm", self.width_cm)?,
            height_cm: validate::amount("height_cm", self.height_cm)?,
            depth_cm: validate::amount("depth_cm", self.depth_cm)?,
            price: validate::amount("price", self.price)?,
            currency: Some(validate::currency("currency", self.currency.as_deref())?),
            is_featured: self.is_featured,
            image_url: validate::optional_url("image_url", self.image_url.as_deref())?,
        })
    }

    pub fn currency_or_default(&self) -> String {
        self.currency.clone().unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
    }
}

/// An art piece joined with everything listings need.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtRecord {
    pub art: Art,
    pub artist_id: ArtistId,
    pub artist_name: String,
    pub collection_name: String,
    pub variants: Vec<ArtVariant>,
}

impl ArtRecord {
    /// Cheapest purchasable variant, else the base price.
    pub fn effective_price(&self) -> Option<Money> {
        variant::cheapest_available(&self.variants).or_else(|| {
            self.art
                .price
                .map(|amount| Money::new(amount, self.art.currency.clone()))
        })
    }
}

/// Listing entry for an art piece.
#[derive(Debug, Clone, Serialize)]
pub struct ArtSummary {
    #[serde(flatten)]
    pub art: Art,
    pub artist_id: ArtistId,
    pub artist_name: String,
    pub collection_name: String,
    pub display_name: String,
    pub effective_price: Option<Money>,
    pub price_display: String,
    pub size_display: String,
}

impl From<&ArtRecord> for ArtSummary {
    fn from(record: &ArtRecord) -> Self {
        let effective_price = record.effective_price();
        let price_display = effective_price
            .as_ref()
            .map(Money::display)
            .unwrap_or_else(|| "Price not available".to_string());
        Self {
            art: record.art.clone(),
            artist_id: record.artist_id,
            artist_name: record.artist_name.clone(),
            collection_name: record.collection_name.clone(),
            display_name: record.art.display_name(&record.artist_name),
            effective_price,
            price_display,
            size_display: record.art.size_display(),
        }
    }
}

/// Detail page payload: summary plus variants and media.
#[derive(Debug, Clone, Serialize)]
pub struct ArtDetail {
    #[serde(flatten)]
    pub summary: ArtSummary,
    pub variants: Vec<ArtVariant>,
    pub media: Vec<Media>,
}

/// Query-string filter for art listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtFilter {
    /// Case-insensitive match on title, medium or artist name.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub collection: Option<CollectionId>,
    #[serde(default)]
    pub artist: Option<ArtistId>,
}

impl ArtFilter {
    pub fn matches(&self, record: &ArtRecord) -> bool {
        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            let hit = [&record.art.title, &record.art.medium, &record.artist_name]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            let Some(price) = record.effective_price() else {
                return false;
            };
            if self.min_price.is_some_and(|min| price.amount < min) {
                return false;
            }
            if self.max_price.is_some_and(|max| price.amount > max) {
                return false;
            }
        }
        if self.featured.is_some_and(|f| record.art.is_featured != f) {
            return false;
        }
        if self.available.is_some_and(|a| record.art.is_available != a) {
            return false;
        }
        if self.collection.is_some_and(|c| record.art.collection_id != c) {
            return false;
        }
        if self.artist.is_some_and(|a| record.artist_id != a) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::variant::tests::variant;
    use crate::catalog::VariantMedium;

    fn art(title: &str, medium: &str) -> Art {
        Art {
            id: ArtId(1),
            collection_id: CollectionId(1),
            title: title.into(),
            medium: medium.into(),
            year_created: Some(2021),
            description: String::new(),
            width_cm: Some(Decimal::new(5000, 2)),
            height_cm: Some(Decimal::new(7000, 2)),
            depth_cm: Some(Decimal::new(300, 2)),
            price: Some(Decimal::new(150000, 2)),
            currency: "USD".into(),
            is_available: true,
            is_featured: false,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn record(title: &str, medium: &str, artist: &str, variants: Vec<ArtVariant>) -> ArtRecord {
        ArtRecord {
            art: art(title, medium),
            artist_id: ArtistId(1),
            artist_name: artist.into(),
            collection_name: "Test".into(),
            variants,
        }
    }

    #[test]
    fn size_display_formats() {
        let mut piece = art("Tide", "Oil on Canvas");
        assert_eq!(piece.size_display(), "50.00 x 70.00 x 3.00 cm");

        piece.depth_cm = None;
        piece.width_cm = Some(Decimal::new(30, 0));
        piece.height_cm = Some(Decimal::new(40, 0));
        assert_eq!(piece.size_display(), "30.00 x 40.00 cm");

        piece.height_cm = None;
        assert_eq!(piece.size_display(), "Size not specified");
    }

    #[test]
    fn price_display_formats() {
        let mut piece = art("Tide", "Oil on Canvas");
        assert_eq!(piece.price_display(), "USD 1,500.00");
        piece.price = None;
        assert_eq!(piece.price_display(), "Price not available");
    }

    #[test]
    fn display_name_names_artist() {
        assert_eq!(art("Tide", "Oil").display_name("Test Artist"), "Tide by Test Artist");
    }

    #[test]
    fn effective_price_prefers_variants() {
        let with_poster = record(
            "Tide",
            "Oil",
            "Ann",
            vec![variant(1, VariantMedium::PrintedPoster, true, Some(80))],
        );
        assert_eq!(with_poster.effective_price().unwrap().amount, Decimal::new(80, 0));

        let bare = record("Tide", "Oil", "Ann", vec![]);
        assert_eq!(bare.effective_price().unwrap().amount, Decimal::new(150000, 2));
    }

    #[test]
    fn search_covers_title_medium_and_artist() {
        let rec = record("Artwork 1", "Acrylic", "Test Artist", vec![]);
        let by = |s: &str| ArtFilter {
            search: Some(s.into()),
            ..Default::default()
        };
        assert!(by("artwork 1").matches(&rec));
        assert!(by("ACRYLIC").matches(&rec));
        assert!(by("test art").matches(&rec));
        assert!(!by("watercolor").matches(&rec));
        assert!(by("   ").matches(&rec));
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let cheap = record("A", "Oil", "Ann", vec![variant(1, VariantMedium::OriginalPiece, true, Some(1000))]);
        let dear = record("B", "Oil", "Ann", vec![variant(2, VariantMedium::OriginalPiece, true, Some(2500))]);
        let min = ArtFilter {
            min_price: Some(Decimal::new(1200, 0)),
            ..Default::default()
        };
        let max = ArtFilter {
            max_price: Some(Decimal::new(1000, 0)),
            ..Default::default()
        };
        assert!(!min.matches(&cheap));
        assert!(min.matches(&dear));
        assert!(max.matches(&cheap));
        assert!(!max.matches(&dear));
    }

    #[test]
    fn unpriced_art_fails_price_filters() {
        let mut rec = record("A", "Oil", "Ann", vec![]);
        rec.art.price = None;
        let filter = ArtFilter {
            max_price: Some(Decimal::new(10_000, 0)),
            ..Default::default()
        };
        assert!(!filter.matches(&rec));
        assert!(ArtFilter::default().matches(&rec));
    }

    #[test]
    fn input_rejects_negative_dimensions() {
        let input = ArtInput {
            collection_id: CollectionId(1),
            title: "Tide".into(),
            medium: String::new(),
            year_created: None,
            description: String::new(),
            width_cm: Some(Decimal::new(-1, 0)),
            height_cm: None,
            depth_cm: None,
            price: None,
            currency: None,
            is_featured: false,
            image_url: None,
        };
        assert_eq!(input.validated().unwrap_err().field(), "width_cm");
    }
}
