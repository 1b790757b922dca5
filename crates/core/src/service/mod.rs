//! The [`Gallery`] service: validates input, enforces the catalog, basket
//! and order invariants on top of a [`GalleryStore`], charges payments and
//! publishes [`GalleryEvent`]s after successful changes.

mod basket;
mod catalog;
mod exhibitions;
mod messages;
mod orders;

use std::sync::Arc;

use chrono::Utc;

use crate::catalog::{ArtRecord, ArtSummary};
use crate::error::GalleryResult;
use crate::events::types::BasketEvent;
use crate::events::{EventBus, GalleryEvent};
use crate::ids::{ArtId, UserId};
use crate::payment::{PaymentProcessor, TestPaymentProcessor};
use crate::store::{GalleryStore, MemoryStore};

pub use catalog::Homepage;

#[derive(Debug, Clone)]
pub struct Gallery {
    store: Arc<dyn GalleryStore>,
    payments: Arc<dyn PaymentProcessor>,
    events: EventBus,
}

impl Gallery {
    pub fn new(
        store: Arc<dyn GalleryStore>,
        payments: Arc<dyn PaymentProcessor>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            payments,
            events,
        }
    }

    /// Memory store, test payments and a default-sized event bus.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(TestPaymentProcessor),
            EventBus::default(),
        )
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Succeeds when the store answers.
    pub async fn health(&self) -> GalleryResult<()> {
        self.store.ping().await?;
        Ok(())
    }

    /// Listing summaries for `ids`, in the order given; unknown ids are skipped.
    async fn summaries_for(&self, ids: &[ArtId]) -> GalleryResult<Vec<ArtSummary>> {
        let records = self.store.art_records().await?;
        Ok(ids
            .iter()
            .filter_map(|id| records.iter().find(|r| r.art.id == *id))
            .map(ArtSummary::from)
            .collect())
    }

    async fn summaries_where(&self, keep: impl Fn(&ArtRecord) -> bool) -> GalleryResult<Vec<ArtSummary>> {
        let records = self.store.art_records().await?;
        Ok(records.iter().filter(|r| keep(r)).map(ArtSummary::from).collect())
    }

    /// Announce the basket's new size. Runs after the change is committed,
    /// so a failed re-read is logged and the event skipped.
    async fn publish_basket(&self, user_id: UserId) {
        let item_count = match self.basket_count(user_id).await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "basket changed but could not be re-read");
                return;
            }
        };
        self.events.publish(GalleryEvent::BasketUpdated(BasketEvent {
            user_id,
            item_count,
            timestamp: Utc::now(),
        }));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::{Art, ArtInput, Artist, ArtistInput, Collection, CollectionInput};

    /// One artist with one collection holding one art piece, no variants.
    pub(crate) struct Seed {
        pub gallery: Gallery,
        pub artist: Artist,
        pub collection: Collection,
        pub art: Art,
    }

    pub(crate) async fn seed() -> Seed {
        seed_with(Gallery::in_memory()).await
    }

    pub(crate) async fn seed_with(gallery: Gallery) -> Seed {
        let artist = gallery
            .create_artist(ArtistInput {
                name: "Test Artist".into(),
                email: "artist@example.com".into(),
                phone_number: String::new(),
                bio: String::new(),
                image_url: None,
            })
            .await
            .unwrap();
        let collection = gallery
            .create_collection(CollectionInput {
                artist_id: artist.id,
                name: "Test Collection".into(),
                description: String::new(),
                cover_image_url: None,
            })
            .await
            .unwrap();
        let art = gallery
            .create_art(ArtInput {
                collection_id: collection.id,
                title: "Artwork 1".into(),
                medium: "Acrylic".into(),
                year_created: Some(2021),
                description: String::new(),
                width_cm: None,
                height_cm: None,
                depth_cm: None,
                price: None,
                currency: None,
                is_featured: false,
                image_url: None,
            })
            .await
            .unwrap();
        Seed {
            gallery,
            artist,
            collection,
            art,
        }
    }

    #[tokio::test]
    async fn health_pings_the_store() {
        assert!(Gallery::in_memory().health().await.is_ok());
    }
}
