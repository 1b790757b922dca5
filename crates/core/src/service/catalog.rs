use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;

use super::Gallery;
use crate::catalog::variant::derive_availability;
use crate::catalog::{
    Art, ArtDetail, ArtFilter, ArtInput, ArtSummary, ArtVariant, Artist, ArtistInput, Collection,
    CollectionInput, CollectionView, HomepageSlot, Media, MediaInput, VariantInput, VariantMedium,
};
use crate::error::{GalleryError, GalleryResult};
use crate::events::types::AvailabilityEvent;
use crate::events::GalleryEvent;
use crate::ids::{ArtId, ArtistId, CollectionId, MediaId, VariantId};

/// Landing page payload: whatever holds each homepage slot, plus featured art.
#[derive(Debug, Clone, Serialize)]
pub struct Homepage {
    pub slots: BTreeMap<HomepageSlot, Media>,
    pub featured: Vec<ArtSummary>,
}

impl Gallery {
    // Artists

    pub async fn create_artist(&self, input: ArtistInput) -> GalleryResult<Artist> {
        let input = input.validated()?;
        let artist = self.store.insert_artist(&input).await?;
        tracing::info!(artist_id = %artist.id, "artist created");
        Ok(artist)
    }

    pub async fn update_artist(&self, id: ArtistId, input: ArtistInput) -> GalleryResult<Artist> {
        let input = input.validated()?;
        Ok(self.store.update_artist(id, &input).await?)
    }

    pub async fn artist(&self, id: ArtistId) -> GalleryResult<Artist> {
        self.store
            .artist(id)
            .await?
            .ok_or_else(|| GalleryError::not_found("artist", id))
    }

    pub async fn artists(&self) -> GalleryResult<Vec<Artist>> {
        Ok(self.store.artists().await?)
    }

    /// Removes the artist with every collection, art piece and variant
    /// under it.
    pub async fn delete_artist(&self, id: ArtistId) -> GalleryResult<()> {
        if !self.store.delete_artist(id).await? {
            return Err(GalleryError::not_found("artist", id));
        }
        tracing::info!(artist_id = %id, "artist deleted");
        Ok(())
    }

    pub async fn art_by_artist(&self, id: ArtistId) -> GalleryResult<Vec<ArtSummary>> {
        self.artist(id).await?;
        self.summaries_where(|r| r.artist_id == id).await
    }

    // Collections

    pub async fn create_collection(&self, input: CollectionInput) -> GalleryResult<Collection> {
        let input = input.validated()?;
        self.artist(input.artist_id).await?;
        let collection = self.store.insert_collection(&input).await?;
        tracing::info!(collection_id = %collection.id, "collection created");
        Ok(collection)
    }

    pub async fn update_collection(
        &self,
        id: CollectionId,
        input: CollectionInput,
    ) -> GalleryResult<Collection> {
        let input = input.validated()?;
        self.artist(input.artist_id).await?;
        Ok(self.store.update_collection(id, &input).await?)
    }

    pub async fn collection(&self, id: CollectionId) -> GalleryResult<CollectionView> {
        let collection = self
            .store
            .collection(id)
            .await?
            .ok_or_else(|| GalleryError::not_found("collection", id))?;
        let artist = self.artist(collection.artist_id).await?;
        let art = self.summaries_where(|r| r.art.collection_id == id).await?;
        Ok(CollectionView {
            collection,
            artist,
            art,
        })
    }

    /// Every collection with its artist and art.
    pub async fn gallery(&self) -> GalleryResult<Vec<CollectionView>> {
        let collections = self.store.collections().await?;
        let artists = self.store.artists().await?;
        let records = self.store.art_records().await?;

        let mut views = Vec::with_capacity(collections.len());
        for collection in collections {
            let Some(artist) = artists.iter().find(|a| a.id == collection.artist_id) else {
                continue;
            };
            let art = records
                .iter()
                .filter(|r| r.art.collection_id == collection.id)
                .map(ArtSummary::from)
                .collect();
            views.push(CollectionView {
                artist: artist.clone(),
                collection,
                art,
            });
        }
        Ok(views)
    }

    pub async fn delete_collection(&self, id: CollectionId) -> GalleryResult<()> {
        if !self.store.delete_collection(id).await? {
            return Err(GalleryError::not_found("collection", id));
        }
        tracing::info!(collection_id = %id, "collection deleted");
        Ok(())
    }

    // Art

    pub async fn create_art(&self, input: ArtInput) -> GalleryResult<Art> {
        let input = input.validated()?;
        self.require_collection(input.collection_id).await?;
        let art = self.store.insert_art(&input).await?;
        tracing::info!(art_id = %art.id, "art created");
        Ok(art)
    }

    pub async fn update_art(&self, id: ArtId, input: ArtInput) -> GalleryResult<Art> {
        let input = input.validated()?;
        self.require_collection(input.collection_id).await?;
        Ok(self.store.update_art(id, &input).await?)
    }

    pub async fn art_detail(&self, id: ArtId) -> GalleryResult<ArtDetail> {
        let record = self
            .store
            .art_record(id)
            .await?
            .ok_or_else(|| GalleryError::not_found("art", id))?;
        let media = self.store.media_for_art(id).await?;
        Ok(ArtDetail {
            summary: ArtSummary::from(&record),
            variants: record.variants,
            media,
        })
    }

    /// Art listing, newest first, narrowed by `filter`.
    pub async fn list_art(&self, filter: &ArtFilter) -> GalleryResult<Vec<ArtSummary>> {
        self.summaries_where(|r| filter.matches(r)).await
    }

    pub async fn featured_art(&self) -> GalleryResult<Vec<ArtSummary>> {
        self.summaries_where(|r| r.art.is_featured).await
    }

    pub async fn set_featured(&self, id: ArtId, is_featured: bool) -> GalleryResult<Art> {
        Ok(self.store.set_art_featured(id, is_featured).await?)
    }

    pub async fn delete_art(&self, id: ArtId) -> GalleryResult<()> {
        if !self.store.delete_art(id).await? {
            return Err(GalleryError::not_found("art", id));
        }
        tracing::info!(art_id = %id, "art deleted");
        Ok(())
    }

    async fn require_collection(&self, id: CollectionId) -> GalleryResult<Collection> {
        self.store
            .collection(id)
            .await?
            .ok_or_else(|| GalleryError::not_found("collection", id))
    }

    // Variants

    /// Create or replace the art's variant in `medium`, then re-derive the
    /// art's availability.
    pub async fn save_variant(
        &self,
        art_id: ArtId,
        medium: VariantMedium,
        input: VariantInput,
    ) -> GalleryResult<ArtVariant> {
        let input = input.validated()?;
        if self.store.art(art_id).await?.is_none() {
            return Err(GalleryError::not_found("art", art_id));
        }
        let variant = self.store.upsert_variant(art_id, medium, &input).await?;
        self.refresh_availability(art_id).await?;
        Ok(variant)
    }

    pub async fn variants(&self, art_id: ArtId) -> GalleryResult<Vec<ArtVariant>> {
        Ok(self.store.variants_for_art(art_id).await?)
    }

    /// Deletes the variant along with any basket lines holding it.
    pub async fn delete_variant(&self, id: VariantId) -> GalleryResult<ArtVariant> {
        let variant = self
            .store
            .delete_variant(id)
            .await?
            .ok_or_else(|| GalleryError::not_found("variant", id))?;
        self.refresh_availability(variant.art_id).await?;
        Ok(variant)
    }

    /// Rewrite `is_available` from the variants. Returns the derived value.
    pub async fn refresh_availability(&self, art_id: ArtId) -> GalleryResult<bool> {
        let art = self
            .store
            .art(art_id)
            .await?
            .ok_or_else(|| GalleryError::not_found("art", art_id))?;
        let variants = self.store.variants_for_art(art_id).await?;
        let is_available = derive_availability(&variants);
        if art.is_available != is_available {
            self.store.set_art_availability(art_id, is_available).await?;
            tracing::info!(%art_id, is_available, "art availability changed");
            self.events
                .publish(GalleryEvent::ArtAvailabilityChanged(AvailabilityEvent {
                    art_id,
                    is_available,
                    timestamp: Utc::now(),
                }));
        }
        Ok(is_available)
    }

    // Media

    pub async fn create_media(&self, input: MediaInput) -> GalleryResult<Media> {
        let input = input.validated()?;
        if let Some(art_id) = input.art_id {
            if self.store.art(art_id).await?.is_none() {
                return Err(GalleryError::not_found("art", art_id));
            }
        }
        if let Some(variant_id) = input.variant_id {
            let variant = self
                .store
                .variant(variant_id)
                .await?
                .ok_or_else(|| GalleryError::not_found("variant", variant_id))?;
            if input.art_id.is_some_and(|art_id| art_id != variant.art_id) {
                return Err(GalleryError::Conflict(format!(
                    "variant {variant_id} belongs to art {}",
                    variant.art_id
                )));
            }
        }
        Ok(self.store.insert_media(&input).await?)
    }

    pub async fn media(&self, id: MediaId) -> GalleryResult<Media> {
        self.store
            .media(id)
            .await?
            .ok_or_else(|| GalleryError::not_found("media", id))
    }

    pub async fn media_for_art(&self, art_id: ArtId) -> GalleryResult<Vec<Media>> {
        Ok(self.store.media_for_art(art_id).await?)
    }

    /// Give `id` the homepage slot, taking it from any previous holder.
    /// `None` clears the media's slot.
    pub async fn assign_slot(&self, id: MediaId, slot: Option<HomepageSlot>) -> GalleryResult<Media> {
        let media = self.store.assign_media_slot(id, slot).await?;
        tracing::info!(media_id = %id, slot = ?slot, "homepage slot assigned");
        Ok(media)
    }

    pub async fn delete_media(&self, id: MediaId) -> GalleryResult<()> {
        if !self.store.delete_media(id).await? {
            return Err(GalleryError::not_found("media", id));
        }
        Ok(())
    }

    pub async fn homepage(&self) -> GalleryResult<Homepage> {
        let slots = self
            .store
            .slotted_media()
            .await?
            .into_iter()
            .filter_map(|m| m.slot.map(|slot| (slot, m)))
            .collect();
        let featured = self.featured_art().await?;
        Ok(Homepage { slots, featured })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::Placement;
    use crate::service::tests::{seed, Seed};

    fn priced(available: bool, cents: i64) -> VariantInput {
        VariantInput {
            is_available: available,
            price: Some(Decimal::new(cents, 2)),
            currency: None,
        }
    }

    #[tokio::test]
    async fn availability_follows_variants() {
        let Seed { gallery, art, .. } = seed().await;
        let mut rx = gallery.events().subscribe();

        assert!(!gallery.art_detail(art.id).await.unwrap().summary.art.is_available);

        gallery
            .save_variant(art.id, VariantMedium::PrintedPoster, priced(true, 4000))
            .await
            .unwrap();
        assert!(gallery.art_detail(art.id).await.unwrap().summary.art.is_available);
        assert!(matches!(
            rx.recv().await.unwrap(),
            GalleryEvent::ArtAvailabilityChanged(AvailabilityEvent { is_available: true, .. })
        ));

        let poster = gallery
            .save_variant(art.id, VariantMedium::PrintedPoster, priced(false, 4000))
            .await
            .unwrap();
        assert!(!gallery.art_detail(art.id).await.unwrap().summary.art.is_available);

        gallery
            .save_variant(art.id, VariantMedium::DigitalCopy, priced(true, 1500))
            .await
            .unwrap();
        gallery.delete_variant(poster.id).await.unwrap();
        assert!(gallery.art_detail(art.id).await.unwrap().summary.art.is_available);
    }

    #[tokio::test]
    async fn available_variant_needs_a_price() {
        let Seed { gallery, art, .. } = seed().await;
        let err = gallery
            .save_variant(
                art.id,
                VariantMedium::OriginalPiece,
                VariantInput {
                    is_available: true,
                    price: None,
                    currency: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::Validation(_)));
    }

    #[tokio::test]
    async fn listing_filters_and_effective_price() {
        let Seed { gallery, art, .. } = seed().await;
        gallery
            .save_variant(art.id, VariantMedium::OriginalPiece, priced(true, 150000))
            .await
            .unwrap();
        gallery
            .save_variant(art.id, VariantMedium::PrintedPoster, priced(true, 8000))
            .await
            .unwrap();

        let cheap = ArtFilter {
            max_price: Some(Decimal::new(100, 0)),
            ..Default::default()
        };
        let found = gallery.list_art(&cheap).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].price_display, "USD 80.00");

        let search = ArtFilter {
            search: Some("test artist".into()),
            ..Default::default()
        };
        assert_eq!(gallery.list_art(&search).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn gallery_groups_art_by_collection() {
        let Seed { gallery, collection, .. } = seed().await;
        let views = gallery.gallery().await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].collection.id, collection.id);
        assert_eq!(views[0].artist.name, "Test Artist");
        assert_eq!(views[0].art[0].display_name, "Artwork 1 by Test Artist");
    }

    #[tokio::test]
    async fn deleting_artist_cascades() {
        let Seed { gallery, artist, art, .. } = seed().await;
        gallery.delete_artist(artist.id).await.unwrap();
        assert!(matches!(
            gallery.art_detail(art.id).await,
            Err(GalleryError::NotFound { entity: "art", .. })
        ));
        assert!(gallery.gallery().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn homepage_shows_slots_and_featured() {
        let Seed { gallery, art, .. } = seed().await;
        gallery.set_featured(art.id, true).await.unwrap();
        let media = gallery
            .create_media(MediaInput {
                art_id: None,
                variant_id: None,
                file_url: Some("https://media.example/hero.jpg".into()),
                kind: Default::default(),
                caption: "Hero".into(),
                is_primary: false,
                ordering: 0,
                placement: Placement::Homepage,
            })
            .await
            .unwrap();
        gallery.assign_slot(media.id, Some(HomepageSlot::Hero)).await.unwrap();

        let home = gallery.homepage().await.unwrap();
        assert_eq!(home.slots[&HomepageSlot::Hero].id, media.id);
        assert_eq!(home.featured.len(), 1);
    }
}
