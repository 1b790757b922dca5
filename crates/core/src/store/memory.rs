use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{GalleryStore, StoreError, StoreResult};
use crate::basket::{Basket, BasketItem, BasketLine, NewBasketItem};
use crate::catalog::{
    Art, ArtInput, ArtRecord, ArtVariant, Artist, ArtistInput, Collection, CollectionInput,
    HomepageSlot, Media, MediaInput, VariantInput, VariantMedium,
};
use crate::exhibition::{Exhibition, ExhibitionInput};
use crate::ids::{
    ArtId, ArtistId, BasketId, BasketItemId, CollectionId, ExhibitionId, MediaId, MessageId,
    OrderId, OrderItemId, UserId, VariantId,
};
use crate::message::{Message, MessageInput};
use crate::order::{NewOrder, Order, OrderDetail, OrderItem, OrderStatus};

/// In-memory store. One lock guards every table, so each trait call is
/// atomic with respect to the others.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore(Arc<Mutex<Tables>>);

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a variant row while leaving whatever references it in place.
    #[cfg(test)]
    pub(crate) async fn forget_variant(&self, id: VariantId) {
        self.0.lock().await.variants.remove(&id);
    }
}

#[derive(Debug, Default)]
struct Tables {
    sequences: HashMap<&'static str, i64>,
    artists: BTreeMap<ArtistId, Artist>,
    collections: BTreeMap<CollectionId, Collection>,
    art: BTreeMap<ArtId, Art>,
    variants: BTreeMap<VariantId, ArtVariant>,
    media: BTreeMap<MediaId, Media>,
    exhibitions: BTreeMap<ExhibitionId, Exhibition>,
    exhibition_art: BTreeSet<(ExhibitionId, ArtId)>,
    messages: BTreeMap<MessageId, Message>,
    baskets: BTreeMap<BasketId, Basket>,
    basket_items: BTreeMap<BasketItemId, BasketItem>,
    orders: BTreeMap<OrderId, Order>,
    order_items: BTreeMap<OrderItemId, OrderItem>,
}

impl Tables {
    fn next_id(&mut self, table: &'static str) -> i64 {
        let seq = self.sequences.entry(table).or_insert(0);
        *seq += 1;
        *seq
    }

    fn record(&self, art: &Art) -> StoreResult<ArtRecord> {
        let collection = self
            .collections
            .get(&art.collection_id)
            .ok_or_else(|| StoreError::Corrupt(format!("art {} has no collection", art.id)))?;
        let artist = self
            .artists
            .get(&collection.artist_id)
            .ok_or_else(|| StoreError::Corrupt(format!("collection {} has no artist", collection.id)))?;
        let mut variants: Vec<ArtVariant> = self
            .variants
            .values()
            .filter(|v| v.art_id == art.id)
            .cloned()
            .collect();
        variants.sort_by_key(|v| v.medium);
        Ok(ArtRecord {
            art: art.clone(),
            artist_id: artist.id,
            artist_name: artist.name.clone(),
            collection_name: collection.name.clone(),
            variants,
        })
    }

    fn remove_variant_cascade(&mut self, id: VariantId) -> Option<ArtVariant> {
        self.basket_items.retain(|_, item| item.variant_id != id);
        for media in self.media.values_mut() {
            if media.variant_id == Some(id) {
                media.variant_id = None;
            }
        }
        self.variants.remove(&id)
    }

    fn remove_art_cascade(&mut self, id: ArtId) -> bool {
        let variant_ids: Vec<VariantId> = self
            .variants
            .values()
            .filter(|v| v.art_id == id)
            .map(|v| v.id)
            .collect();
        for variant_id in variant_ids {
            self.remove_variant_cascade(variant_id);
        }
        self.basket_items.retain(|_, item| item.art_id != id);
        for media in self.media.values_mut() {
            if media.art_id == Some(id) {
                media.art_id = None;
            }
        }
        for item in self.order_items.values_mut() {
            if item.art_id == Some(id) {
                item.art_id = None;
            }
        }
        self.exhibition_art.retain(|(_, art_id)| *art_id != id);
        self.art.remove(&id).is_some()
    }

    fn remove_collection_cascade(&mut self, id: CollectionId) -> bool {
        let art_ids: Vec<ArtId> = self
            .art
            .values()
            .filter(|a| a.collection_id == id)
            .map(|a| a.id)
            .collect();
        for art_id in art_ids {
            self.remove_art_cascade(art_id);
        }
        self.collections.remove(&id).is_some()
    }

    fn basket_line(&self, item: &BasketItem) -> StoreResult<BasketLine> {
        let art = self
            .art
            .get(&item.art_id)
            .ok_or_else(|| StoreError::Corrupt(format!("basket item {} has no art", item.id)))?;
        let variant = self
            .variants
            .get(&item.variant_id)
            .ok_or_else(|| StoreError::Corrupt(format!("basket item {} has no variant", item.id)))?;
        let record = self.record(art)?;
        Ok(BasketLine {
            item: item.clone(),
            art_title: art.title.clone(),
            artist_name: record.artist_name,
            art_medium: art.medium.clone(),
            variant_medium: variant.medium,
            variant_available: variant.is_available,
        })
    }

    fn order_detail(&self, order: &Order) -> OrderDetail {
        let items = self
            .order_items
            .values()
            .filter(|i| i.order_id == order.id)
            .cloned()
            .collect();
        OrderDetail {
            order: order.clone(),
            items,
        }
    }
}

fn newest_first<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
    rows
}

#[async_trait]
impl GalleryStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_artist(&self, input: &ArtistInput) -> StoreResult<Artist> {
        let mut t = self.0.lock().await;
        if t.artists.values().any(|a| a.email == input.email) {
            return Err(StoreError::Conflict(format!("artist email {} already in use", input.email)));
        }
        let now = Utc::now();
        let artist = Artist {
            id: ArtistId(t.next_id("artists")),
            name: input.name.clone(),
            email: input.email.clone(),
            phone_number: input.phone_number.clone(),
            bio: input.bio.clone(),
            image_url: input.image_url.clone(),
            created_at: now,
            updated_at: now,
        };
        t.artists.insert(artist.id, artist.clone());
        Ok(artist)
    }

    async fn update_artist(&self, id: ArtistId, input: &ArtistInput) -> StoreResult<Artist> {
        let mut t = self.0.lock().await;
        if t.artists.values().any(|a| a.email == input.email && a.id != id) {
            return Err(StoreError::Conflict(format!("artist email {} already in use", input.email)));
        }
        let artist = t
            .artists
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("artist", id.0))?;
        artist.name = input.name.clone();
        artist.email = input.email.clone();
        artist.phone_number = input.phone_number.clone();
        artist.bio = input.bio.clone();
        artist.image_url = input.image_url.clone();
        artist.updated_at = Utc::now();
        Ok(artist.clone())
    }

    async fn artist(&self, id: ArtistId) -> StoreResult<Option<Artist>> {
        Ok(self.0.lock().await.artists.get(&id).cloned())
    }

    async fn artists(&self) -> StoreResult<Vec<Artist>> {
        let t = self.0.lock().await;
        let mut artists: Vec<Artist> = t.artists.values().cloned().collect();
        artists.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(artists)
    }

    async fn delete_artist(&self, id: ArtistId) -> StoreResult<bool> {
        let mut t = self.0.lock().await;
        let collection_ids: Vec<CollectionId> = t
            .collections
            .values()
            .filter(|c| c.artist_id == id)
            .map(|c| c.id)
            .collect();
        for collection_id in collection_ids {
            t.remove_collection_cascade(collection_id);
        }
        Ok(t.artists.remove(&id).is_some())
    }

    async fn insert_collection(&self, input: &CollectionInput) -> StoreResult<Collection> {
        let mut t = self.0.lock().await;
        if !t.artists.contains_key(&input.artist_id) {
            return Err(StoreError::not_found("artist", input.artist_id.0));
        }
        let now = Utc::now();
        let collection = Collection {
            id: CollectionId(t.next_id("collections")),
            artist_id: input.artist_id,
            name: input.name.clone(),
            description: input.description.clone(),
            cover_image_url: input.cover_image_url.clone(),
            created_at: now,
            updated_at: now,
        };
        t.collections.insert(collection.id, collection.clone());
        Ok(collection)
    }

    async fn update_collection(&self, id: CollectionId, input: &CollectionInput) -> StoreResult<Collection> {
        let mut t = self.0.lock().await;
        if !t.artists.contains_key(&input.artist_id) {
            return Err(StoreError::not_found("artist", input.artist_id.0));
        }
        let collection = t
            .collections
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("collection", id.0))?;
        collection.artist_id = input.artist_id;
        collection.name = input.name.clone();
        collection.description = input.description.clone();
        collection.cover_image_url = input.cover_image_url.clone();
        collection.updated_at = Utc::now();
        Ok(collection.clone())
    }

    async fn collection(&self, id: CollectionId) -> StoreResult<Option<Collection>> {
        Ok(self.0.lock().await.collections.get(&id).cloned())
    }

    async fn collections(&self) -> StoreResult<Vec<Collection>> {
        let t = self.0.lock().await;
        let mut collections: Vec<Collection> = t.collections.values().cloned().collect();
        collections.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(collections)
    }

    async fn delete_collection(&self, id: CollectionId) -> StoreResult<bool> {
        Ok(self.0.lock().await.remove_collection_cascade(id))
    }

    async fn insert_art(&self, input: &ArtInput) -> StoreResult<Art> {
        let mut t = self.0.lock().await;
        if !t.collections.contains_key(&input.collection_id) {
            return Err(StoreError::not_found("collection", input.collection_id.0));
        }
        let now = Utc::now();
        let art = Art {
            id: ArtId(t.next_id("art")),
            collection_id: input.collection_id,
            title: input.title.clone(),
            medium: input.medium.clone(),
            year_created: input.year_created,
            description: input.description.clone(),
            width_cm: input.width_cm,
            height_cm: input.height_cm,
            depth_cm: input.depth_cm,
            price: input.price,
            currency: input.currency_or_default(),
            is_available: false,
            is_featured: input.is_featured,
            image_url: input.image_url.clone(),
            created_at: now,
            updated_at: now,
        };
        t.art.insert(art.id, art.clone());
        Ok(art)
    }

    async fn update_art(&self, id: ArtId, input: &ArtInput) -> StoreResult<Art> {
        let mut t = self.0.lock().await;
        if !t.collections.contains_key(&input.collection_id) {
            return Err(StoreError::not_found("collection", input.collection_id.0));
        }
        let art = t.art.get_mut(&id).ok_or_else(|| StoreError::not_found("art", id.0))?;
        art.collection_id = input.collection_id;
        art.title = input.title.clone();
        art.medium = input.medium.clone();
        art.year_created = input.year_created;
        art.description = input.description.clone();
        art.width_cm = input.width_cm;
        art.height_cm = input.height_cm;
        art.depth_cm = input.depth_cm;
        art.price = input.price;
        art.currency = input.currency_or_default();
        art.is_featured = input.is_featured;
        art.image_url = input.image_url.clone();
        art.updated_at = Utc::now();
        Ok(art.clone())
    }

    async fn art(&self, id: ArtId) -> StoreResult<Option<Art>> {
        Ok(self.0.lock().await.art.get(&id).cloned())
    }

    async fn art_record(&self, id: ArtId) -> StoreResult<Option<ArtRecord>> {
        let t = self.0.lock().await;
        t.art.get(&id).map(|art| t.record(art)).transpose()
    }

    async fn art_records(&self) -> StoreResult<Vec<ArtRecord>> {
        let t = self.0.lock().await;
        let records = t
            .art
            .values()
            .map(|art| t.record(art))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(newest_first(records, |r| (r.art.created_at, r.art.id)))
    }

    async fn set_art_availability(&self, id: ArtId, is_available: bool) -> StoreResult<Art> {
        let mut t = self.0.lock().await;
        let art = t.art.get_mut(&id).ok_or_else(|| StoreError::not_found("art", id.0))?;
        art.is_available = is_available;
        art.updated_at = Utc::now();
        Ok(art.clone())
    }

    async fn set_art_featured(&self, id: ArtId, is_featured: bool) -> StoreResult<Art> {
        let mut t = self.0.lock().await;
        let art = t.art.get_mut(&id).ok_or_else(|| StoreError::not_found("art", id.0))?;
        art.is_featured = is_featured;
        art.updated_at = Utc::now();
        Ok(art.clone())
    }

    async fn delete_art(&self, id: ArtId) -> StoreResult<bool> {
        Ok(self.0.lock().await.remove_art_cascade(id))
    }

    async fn upsert_variant(
        &self,
        art_id: ArtId,
        medium: VariantMedium,
        input: &VariantInput,
    ) -> StoreResult<ArtVariant> {
        let mut t = self.0.lock().await;
        if !t.art.contains_key(&art_id) {
            return Err(StoreError::not_found("art", art_id.0));
        }
        let now = Utc::now();
        let existing = t
            .variants
            .values()
            .find(|v| v.art_id == art_id && v.medium == medium)
            .map(|v| v.id);
        let id = match existing {
            Some(id) => id,
            None => VariantId(t.next_id("art_variants")),
        };
        let variant = t.variants.entry(id).or_insert_with(|| ArtVariant {
            id,
            art_id,
            medium,
            is_available: false,
            price: None,
            currency: String::new(),
            created_at: now,
            updated_at: now,
        });
        variant.is_available = input.is_available;
        variant.price = input.price;
        variant.currency = input.currency_or_default();
        variant.updated_at = now;
        Ok(variant.clone())
    }

    async fn variant(&self, id: VariantId) -> StoreResult<Option<ArtVariant>> {
        Ok(self.0.lock().await.variants.get(&id).cloned())
    }

    async fn variants_for_art(&self, art_id: ArtId) -> StoreResult<Vec<ArtVariant>> {
        let t = self.0.lock().await;
        let mut variants: Vec<ArtVariant> = t
            .variants
            .values()
            .filter(|v| v.art_id == art_id)
            .cloned()
            .collect();
        variants.sort_by_key(|v| v.medium);
        Ok(variants)
    }

    async fn delete_variant(&self, id: VariantId) -> StoreResult<Option<ArtVariant>> {
        Ok(self.0.lock().await.remove_variant_cascade(id))
    }

    async fn insert_media(&self, input: &MediaInput) -> StoreResult<Media> {
        let mut t = self.0.lock().await;
        if let Some(art_id) = input.art_id {
            if !t.art.contains_key(&art_id) {
                return Err(StoreError::not_found("art", art_id.0));
            }
        }
        if let Some(variant_id) = input.variant_id {
            if !t.variants.contains_key(&variant_id) {
                return Err(StoreError::not_found("variant", variant_id.0));
            }
        }
        let now = Utc::now();
        let media = Media {
            id: MediaId(t.next_id("media")),
            art_id: input.art_id,
            variant_id: input.variant_id,
            file_url: input.file_url.clone(),
            kind: input.kind,
            caption: input.caption.clone(),
            is_primary: input.is_primary,
            ordering: input.ordering,
            placement: input.placement,
            slot: None,
            created_at: now,
            updated_at: now,
        };
        t.media.insert(media.id, media.clone());
        Ok(media)
    }

    async fn media(&self, id: MediaId) -> StoreResult<Option<Media>> {
        Ok(self.0.lock().await.media.get(&id).cloned())
    }

    async fn media_for_art(&self, art_id: ArtId) -> StoreResult<Vec<Media>> {
        let t = self.0.lock().await;
        let mut media: Vec<Media> = t
            .media
            .values()
            .filter(|m| m.art_id == Some(art_id))
            .cloned()
            .collect();
        crate::catalog::media::sort_for_display(&mut media);
        Ok(media)
    }

    async fn slotted_media(&self) -> StoreResult<Vec<Media>> {
        let t = self.0.lock().await;
        Ok(t.media.values().filter(|m| m.slot.is_some()).cloned().collect())
    }

    async fn assign_media_slot(&self, id: MediaId, slot: Option<HomepageSlot>) -> StoreResult<Media> {
        let mut t = self.0.lock().await;
        if !t.media.contains_key(&id) {
            return Err(StoreError::not_found("media", id.0));
        }
        let now = Utc::now();
        if let Some(slot) = slot {
            for media in t.media.values_mut() {
                if media.slot == Some(slot) && media.id != id {
                    media.slot = None;
                    media.updated_at = now;
                }
            }
        }
        let media = t.media.get_mut(&id).ok_or_else(|| StoreError::not_found("media", id.0))?;
        media.slot = slot;
        media.updated_at = now;
        Ok(media.clone())
    }

    async fn delete_media(&self, id: MediaId) -> StoreResult<bool> {
        Ok(self.0.lock().await.media.remove(&id).is_some())
    }

    async fn insert_exhibition(&self, input: &ExhibitionInput) -> StoreResult<Exhibition> {
        let mut t = self.0.lock().await;
        let now = Utc::now();
        let exhibition = Exhibition {
            id: ExhibitionId(t.next_id("exhibitions")),
            title: input.title.clone(),
            description: input.description.clone(),
            location: input.location.clone(),
            status: input.status,
            start_date: input.start_date,
            end_date: input.end_date,
            cover_image_url: input.cover_image_url.clone(),
            created_at: now,
            updated_at: now,
        };
        t.exhibitions.insert(exhibition.id, exhibition.clone());
        Ok(exhibition)
    }

    async fn update_exhibition(&self, id: ExhibitionId, input: &ExhibitionInput) -> StoreResult<Exhibition> {
        let mut t = self.0.lock().await;
        let exhibition = t
            .exhibitions
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("exhibition", id.0))?;
        exhibition.title = input.title.clone();
        exhibition.description = input.description.clone();
        exhibition.location = input.location.clone();
        exhibition.status = input.status;
        exhibition.start_date = input.start_date;
        exhibition.end_date = input.end_date;
        exhibition.cover_image_url = input.cover_image_url.clone();
        exhibition.updated_at = Utc::now();
        Ok(exhibition.clone())
    }

    async fn exhibition(&self, id: ExhibitionId) -> StoreResult<Option<Exhibition>> {
        Ok(self.0.lock().await.exhibitions.get(&id).cloned())
    }

    async fn exhibitions(&self) -> StoreResult<Vec<Exhibition>> {
        Ok(self.0.lock().await.exhibitions.values().cloned().collect())
    }

    async fn delete_exhibition(&self, id: ExhibitionId) -> StoreResult<bool> {
        let mut t = self.0.lock().await;
        t.exhibition_art.retain(|(exhibition_id, _)| *exhibition_id != id);
        Ok(t.exhibitions.remove(&id).is_some())
    }

    async fn exhibition_art_ids(&self, id: ExhibitionId) -> StoreResult<Vec<ArtId>> {
        let t = self.0.lock().await;
        Ok(t.exhibition_art
            .iter()
            .filter(|(exhibition_id, _)| *exhibition_id == id)
            .map(|(_, art_id)| *art_id)
            .collect())
    }

    async fn replace_exhibition_art(&self, id: ExhibitionId, art_ids: &[ArtId]) -> StoreResult<()> {
        let mut t = self.0.lock().await;
        if !t.exhibitions.contains_key(&id) {
            return Err(StoreError::not_found("exhibition", id.0));
        }
        if let Some(missing) = art_ids.iter().find(|a| !t.art.contains_key(a)) {
            return Err(StoreError::not_found("art", missing.0));
        }
        t.exhibition_art.retain(|(exhibition_id, _)| *exhibition_id != id);
        t.exhibition_art.extend(art_ids.iter().map(|art_id| (id, *art_id)));
        Ok(())
    }

    async fn insert_message(&self, input: &MessageInput, sender: Option<UserId>) -> StoreResult<Message> {
        let mut t = self.0.lock().await;
        let message = Message {
            id: MessageId(t.next_id("messages")),
            name: input.name.clone(),
            email: input.email.clone(),
            subject: input.subject.clone(),
            body: input.body.clone(),
            sender,
            unread: true,
            created_at: Utc::now(),
        };
        t.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn messages(&self) -> StoreResult<Vec<Message>> {
        let t = self.0.lock().await;
        let messages = t.messages.values().cloned().collect();
        Ok(newest_first(messages, |m: &Message| (m.created_at, m.id)))
    }

    async fn mark_message_read(&self, id: MessageId) -> StoreResult<Message> {
        let mut t = self.0.lock().await;
        let message = t
            .messages
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("message", id.0))?;
        message.unread = false;
        Ok(message.clone())
    }

    async fn unread_message_count(&self) -> StoreResult<i64> {
        let t = self.0.lock().await;
        Ok(t.messages.values().filter(|m| m.unread).count() as i64)
    }

    async fn basket_for_user(&self, user_id: UserId) -> StoreResult<Basket> {
        let mut t = self.0.lock().await;
        if let Some(basket) = t.baskets.values().find(|b| b.user_id == user_id) {
            return Ok(basket.clone());
        }
        let now = Utc::now();
        let basket = Basket {
            id: BasketId(t.next_id("baskets")),
            user_id,
            created_at: now,
            updated_at: now,
        };
        t.baskets.insert(basket.id, basket.clone());
        Ok(basket)
    }

    async fn basket_lines(&self, basket_id: BasketId) -> StoreResult<Vec<BasketLine>> {
        let t = self.0.lock().await;
        t.basket_items
            .values()
            .filter(|item| item.basket_id == basket_id)
            .map(|item| t.basket_line(item))
            .collect()
    }

    async fn add_basket_item(
        &self,
        basket_id: BasketId,
        item: &NewBasketItem,
        max_quantity: i32,
    ) -> StoreResult<BasketItem> {
        let mut t = self.0.lock().await;
        if !t.baskets.contains_key(&basket_id) {
            return Err(StoreError::not_found("basket", basket_id.0));
        }
        if !t.variants.contains_key(&item.variant_id) {
            return Err(StoreError::not_found("variant", item.variant_id.0));
        }
        let existing = t
            .basket_items
            .values()
            .find(|i| i.basket_id == basket_id && i.art_id == item.art_id && i.variant_id == item.variant_id)
            .map(|i| i.id);
        let stored = match existing {
            Some(id) => {
                let line = t
                    .basket_items
                    .get_mut(&id)
                    .ok_or_else(|| StoreError::not_found("basket item", id.0))?;
                line.quantity = line.quantity.saturating_add(item.quantity).min(max_quantity);
                line.clone()
            }
            None => {
                let line = BasketItem {
                    id: BasketItemId(t.next_id("basket_items")),
                    basket_id,
                    art_id: item.art_id,
                    variant_id: item.variant_id,
                    quantity: item.quantity.min(max_quantity),
                    price_at_addition: item.price,
                    currency: item.currency.clone(),
                    added_at: Utc::now(),
                };
                t.basket_items.insert(line.id, line.clone());
                line
            }
        };
        if let Some(basket) = t.baskets.get_mut(&basket_id) {
            basket.updated_at = Utc::now();
        }
        Ok(stored)
    }

    async fn basket_item(&self, id: BasketItemId) -> StoreResult<Option<BasketItem>> {
        Ok(self.0.lock().await.basket_items.get(&id).cloned())
    }

    async fn set_basket_item_quantity(&self, id: BasketItemId, quantity: i32) -> StoreResult<BasketItem> {
        let mut t = self.0.lock().await;
        let item = t
            .basket_items
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("basket item", id.0))?;
        item.quantity = quantity;
        Ok(item.clone())
    }

    async fn remove_basket_item(&self, id: BasketItemId) -> StoreResult<bool> {
        Ok(self.0.lock().await.basket_items.remove(&id).is_some())
    }

    async fn clear_basket(&self, basket_id: BasketId) -> StoreResult<u64> {
        let mut t = self.0.lock().await;
        let before = t.basket_items.len();
        t.basket_items.retain(|_, item| item.basket_id != basket_id);
        Ok((before - t.basket_items.len()) as u64)
    }

    async fn place_order(&self, new: &NewOrder) -> StoreResult<OrderDetail> {
        let mut t = self.0.lock().await;
        if let Some((changed, _)) = new
            .draft
            .source_items
            .iter()
            .find(|(id, quantity)| t.basket_items.get(id).map(|i| i.quantity) != Some(*quantity))
        {
            return Err(StoreError::Conflict(format!("basket item {changed} changed during checkout")));
        }

        let now = Utc::now();
        let order = Order {
            id: OrderId(t.next_id("orders")),
            user_id: new.user_id,
            status: OrderStatus::Pending,
            total_amount: new.draft.total_amount,
            currency: new.draft.currency.clone(),
            payment_method: new.payment_method.clone(),
            payment_reference: new.payment_reference.clone(),
            email: new.details.email.clone(),
            full_name: new.details.full_name.clone(),
            address_line1: new.details.address_line1.clone(),
            address_line2: new.details.address_line2.clone(),
            city: new.details.city.clone(),
            postal_code: new.details.postal_code.clone(),
            country: new.details.country.clone(),
            created_at: now,
            updated_at: now,
        };
        t.orders.insert(order.id, order.clone());

        let mut items = Vec::with_capacity(new.draft.items.len());
        for draft in &new.draft.items {
            let item = OrderItem {
                id: OrderItemId(t.next_id("order_items")),
                order_id: order.id,
                art_id: draft.art_id,
                artwork_title: draft.artwork_title.clone(),
                artwork_artist: draft.artwork_artist.clone(),
                artwork_medium: draft.artwork_medium.clone(),
                quantity: draft.quantity,
                price: draft.price,
                variant_id: draft.variant_id,
                variant_medium: draft.variant_medium.clone(),
            };
            t.order_items.insert(item.id, item.clone());
            items.push(item);
        }

        for (id, _) in &new.draft.source_items {
            t.basket_items.remove(id);
        }

        Ok(OrderDetail { order, items })
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<OrderDetail>> {
        let t = self.0.lock().await;
        Ok(t.orders.get(&id).map(|order| t.order_detail(order)))
    }

    async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
        let t = self.0.lock().await;
        let orders = t.orders.values().filter(|o| o.user_id == user_id).cloned().collect();
        Ok(newest_first(orders, |o: &Order| (o.created_at, o.id)))
    }

    async fn orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>> {
        let t = self.0.lock().await;
        let orders = t
            .orders
            .values()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        Ok(newest_first(orders, |o: &Order| (o.created_at, o.id)))
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> StoreResult<Order> {
        let mut t = self.0.lock().await;
        let order = t.orders.get_mut(&id).ok_or_else(|| StoreError::not_found("order", id.0))?;
        if order.status != expected {
            return Err(StoreError::Conflict(format!(
                "order {id} is {}, expected {expected}",
                order.status
            )));
        }
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}
