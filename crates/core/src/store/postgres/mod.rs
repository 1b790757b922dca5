//! PostgreSQL store. Queries are built at runtime and decoded through the
//! `FromRow` impls in [`rows`]; multi-statement operations run in a single
//! transaction.

mod rows;

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{query, query_as, query_scalar, Postgres};

use self::rows::*;
use super::{GalleryStore, StoreError, StoreResult};
use crate::basket::{Basket, BasketItem, BasketLine, NewBasketItem};
use crate::catalog::{
    Art, ArtInput, ArtRecord, ArtVariant, Artist, ArtistInput, Collection, CollectionInput,
    HomepageSlot, Media, MediaInput, VariantInput, VariantMedium,
};
use crate::exhibition::{Exhibition, ExhibitionInput};
use crate::ids::{
    ArtId, ArtistId, BasketId, BasketItemId, CollectionId, ExhibitionId, MediaId, MessageId,
    OrderId, UserId, VariantId,
};
use crate::message::{Message, MessageInput};
use crate::order::{NewOrder, Order, OrderDetail, OrderItem, OrderStatus};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32, min_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn attach_variants(&self, mut records: Vec<ArtRecord>) -> StoreResult<Vec<ArtRecord>> {
        if records.is_empty() {
            return Ok(records);
        }
        let ids: Vec<i64> = records.iter().map(|r| r.art.id.0).collect();
        let sql = format!(
            "SELECT {VARIANT_COLUMNS} FROM art_variants WHERE art_id = ANY($1) ORDER BY art_id, id"
        );
        let variants = query_as::<Postgres, ArtVariant>(&sql)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        let mut by_art: HashMap<ArtId, Vec<ArtVariant>> = HashMap::new();
        for variant in variants {
            by_art.entry(variant.art_id).or_default().push(variant);
        }
        for record in &mut records {
            let mut variants = by_art.remove(&record.art.id).unwrap_or_default();
            variants.sort_by_key(|v| v.medium);
            record.variants = variants;
        }
        Ok(records)
    }

    async fn order_items(&self, order_id: OrderId) -> StoreResult<Vec<OrderItem>> {
        let sql = format!("SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        query_as::<Postgres, OrderItem>(&sql)
            .bind(order_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)
    }
}

#[async_trait]
impl GalleryStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // -- Artists ------------------------------------------------------------

    async fn insert_artist(&self, input: &ArtistInput) -> StoreResult<Artist> {
        let sql = format!(
            "INSERT INTO artists (name, email, phone_number, bio, image_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ARTIST_COLUMNS}"
        );
        query_as::<Postgres, Artist>(&sql)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone_number)
            .bind(&input.bio)
            .bind(&input.image_url)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn update_artist(&self, id: ArtistId, input: &ArtistInput) -> StoreResult<Artist> {
        let sql = format!(
            "UPDATE artists SET name = $2, email = $3, phone_number = $4, bio = $5, \
             image_url = $6, updated_at = now() WHERE id = $1 RETURNING {ARTIST_COLUMNS}"
        );
        query_as::<Postgres, Artist>(&sql)
            .bind(id.0)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone_number)
            .bind(&input.bio)
            .bind(&input.image_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::not_found("artist", id.0))
    }

    async fn artist(&self, id: ArtistId) -> StoreResult<Option<Artist>> {
        let sql = format!("SELECT {ARTIST_COLUMNS} FROM artists WHERE id = $1");
        query_as::<Postgres, Artist>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn artists(&self) -> StoreResult<Vec<Artist>> {
        let sql = format!("SELECT {ARTIST_COLUMNS} FROM artists ORDER BY name, id");
        query_as::<Postgres, Artist>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn delete_artist(&self, id: ArtistId) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        query(
            "DELETE FROM basket_items WHERE art_id IN ( \
                SELECT a.id FROM art a JOIN collections c ON c.id = a.collection_id \
                WHERE c.artist_id = $1)",
        )
        .bind(id.0)
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;
        let deleted = query("DELETE FROM artists WHERE id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    // -- Collections --------------------------------------------------------

    async fn insert_collection(&self, input: &CollectionInput) -> StoreResult<Collection> {
        let sql = format!(
            "INSERT INTO collections (artist_id, name, description, cover_image_url) \
             VALUES ($1, $2, $3, $4) RETURNING {COLLECTION_COLUMNS}"
        );
        query_as::<Postgres, Collection>(&sql)
            .bind(input.artist_id.0)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.cover_image_url)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn update_collection(&self, id: CollectionId, input: &CollectionInput) -> StoreResult<Collection> {
        let sql = format!(
            "UPDATE collections SET artist_id = $2, name = $3, description = $4, \
             cover_image_url = $5, updated_at = now() WHERE id = $1 RETURNING {COLLECTION_COLUMNS}"
        );
        query_as::<Postgres, Collection>(&sql)
            .bind(id.0)
            .bind(input.artist_id.0)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.cover_image_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::not_found("collection", id.0))
    }

    async fn collection(&self, id: CollectionId) -> StoreResult<Option<Collection>> {
        let sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = $1");
        query_as::<Postgres, Collection>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn collections(&self) -> StoreResult<Vec<Collection>> {
        let sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections ORDER BY name, id");
        query_as::<Postgres, Collection>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn delete_collection(&self, id: CollectionId) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        query("DELETE FROM basket_items WHERE art_id IN (SELECT id FROM art WHERE collection_id = $1)")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        let deleted = query("DELETE FROM collections WHERE id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    // -- Art ----------------------------------------------------------------

    async fn insert_art(&self, input: &ArtInput) -> StoreResult<Art> {
        let sql = format!(
            "INSERT INTO art (collection_id, title, medium, year_created, description, width_cm, \
             height_cm, depth_cm, price, currency, is_featured, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {ART_COLUMNS}"
        );
        query_as::<Postgres, Art>(&sql)
            .bind(input.collection_id.0)
            .bind(&input.title)
            .bind(&input.medium)
            .bind(input.year_created)
            .bind(&input.description)
            .bind(input.width_cm)
            .bind(input.height_cm)
            .bind(input.depth_cm)
            .bind(input.price)
            .bind(input.currency_or_default())
            .bind(input.is_featured)
            .bind(&input.image_url)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn update_art(&self, id: ArtId, input: &ArtInput) -> StoreResult<Art> {
        let sql = format!(
            "UPDATE art SET collection_id = $2, title = $3, medium = $4, year_created = $5, \
             description = $6, width_cm = $7, height_cm = $8, depth_cm = $9, price = $10, \
             currency = $11, is_featured = $12, image_url = $13, updated_at = now() \
             WHERE id = $1 RETURNING {ART_COLUMNS}"
        );
        query_as::<Postgres, Art>(&sql)
            .bind(id.0)
            .bind(input.collection_id.0)
            .bind(&input.title)
            .bind(&input.medium)
            .bind(input.year_created)
            .bind(&input.description)
            .bind(input.width_cm)
            .bind(input.height_cm)
            .bind(input.depth_cm)
            .bind(input.price)
            .bind(input.currency_or_default())
            .bind(input.is_featured)
            .bind(&input.image_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::not_found("art", id.0))
    }

    async fn art(&self, id: ArtId) -> StoreResult<Option<Art>> {
        let sql = format!("SELECT {ART_COLUMNS} FROM art WHERE id = $1");
        query_as::<Postgres, Art>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn art_record(&self, id: ArtId) -> StoreResult<Option<ArtRecord>> {
        let sql = format!("{ART_RECORD_SELECT} WHERE a.id = $1");
        let record = query_as::<Postgres, ArtRecord>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        match record {
            Some(record) => Ok(self.attach_variants(vec![record]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn art_records(&self) -> StoreResult<Vec<ArtRecord>> {
        let sql = format!("{ART_RECORD_SELECT} ORDER BY a.created_at DESC, a.id DESC");
        let records = query_as::<Postgres, ArtRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        self.attach_variants(records).await
    }

    async fn set_art_availability(&self, id: ArtId, is_available: bool) -> StoreResult<Art> {
        let sql = format!(
            "UPDATE art SET is_available = $2, updated_at = now() WHERE id = $1 RETURNING {ART_COLUMNS}"
        );
        query_as::<Postgres, Art>(&sql)
            .bind(id.0)
            .bind(is_available)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::not_found("art", id.0))
    }

    async fn set_art_featured(&self, id: ArtId, is_featured: bool) -> StoreResult<Art> {
        let sql = format!(
            "UPDATE art SET is_featured = $2, updated_at = now() WHERE id = $1 RETURNING {ART_COLUMNS}"
        );
        query_as::<Postgres, Art>(&sql)
            .bind(id.0)
            .bind(is_featured)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::not_found("art", id.0))
    }

    async fn delete_art(&self, id: ArtId) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        query("DELETE FROM basket_items WHERE art_id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        let deleted = query("DELETE FROM art WHERE id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    // -- Variants -----------------------------------------------------------

    async fn upsert_variant(
        &self,
        art_id: ArtId,
        medium: VariantMedium,
        input: &VariantInput,
    ) -> StoreResult<ArtVariant> {
        let sql = format!(
            "INSERT INTO art_variants (art_id, medium, is_available, price, currency) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (art_id, medium) DO UPDATE SET is_available = EXCLUDED.is_available, \
             price = EXCLUDED.price, currency = EXCLUDED.currency, updated_at = now() \
             RETURNING {VARIANT_COLUMNS}"
        );
        query_as::<Postgres, ArtVariant>(&sql)
            .bind(art_id.0)
            .bind(medium.as_str())
            .bind(input.is_available)
            .bind(input.price)
            .bind(input.currency_or_default())
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn variant(&self, id: VariantId) -> StoreResult<Option<ArtVariant>> {
        let sql = format!("SELECT {VARIANT_COLUMNS} FROM art_variants WHERE id = $1");
        query_as::<Postgres, ArtVariant>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn variants_for_art(&self, art_id: ArtId) -> StoreResult<Vec<ArtVariant>> {
        let sql = format!("SELECT {VARIANT_COLUMNS} FROM art_variants WHERE art_id = $1");
        let mut variants = query_as::<Postgres, ArtVariant>(&sql)
            .bind(art_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        variants.sort_by_key(|v| v.medium);
        Ok(variants)
    }

    async fn delete_variant(&self, id: VariantId) -> StoreResult<Option<ArtVariant>> {
        let mut tx = self.pool.begin().await?;
        query("DELETE FROM basket_items WHERE variant_id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        let sql = format!("DELETE FROM art_variants WHERE id = $1 RETURNING {VARIANT_COLUMNS}");
        let deleted = query_as::<Postgres, ArtVariant>(&sql)
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_error)?;
        tx.commit().await?;
        Ok(deleted)
    }

    // -- Media --------------------------------------------------------------

    async fn insert_media(&self, input: &MediaInput) -> StoreResult<Media> {
        let sql = format!(
            "INSERT INTO media (art_id, variant_id, file_url, kind, caption, is_primary, ordering, \
             placement) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {MEDIA_COLUMNS}"
        );
        query_as::<Postgres, Media>(&sql)
            .bind(input.art_id.map(ArtId::get))
            .bind(input.variant_id.map(VariantId::get))
            .bind(&input.file_url)
            .bind(input.kind.as_str())
            .bind(&input.caption)
            .bind(input.is_primary)
            .bind(input.ordering)
            .bind(input.placement.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn media(&self, id: MediaId) -> StoreResult<Option<Media>> {
        let sql = format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = $1");
        query_as::<Postgres, Media>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn media_for_art(&self, art_id: ArtId) -> StoreResult<Vec<Media>> {
        let sql = format!(
            "SELECT {MEDIA_COLUMNS} FROM media WHERE art_id = $1 \
             ORDER BY ordering, created_at DESC, id DESC"
        );
        query_as::<Postgres, Media>(&sql)
            .bind(art_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn slotted_media(&self) -> StoreResult<Vec<Media>> {
        let sql = format!("SELECT {MEDIA_COLUMNS} FROM media WHERE homepage_slot IS NOT NULL");
        query_as::<Postgres, Media>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn assign_media_slot(&self, id: MediaId, slot: Option<HomepageSlot>) -> StoreResult<Media> {
        let mut tx = self.pool.begin().await?;
        if let Some(slot) = slot {
            query(
                "UPDATE media SET homepage_slot = NULL, updated_at = now() \
                 WHERE homepage_slot = $1 AND id <> $2",
            )
            .bind(slot.as_str())
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        }
        let sql = format!(
            "UPDATE media SET homepage_slot = $2, updated_at = now() WHERE id = $1 RETURNING {MEDIA_COLUMNS}"
        );
        let media = query_as::<Postgres, Media>(&sql)
            .bind(id.0)
            .bind(slot.map(HomepageSlot::as_str))
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::not_found("media", id.0))?;
        tx.commit().await?;
        Ok(media)
    }

    async fn delete_media(&self, id: MediaId) -> StoreResult<bool> {
        let deleted = query("DELETE FROM media WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    // -- Exhibitions --------------------------------------------------------

    async fn insert_exhibition(&self, input: &ExhibitionInput) -> StoreResult<Exhibition> {
        let sql = format!(
            "INSERT INTO exhibitions (title, description, location, status, start_date, end_date, \
             cover_image_url) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {EXHIBITION_COLUMNS}"
        );
        query_as::<Postgres, Exhibition>(&sql)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.status.as_str())
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(&input.cover_image_url)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn update_exhibition(&self, id: ExhibitionId, input: &ExhibitionInput) -> StoreResult<Exhibition> {
        let sql = format!(
            "UPDATE exhibitions SET title = $2, description = $3, location = $4, status = $5, \
             start_date = $6, end_date = $7, cover_image_url = $8, updated_at = now() \
             WHERE id = $1 RETURNING {EXHIBITION_COLUMNS}"
        );
        query_as::<Postgres, Exhibition>(&sql)
            .bind(id.0)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.status.as_str())
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(&input.cover_image_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::not_found("exhibition", id.0))
    }

    async fn exhibition(&self, id: ExhibitionId) -> StoreResult<Option<Exhibition>> {
        let sql = format!("SELECT {EXHIBITION_COLUMNS} FROM exhibitions WHERE id = $1");
        query_as::<Postgres, Exhibition>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn exhibitions(&self) -> StoreResult<Vec<Exhibition>> {
        let sql = format!("SELECT {EXHIBITION_COLUMNS} FROM exhibitions ORDER BY id");
        query_as::<Postgres, Exhibition>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn delete_exhibition(&self, id: ExhibitionId) -> StoreResult<bool> {
        let deleted = query("DELETE FROM exhibitions WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn exhibition_art_ids(&self, id: ExhibitionId) -> StoreResult<Vec<ArtId>> {
        let ids: Vec<i64> =
            query_scalar("SELECT art_id FROM exhibition_art WHERE exhibition_id = $1 ORDER BY art_id")
                .bind(id.0)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().map(ArtId).collect())
    }

    async fn replace_exhibition_art(&self, id: ExhibitionId, art_ids: &[ArtId]) -> StoreResult<()> {
        let ids: Vec<i64> = art_ids.iter().map(|a| a.0).collect();
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = query_scalar("SELECT id FROM exhibitions WHERE id = $1 FOR UPDATE")
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::not_found("exhibition", id.0));
        }

        let found: Vec<i64> = query_scalar("SELECT id FROM art WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *tx)
            .await?;
        if let Some(missing) = ids.iter().find(|i| !found.contains(*i)) {
            return Err(StoreError::not_found("art", *missing));
        }

        query("DELETE FROM exhibition_art WHERE exhibition_id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        query(
            "INSERT INTO exhibition_art (exhibition_id, art_id) \
             SELECT $1, art_id FROM UNNEST($2::BIGINT[]) AS t(art_id) ON CONFLICT DO NOTHING",
        )
        .bind(id.0)
        .bind(&ids)
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await?;
        Ok(())
    }

    // -- Messages -----------------------------------------------------------

    async fn insert_message(&self, input: &MessageInput, sender: Option<UserId>) -> StoreResult<Message> {
        let sql = format!(
            "INSERT INTO messages (name, email, subject, body, sender) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {MESSAGE_COLUMNS}"
        );
        query_as::<Postgres, Message>(&sql)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.subject)
            .bind(&input.body)
            .bind(sender.map(|s| s.0))
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn messages(&self) -> StoreResult<Vec<Message>> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY created_at DESC, id DESC");
        query_as::<Postgres, Message>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn mark_message_read(&self, id: MessageId) -> StoreResult<Message> {
        let sql = format!("UPDATE messages SET unread = FALSE WHERE id = $1 RETURNING {MESSAGE_COLUMNS}");
        query_as::<Postgres, Message>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::not_found("message", id.0))
    }

    async fn unread_message_count(&self) -> StoreResult<i64> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM messages WHERE unread")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // -- Baskets ------------------------------------------------------------

    async fn basket_for_user(&self, user_id: UserId) -> StoreResult<Basket> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let sql = format!(
            "INSERT INTO baskets (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {BASKET_COLUMNS}"
        );
        query_as::<Postgres, Basket>(&sql)
            .bind(user_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn basket_lines(&self, basket_id: BasketId) -> StoreResult<Vec<BasketLine>> {
        let sql = format!("{BASKET_LINE_SELECT} WHERE bi.basket_id = $1 ORDER BY bi.id");
        query_as::<Postgres, BasketLine>(&sql)
            .bind(basket_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn add_basket_item(
        &self,
        basket_id: BasketId,
        item: &NewBasketItem,
        max_quantity: i32,
    ) -> StoreResult<BasketItem> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "INSERT INTO basket_items (basket_id, art_id, variant_id, quantity, price_at_addition, currency) \
             VALUES ($1, $2, $3, LEAST($4, $6), $5, $7) \
             ON CONFLICT (basket_id, art_id, variant_id) \
             DO UPDATE SET quantity = LEAST(basket_items.quantity + EXCLUDED.quantity, $6) \
             RETURNING {BASKET_ITEM_COLUMNS}"
        );
        let stored = query_as::<Postgres, BasketItem>(&sql)
            .bind(basket_id.0)
            .bind(item.art_id.0)
            .bind(item.variant_id.0)
            .bind(item.quantity)
            .bind(item.price)
            .bind(max_quantity)
            .bind(&item.currency)
            .fetch_one(&mut *tx)
            .await
            .map_err(store_error)?;
        query("UPDATE baskets SET updated_at = now() WHERE id = $1")
            .bind(basket_id.0)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn basket_item(&self, id: BasketItemId) -> StoreResult<Option<BasketItem>> {
        let sql = format!("SELECT {BASKET_ITEM_COLUMNS} FROM basket_items WHERE id = $1");
        query_as::<Postgres, BasketItem>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn set_basket_item_quantity(&self, id: BasketItemId, quantity: i32) -> StoreResult<BasketItem> {
        let sql = format!(
            "UPDATE basket_items SET quantity = $2 WHERE id = $1 RETURNING {BASKET_ITEM_COLUMNS}"
        );
        query_as::<Postgres, BasketItem>(&sql)
            .bind(id.0)
            .bind(quantity)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::not_found("basket item", id.0))
    }

    async fn remove_basket_item(&self, id: BasketItemId) -> StoreResult<bool> {
        let deleted = query("DELETE FROM basket_items WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn clear_basket(&self, basket_id: BasketId) -> StoreResult<u64> {
        let deleted = query("DELETE FROM basket_items WHERE basket_id = $1")
            .bind(basket_id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }

    // -- Orders -------------------------------------------------------------

    async fn place_order(&self, new: &NewOrder) -> StoreResult<OrderDetail> {
        let (ids, quantities): (Vec<i64>, Vec<i32>) = new
            .draft
            .source_items
            .iter()
            .map(|(id, quantity)| (id.0, *quantity))
            .unzip();
        let mut tx = self.pool.begin().await?;

        // Deleting first locks the lines. Only lines still holding the drafted
        // quantity match, so a short count means a concurrent checkout or
        // quantity edit got there first. Dropping `tx` rolls back.
        let consumed = query(
            "DELETE FROM basket_items WHERE (id, quantity) IN \
             (SELECT * FROM UNNEST($1::BIGINT[], $2::INT[]))",
        )
        .bind(&ids)
        .bind(&quantities)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if consumed != ids.len() as u64 {
            return Err(StoreError::Conflict("basket changed during checkout".into()));
        }

        let sql = format!(
            "INSERT INTO orders (user_id, status, total_amount, currency, payment_method, \
             payment_reference, email, full_name, address_line1, address_line2, city, \
             postal_code, country) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {ORDER_COLUMNS}"
        );
        let order = query_as::<Postgres, Order>(&sql)
            .bind(new.user_id.0)
            .bind(OrderStatus::Pending.as_str())
            .bind(new.draft.total_amount)
            .bind(&new.draft.currency)
            .bind(&new.payment_method)
            .bind(&new.payment_reference)
            .bind(&new.details.email)
            .bind(&new.details.full_name)
            .bind(&new.details.address_line1)
            .bind(&new.details.address_line2)
            .bind(&new.details.city)
            .bind(&new.details.postal_code)
            .bind(&new.details.country)
            .fetch_one(&mut *tx)
            .await
            .map_err(store_error)?;

        let sql = format!(
            "INSERT INTO order_items (order_id, art_id, artwork_title, artwork_artist, \
             artwork_medium, quantity, price, variant_id, variant_medium) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {ORDER_ITEM_COLUMNS}"
        );
        let mut items = Vec::with_capacity(new.draft.items.len());
        for item in &new.draft.items {
            let stored = query_as::<Postgres, OrderItem>(&sql)
                .bind(order.id.0)
                .bind(item.art_id.map(ArtId::get))
                .bind(&item.artwork_title)
                .bind(&item.artwork_artist)
                .bind(&item.artwork_medium)
                .bind(item.quantity)
                .bind(item.price)
                .bind(item.variant_id.map(VariantId::get))
                .bind(&item.variant_medium)
                .fetch_one(&mut *tx)
                .await
                .map_err(store_error)?;
            items.push(stored);
        }

        tx.commit().await?;
        Ok(OrderDetail { order, items })
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<OrderDetail>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let order = query_as::<Postgres, Order>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        match order {
            Some(order) => {
                let items = self.order_items(order.id).await?;
                Ok(Some(OrderDetail { order, items }))
            }
            None => Ok(None),
        }
    }

    async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        query_as::<Postgres, Order>(&sql)
            .bind(user_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE ($1::TEXT IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC"
        );
        query_as::<Postgres, Order>(&sql)
            .bind(status.map(OrderStatus::as_str))
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> StoreResult<Order> {
        let sql = format!(
            "UPDATE orders SET status = $3, updated_at = now() \
             WHERE id = $1 AND status = $2 RETURNING {ORDER_COLUMNS}"
        );
        let updated = query_as::<Postgres, Order>(&sql)
            .bind(id.0)
            .bind(expected.as_str())
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        if let Some(order) = updated {
            return Ok(order);
        }

        let current: Option<String> = query_scalar("SELECT status FROM orders WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        match current {
            Some(current) => Err(StoreError::Conflict(format!(
                "order {id} is {current}, expected {expected}"
            ))),
            None => Err(StoreError::not_found("order", id.0)),
        }
    }
}
