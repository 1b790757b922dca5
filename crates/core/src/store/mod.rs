//! Persistence seam. [`MemoryStore`] backs tests and database-less runs,
//! [`PgStore`] is the PostgreSQL implementation.
//!
//! Implementations own the referential rules: deleting an artist, collection,
//! art piece or variant removes the basket items pointing at the affected
//! variants before the variants themselves go, order items and media keep
//! their rows with the art reference cleared, and order placement is atomic
//! with emptying the consumed basket lines.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

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
use crate::order::{NewOrder, Order, OrderDetail, OrderStatus};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        StoreError::NotFound { entity, id }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait GalleryStore: std::fmt::Debug + Send + Sync {
    /// Cheap connectivity check for health reporting.
    async fn ping(&self) -> StoreResult<()>;

    // Artists
    async fn insert_artist(&self, input: &ArtistInput) -> StoreResult<Artist>;
    async fn update_artist(&self, id: ArtistId, input: &ArtistInput) -> StoreResult<Artist>;
    async fn artist(&self, id: ArtistId) -> StoreResult<Option<Artist>>;
    async fn artists(&self) -> StoreResult<Vec<Artist>>;
    /// Cascades to the artist's collections and their art.
    async fn delete_artist(&self, id: ArtistId) -> StoreResult<bool>;

    // Collections
    async fn insert_collection(&self, input: &CollectionInput) -> StoreResult<Collection>;
    async fn update_collection(&self, id: CollectionId, input: &CollectionInput) -> StoreResult<Collection>;
    async fn collection(&self, id: CollectionId) -> StoreResult<Option<Collection>>;
    async fn collections(&self) -> StoreResult<Vec<Collection>>;
    /// Cascades to the collection's art.
    async fn delete_collection(&self, id: CollectionId) -> StoreResult<bool>;

    // Art
    async fn insert_art(&self, input: &ArtInput) -> StoreResult<Art>;
    async fn update_art(&self, id: ArtId, input: &ArtInput) -> StoreResult<Art>;
    async fn art(&self, id: ArtId) -> StoreResult<Option<Art>>;
    async fn art_record(&self, id: ArtId) -> StoreResult<Option<ArtRecord>>;
    /// All art with artist, collection and variants, newest first.
    async fn art_records(&self) -> StoreResult<Vec<ArtRecord>>;
    async fn set_art_availability(&self, id: ArtId, is_available: bool) -> StoreResult<Art>;
    async fn set_art_featured(&self, id: ArtId, is_featured: bool) -> StoreResult<Art>;
    /// Removes basket items for the art's variants, then the art and variants.
    async fn delete_art(&self, id: ArtId) -> StoreResult<bool>;

    // Variants
    /// Insert or update the variant keyed by `(art, medium)`.
    async fn upsert_variant(
        &self,
        art_id: ArtId,
        medium: VariantMedium,
        input: &VariantInput,
    ) -> StoreResult<ArtVariant>;
    async fn variant(&self, id: VariantId) -> StoreResult<Option<ArtVariant>>;
    async fn variants_for_art(&self, art_id: ArtId) -> StoreResult<Vec<ArtVariant>>;
    /// Removes referencing basket items first. Returns the deleted variant.
    async fn delete_variant(&self, id: VariantId) -> StoreResult<Option<ArtVariant>>;

    // Media
    async fn insert_media(&self, input: &MediaInput) -> StoreResult<Media>;
    async fn media(&self, id: MediaId) -> StoreResult<Option<Media>>;
    async fn media_for_art(&self, art_id: ArtId) -> StoreResult<Vec<Media>>;
    /// Media currently holding a homepage slot.
    async fn slotted_media(&self) -> StoreResult<Vec<Media>>;
    /// Give `id` the slot, taking it from any previous holder; `None` clears.
    async fn assign_media_slot(&self, id: MediaId, slot: Option<HomepageSlot>) -> StoreResult<Media>;
    async fn delete_media(&self, id: MediaId) -> StoreResult<bool>;

    // Exhibitions
    async fn insert_exhibition(&self, input: &ExhibitionInput) -> StoreResult<Exhibition>;
    async fn update_exhibition(&self, id: ExhibitionId, input: &ExhibitionInput) -> StoreResult<Exhibition>;
    async fn exhibition(&self, id: ExhibitionId) -> StoreResult<Option<Exhibition>>;
    async fn exhibitions(&self) -> StoreResult<Vec<Exhibition>>;
    async fn delete_exhibition(&self, id: ExhibitionId) -> StoreResult<bool>;
    async fn exhibition_art_ids(&self, id: ExhibitionId) -> StoreResult<Vec<ArtId>>;
    /// Make `art_ids` the exact set of art linked to the exhibition.
    async fn replace_exhibition_art(&self, id: ExhibitionId, art_ids: &[ArtId]) -> StoreResult<()>;

    // Messages
    async fn insert_message(&self, input: &MessageInput, sender: Option<UserId>) -> StoreResult<Message>;
    /// Newest first.
    async fn messages(&self) -> StoreResult<Vec<Message>>;
    async fn mark_message_read(&self, id: MessageId) -> StoreResult<Message>;
    async fn unread_message_count(&self) -> StoreResult<i64>;

    // Baskets
    /// The user's basket, created on first use.
    async fn basket_for_user(&self, user_id: UserId) -> StoreResult<Basket>;
    async fn basket_lines(&self, basket_id: BasketId) -> StoreResult<Vec<BasketLine>>;
    /// Insert a line or, when `(basket, art, variant)` exists, add to its
    /// quantity (capped at `max_quantity`) keeping the original snapshot.
    async fn add_basket_item(
        &self,
        basket_id: BasketId,
        item: &NewBasketItem,
        max_quantity: i32,
    ) -> StoreResult<BasketItem>;
    async fn basket_item(&self, id: BasketItemId) -> StoreResult<Option<BasketItem>>;
    async fn set_basket_item_quantity(&self, id: BasketItemId, quantity: i32) -> StoreResult<BasketItem>;
    async fn remove_basket_item(&self, id: BasketItemId) -> StoreResult<bool>;
    async fn clear_basket(&self, basket_id: BasketId) -> StoreResult<u64>;

    // Orders (never deleted)
    /// Insert the order and its items and remove the consumed basket lines in
    /// one unit. Fails with a conflict, changing nothing, if any consumed line
    /// has already gone.
    async fn place_order(&self, order: &NewOrder) -> StoreResult<OrderDetail>;
    async fn order(&self, id: OrderId) -> StoreResult<Option<OrderDetail>>;
    async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>>;
    async fn orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>>;
    /// Compare-and-set: fails with a conflict unless the order is still in
    /// `expected`.
    async fn set_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> StoreResult<Order>;
}
