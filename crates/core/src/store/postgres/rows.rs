//! Row decoding and column lists shared by the Postgres queries.

use std::str::FromStr;

use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use crate::basket::{Basket, BasketItem, BasketLine};
use crate::catalog::{Art, ArtRecord, ArtVariant, Artist, Collection, Media};
use crate::exhibition::Exhibition;
use crate::ids::{
    ArtId, ArtistId, BasketId, BasketItemId, CollectionId, ExhibitionId, MediaId, MessageId,
    OrderId, OrderItemId, UserId, VariantId,
};
use crate::message::Message;
use crate::order::{Order, OrderItem};
use crate::store::StoreError;

pub(super) const ARTIST_COLUMNS: &str =
    "id, name, email, phone_number, bio, image_url, created_at, updated_at";

pub(super) const COLLECTION_COLUMNS: &str =
    "id, artist_id, name, description, cover_image_url, created_at, updated_at";

pub(super) const ART_COLUMNS: &str = "id, collection_id, title, medium, year_created, description, \
     width_cm, height_cm, depth_cm, price, currency, is_available, is_featured, image_url, \
     created_at, updated_at";

/// Art joined with its collection and artist, for [`ArtRecord`].
pub(super) const ART_RECORD_SELECT: &str = "SELECT a.id, a.collection_id, a.title, a.medium, \
     a.year_created, a.description, a.width_cm, a.height_cm, a.depth_cm, a.price, a.currency, \
     a.is_available, a.is_featured, a.image_url, a.created_at, a.updated_at, \
     ar.id AS artist_id, ar.name AS artist_name, c.name AS collection_name \
     FROM art a \
     JOIN collections c ON c.id = a.collection_id \
     JOIN artists ar ON ar.id = c.artist_id";

pub(super) const VARIANT_COLUMNS: &str =
    "id, art_id, medium, is_available, price, currency, created_at, updated_at";

pub(super) const MEDIA_COLUMNS: &str = "id, art_id, variant_id, file_url, kind, caption, \
     is_primary, ordering, placement, homepage_slot, created_at, updated_at";

pub(super) const EXHIBITION_COLUMNS: &str = "id, title, description, location, status, \
     start_date, end_date, cover_image_url, created_at, updated_at";

pub(super) const MESSAGE_COLUMNS: &str =
    "id, name, email, subject, body, sender, unread, created_at";

pub(super) const BASKET_COLUMNS: &str = "id, user_id, created_at, updated_at";

pub(super) const BASKET_ITEM_COLUMNS: &str =
    "id, basket_id, art_id, variant_id, quantity, price_at_addition, currency, added_at";

pub(super) const BASKET_LINE_SELECT: &str = "SELECT bi.id, bi.basket_id, bi.art_id, \
     bi.variant_id, bi.quantity, bi.price_at_addition, bi.currency, bi.added_at, \
     a.title AS art_title, ar.name AS artist_name, a.medium AS art_medium, \
     v.medium AS variant_medium, v.is_available AS variant_available \
     FROM basket_items bi \
     JOIN art a ON a.id = bi.art_id \
     JOIN art_variants v ON v.id = bi.variant_id \
     JOIN collections c ON c.id = a.collection_id \
     JOIN artists ar ON ar.id = c.artist_id";

pub(super) const ORDER_COLUMNS: &str = "id, user_id, status, total_amount, currency, \
     payment_method, payment_reference, email, full_name, address_line1, address_line2, city, \
     postal_code, country, created_at, updated_at";

pub(super) const ORDER_ITEM_COLUMNS: &str = "id, order_id, art_id, artwork_title, \
     artwork_artist, artwork_medium, quantity, price, variant_id, variant_medium";

/// Decode a `TEXT` column into one of the domain enums.
fn text<T>(row: &PgRow, column: &str) -> sqlx::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: e.into(),
    })
}

fn optional_text<T>(row: &PgRow, column: &str) -> sqlx::Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| {
        s.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: e.into(),
        })
    })
    .transpose()
}

/// Unique and foreign-key violations surface as conflicts; a bad enum
/// value in a column is a corrupt row.
pub(super) fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if matches!(db.code().as_deref(), Some("23505" | "23503")) => {
            StoreError::Conflict(db.message().to_string())
        }
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::Corrupt(format!("column {index}: {source}"))
        }
        _ => StoreError::Database(err),
    }
}

impl<'r> FromRow<'r, PgRow> for Artist {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: ArtistId(row.try_get("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone_number: row.try_get("phone_number")?,
            bio: row.try_get("bio")?,
            image_url: row.try_get("image_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Collection {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: CollectionId(row.try_get("id")?),
            artist_id: ArtistId(row.try_get("artist_id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            cover_image_url: row.try_get("cover_image_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Art {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: ArtId(row.try_get("id")?),
            collection_id: CollectionId(row.try_get("collection_id")?),
            title: row.try_get("title")?,
            medium: row.try_get("medium")?,
            year_created: row.try_get("year_created")?,
            description: row.try_get("description")?,
            width_cm: row.try_get("width_cm")?,
            height_cm: row.try_get("height_cm")?,
            depth_cm: row.try_get("depth_cm")?,
            price: row.try_get("price")?,
            currency: row.try_get("currency")?,
            is_available: row.try_get("is_available")?,
            is_featured: row.try_get("is_featured")?,
            image_url: row.try_get("image_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Variants are attached afterwards.
impl<'r> FromRow<'r, PgRow> for ArtRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            art: Art::from_row(row)?,
            artist_id: ArtistId(row.try_get("artist_id")?),
            artist_name: row.try_get("artist_name")?,
            collection_name: row.try_get("collection_name")?,
            variants: Vec::new(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for ArtVariant {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: VariantId(row.try_get("id")?),
            art_id: ArtId(row.try_get("art_id")?),
            medium: text(row, "medium")?,
            is_available: row.try_get("is_available")?,
            price: row.try_get("price")?,
            currency: row.try_get("currency")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Media {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: MediaId(row.try_get("id")?),
            art_id: row.try_get::<Option<i64>, _>("art_id")?.map(ArtId),
            variant_id: row.try_get::<Option<i64>, _>("variant_id")?.map(VariantId),
            file_url: row.try_get("file_url")?,
            kind: text(row, "kind")?,
            caption: row.try_get("caption")?,
            is_primary: row.try_get("is_primary")?,
            ordering: row.try_get("ordering")?,
            placement: text(row, "placement")?,
            slot: optional_text(row, "homepage_slot")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Exhibition {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: ExhibitionId(row.try_get("id")?),
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            location: row.try_get("location")?,
            status: text(row, "status")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            cover_image_url: row.try_get("cover_image_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Message {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: MessageId(row.try_get("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            subject: row.try_get("subject")?,
            body: row.try_get("body")?,
            sender: row.try_get::<Option<Uuid>, _>("sender")?.map(UserId),
            unread: row.try_get("unread")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Basket {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: BasketId(row.try_get("id")?),
            user_id: UserId(row.try_get("user_id")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for BasketItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: BasketItemId(row.try_get("id")?),
            basket_id: BasketId(row.try_get("basket_id")?),
            art_id: ArtId(row.try_get("art_id")?),
            variant_id: VariantId(row.try_get("variant_id")?),
            quantity: row.try_get("quantity")?,
            price_at_addition: row.try_get("price_at_addition")?,
            currency: row.try_get("currency")?,
            added_at: row.try_get("added_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for BasketLine {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            item: BasketItem::from_row(row)?,
            art_title: row.try_get("art_title")?,
            artist_name: row.try_get("artist_name")?,
            art_medium: row.try_get("art_medium")?,
            variant_medium: text(row, "variant_medium")?,
            variant_available: row.try_get("variant_available")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Order {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: OrderId(row.try_get("id")?),
            user_id: UserId(row.try_get("user_id")?),
            status: text(row, "status")?,
            total_amount: row.try_get("total_amount")?,
            currency: row.try_get("currency")?,
            payment_method: row.try_get("payment_method")?,
            payment_reference: row.try_get("payment_reference")?,
            email: row.try_get("email")?,
            full_name: row.try_get("full_name")?,
            address_line1: row.try_get("address_line1")?,
            address_line2: row.try_get("address_line2")?,
            city: row.try_get("city")?,
            postal_code: row.try_get("postal_code")?,
            country: row.try_get("country")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: OrderItemId(row.try_get("id")?),
            order_id: OrderId(row.try_get("order_id")?),
            art_id: row.try_get::<Option<i64>, _>("art_id")?.map(ArtId),
            artwork_title: row.try_get("artwork_title")?,
            artwork_artist: row.try_get("artwork_artist")?,
            artwork_medium: row.try_get("artwork_medium")?,
            quantity: row.try_get("quantity")?,
            price: row.try_get("price")?,
            variant_id: row.try_get::<Option<i64>, _>("variant_id")?.map(VariantId),
            variant_medium: row.try_get("variant_medium")?,
        })
    }
}
