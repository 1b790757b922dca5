//! Gallery management. Every handler takes [`OwnerUser`], so a missing token
//! answers 401 and a non-owner token 403.

use atelier_core::catalog::{
    Art, ArtInput, ArtVariant, Artist, ArtistInput, Collection, CollectionInput, HomepageSlot,
    Media, MediaInput, VariantInput, VariantMedium,
};
use atelier_core::exhibition::{
    Exhibition, ExhibitionArtSelection, ExhibitionDetail, ExhibitionInput, ExhibitionSchedule,
};
use atelier_core::ids::{ArtId, ArtistId, CollectionId, ExhibitionId, MediaId, MessageId, OrderId, VariantId};
use atelier_core::message::Message;
use atelier_core::order::{Order, OrderFilter, StatusUpdate};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::OwnerUser;
use crate::error::ApiResult;
use crate::extract::{Path, Query};
use crate::state::AppState;

type Body<T> = Result<Json<T>, JsonRejection>;

#[derive(Debug, Deserialize)]
struct FeaturedToggle {
    is_featured: bool,
}

#[derive(Debug, Deserialize)]
struct SlotAssignment {
    slot: Option<HomepageSlot>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/owner/artists", post(create_artist))
        .route("/v1/owner/artists/{id}", put(update_artist).delete(delete_artist))
        .route("/v1/owner/collections", post(create_collection))
        .route(
            "/v1/owner/collections/{id}",
            put(update_collection).delete(delete_collection),
        )
        .route("/v1/owner/art", post(create_art))
        .route("/v1/owner/art/{id}", put(update_art).delete(delete_art))
        .route("/v1/owner/art/{id}/featured", put(set_featured))
        .route("/v1/owner/art/{id}/variants", get(list_variants))
        .route("/v1/owner/art/{id}/variants/{medium}", put(save_variant))
        .route("/v1/owner/art/{id}/media", get(art_media))
        .route("/v1/owner/variants/{id}", axum::routing::delete(delete_variant))
        .route("/v1/owner/media", post(create_media))
        .route("/v1/owner/media/{id}", get(get_media).delete(delete_media))
        .route("/v1/owner/media/{id}/slot", put(assign_slot))
        .route("/v1/owner/exhibitions", get(list_exhibitions).post(create_exhibition))
        .route(
            "/v1/owner/exhibitions/{id}",
            get(get_exhibition)
                .put(update_exhibition)
                .delete(delete_exhibition),
        )
        .route("/v1/owner/exhibitions/{id}/art", put(assign_exhibition_art))
        .route("/v1/owner/orders", get(list_orders))
        .route("/v1/owner/orders/{id}/status", put(set_order_status))
        .route("/v1/owner/messages", get(list_messages))
        .route("/v1/owner/messages/unread-count", get(unread_count))
        .route("/v1/owner/messages/{id}/read", put(mark_read))
}

// Artists

async fn create_artist(
    State(state): State<AppState>,
    _: OwnerUser,
    body: Body<ArtistInput>,
) -> ApiResult<(StatusCode, Json<Artist>)> {
    let Json(input) = body?;
    Ok((StatusCode::CREATED, Json(state.gallery().create_artist(input).await?)))
}

async fn update_artist(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<ArtistId>,
    body: Body<ArtistInput>,
) -> ApiResult<Json<Artist>> {
    let Json(input) = body?;
    Ok(Json(state.gallery().update_artist(id, input).await?))
}

async fn delete_artist(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<ArtistId>,
) -> ApiResult<StatusCode> {
    state.gallery().delete_artist(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Collections

async fn create_collection(
    State(state): State<AppState>,
    _: OwnerUser,
    body: Body<CollectionInput>,
) -> ApiResult<(StatusCode, Json<Collection>)> {
    let Json(input) = body?;
    Ok((StatusCode::CREATED, Json(state.gallery().create_collection(input).await?)))
}

async fn update_collection(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<CollectionId>,
    body: Body<CollectionInput>,
) -> ApiResult<Json<Collection>> {
    let Json(input) = body?;
    Ok(Json(state.gallery().update_collection(id, input).await?))
}

async fn delete_collection(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<CollectionId>,
) -> ApiResult<StatusCode> {
    state.gallery().delete_collection(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Art

async fn create_art(
    State(state): State<AppState>,
    _: OwnerUser,
    body: Body<ArtInput>,
) -> ApiResult<(StatusCode, Json<Art>)> {
    let Json(mut input) = body?;
    input
        .currency
        .get_or_insert_with(|| state.config().default_currency.clone());
    Ok((StatusCode::CREATED, Json(state.gallery().create_art(input).await?)))
}

async fn update_art(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<ArtId>,
    body: Body<ArtInput>,
) -> ApiResult<Json<Art>> {
    let Json(mut input) = body?;
    input
        .currency
        .get_or_insert_with(|| state.config().default_currency.clone());
    Ok(Json(state.gallery().update_art(id, input).await?))
}

async fn delete_art(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<ArtId>,
) -> ApiResult<StatusCode> {
    state.gallery().delete_art(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_featured(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<ArtId>,
    body: Body<FeaturedToggle>,
) -> ApiResult<Json<Art>> {
    let Json(toggle) = body?;
    Ok(Json(state.gallery().set_featured(id, toggle.is_featured).await?))
}

// Variants

async fn list_variants(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<ArtId>,
) -> ApiResult<Json<Vec<ArtVariant>>> {
    Ok(Json(state.gallery().variants(id).await?))
}

async fn save_variant(
    State(state): State<AppState>,
    _: OwnerUser,
    Path((id, medium)): Path<(ArtId, VariantMedium)>,
    body: Body<VariantInput>,
) -> ApiResult<Json<ArtVariant>> {
    let Json(mut input) = body?;
    input
        .currency
        .get_or_insert_with(|| state.config().default_currency.clone());
    Ok(Json(state.gallery().save_variant(id, medium, input).await?))
}

async fn delete_variant(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<VariantId>,
) -> ApiResult<StatusCode> {
    state.gallery().delete_variant(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Media

async fn create_media(
    State(state): State<AppState>,
    _: OwnerUser,
    body: Body<MediaInput>,
) -> ApiResult<(StatusCode, Json<Media>)> {
    let Json(input) = body?;
    Ok((StatusCode::CREATED, Json(state.gallery().create_media(input).await?)))
}

async fn get_media(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<MediaId>,
) -> ApiResult<Json<Media>> {
    Ok(Json(state.gallery().media(id).await?))
}

async fn art_media(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<ArtId>,
) -> ApiResult<Json<Vec<Media>>> {
    Ok(Json(state.gallery().media_for_art(id).await?))
}

async fn assign_slot(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<MediaId>,
    body: Body<SlotAssignment>,
) -> ApiResult<Json<Media>> {
    let Json(assignment) = body?;
    Ok(Json(state.gallery().assign_slot(id, assignment.slot).await?))
}

async fn delete_media(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<MediaId>,
) -> ApiResult<StatusCode> {
    state.gallery().delete_media(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Exhibitions

async fn list_exhibitions(
    State(state): State<AppState>,
    _: OwnerUser,
) -> ApiResult<Json<ExhibitionSchedule>> {
    let today = Utc::now().date_naive();
    Ok(Json(state.gallery().exhibitions(today, true).await?))
}

async fn create_exhibition(
    State(state): State<AppState>,
    _: OwnerUser,
    body: Body<ExhibitionInput>,
) -> ApiResult<(StatusCode, Json<Exhibition>)> {
    let Json(input) = body?;
    Ok((StatusCode::CREATED, Json(state.gallery().create_exhibition(input).await?)))
}

async fn get_exhibition(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<ExhibitionId>,
) -> ApiResult<Json<ExhibitionDetail>> {
    Ok(Json(state.gallery().exhibition(id, true).await?))
}

async fn update_exhibition(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<ExhibitionId>,
    body: Body<ExhibitionInput>,
) -> ApiResult<Json<Exhibition>> {
    let Json(input) = body?;
    Ok(Json(state.gallery().update_exhibition(id, input).await?))
}

async fn delete_exhibition(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<ExhibitionId>,
) -> ApiResult<StatusCode> {
    state.gallery().delete_exhibition(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn assign_exhibition_art(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<ExhibitionId>,
    body: Body<ExhibitionArtSelection>,
) -> ApiResult<Json<ExhibitionDetail>> {
    let Json(selection) = body?;
    Ok(Json(state.gallery().assign_exhibition_art(id, selection).await?))
}

// Orders

/// `?status=pending` narrows the listing.
async fn list_orders(
    State(state): State<AppState>,
    _: OwnerUser,
    Query(filter): Query<OrderFilter>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.gallery().all_orders(filter).await?))
}

async fn set_order_status(
    State(state): State<AppState>,
    OwnerUser(owner): OwnerUser,
    Path(id): Path<OrderId>,
    body: Body<StatusUpdate>,
) -> ApiResult<Json<Order>> {
    let Json(update) = body?;
    tracing::info!(order_id = %id, owner = %owner.id, status = %update.status, "status update requested");
    Ok(Json(state.gallery().set_order_status(id, update.status).await?))
}

// Messages

async fn list_messages(State(state): State<AppState>, _: OwnerUser) -> ApiResult<Json<Vec<Message>>> {
    Ok(Json(state.gallery().messages().await?))
}

async fn unread_count(State(state): State<AppState>, _: OwnerUser) -> ApiResult<Json<Value>> {
    let unread = state.gallery().unread_messages().await?;
    Ok(Json(json!({ "unread": unread })))
}

async fn mark_read(
    State(state): State<AppState>,
    _: OwnerUser,
    Path(id): Path<MessageId>,
) -> ApiResult<Json<Message>> {
    Ok(Json(state.gallery().mark_message_read(id).await?))
}
