use atelier_core::basket::{AddToBasket, BasketItem, BasketView, QuantityUpdate};
use atelier_core::ids::BasketItemId;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::Path;
use crate::state::AppState;

/// The signed-in user's basket.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/basket", get(view).delete(clear))
        .route("/v1/basket/count", get(count))
        .route("/v1/basket/items", post(add_item))
        .route("/v1/basket/items/{id}", patch(update_item).delete(remove_item))
}

async fn view(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<BasketView>> {
    Ok(Json(state.gallery().basket(user.id).await?))
}

async fn clear(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Value>> {
    let removed = state.gallery().clear_basket(user.id).await?;
    Ok(Json(json!({ "removed": removed })))
}

async fn count(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Value>> {
    let count = state.gallery().basket_count(user.id).await?;
    Ok(Json(json!({ "count": count })))
}

async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<AddToBasket>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BasketItem>)> {
    let Json(request) = body?;
    let item = state.gallery().add_to_basket(user.id, request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Quantity 0 removes the line and answers 204.
async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<BasketItemId>,
    body: Result<Json<QuantityUpdate>, JsonRejection>,
) -> ApiResult<Result<Json<BasketItem>, StatusCode>> {
    let Json(update) = body?;
    let updated = state
        .gallery()
        .update_basket_item(user.id, id, update.quantity)
        .await?;
    Ok(updated.map(Json).ok_or(StatusCode::NO_CONTENT))
}

async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<BasketItemId>,
) -> ApiResult<StatusCode> {
    state.gallery().remove_basket_item(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
