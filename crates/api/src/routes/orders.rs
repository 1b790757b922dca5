use atelier_core::ids::OrderId;
use atelier_core::order::{CheckoutDetails, Order, OrderDetail};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::Path;
use crate::state::AppState;

/// Checkout and the buyer's order history.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/checkout", post(checkout))
        .route("/v1/orders", get(my_orders))
        .route("/v1/orders/{id}", get(get_order))
}

async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<CheckoutDetails>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<OrderDetail>)> {
    let Json(details) = body?;
    let order = state.gallery().checkout(user.id, details).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn my_orders(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.gallery().orders_for(user.id).await?))
}

async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<OrderId>,
) -> ApiResult<Json<OrderDetail>> {
    Ok(Json(state.gallery().order(user.id, user.is_owner, id).await?))
}
