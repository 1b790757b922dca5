use atelier_core::message::{Message, MessageInput};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::auth::MaybeUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// Public contact form.
pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/messages", post(send_message))
}

async fn send_message(
    State(state): State<AppState>,
    user: MaybeUser,
    body: Result<Json<MessageInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let Json(input) = body?;
    let sender = user.0.map(|u| u.id);
    let message = state.gallery().send_message(input, sender).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
