use atelier_core::exhibition::{ExhibitionDetail, ExhibitionSchedule};
use atelier_core::ids::ExhibitionId;
use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use crate::auth::MaybeUser;
use crate::error::ApiResult;
use crate::extract::Path;
use crate::state::AppState;

/// Public exhibition listings. Owners also see drafts.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/exhibitions", get(list_exhibitions))
        .route("/v1/exhibitions/{id}", get(get_exhibition))
}

fn sees_drafts(user: &MaybeUser) -> bool {
    user.0.is_some_and(|u| u.is_owner)
}

async fn list_exhibitions(
    State(state): State<AppState>,
    user: MaybeUser,
) -> ApiResult<Json<ExhibitionSchedule>> {
    let today = Utc::now().date_naive();
    Ok(Json(state.gallery().exhibitions(today, sees_drafts(&user)).await?))
}

async fn get_exhibition(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<ExhibitionId>,
) -> ApiResult<Json<ExhibitionDetail>> {
    Ok(Json(state.gallery().exhibition(id, sees_drafts(&user)).await?))
}
