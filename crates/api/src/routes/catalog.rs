use atelier_core::catalog::{ArtDetail, ArtFilter, ArtSummary, Artist, CollectionView};
use atelier_core::ids::{ArtId, ArtistId, CollectionId};
use atelier_core::service::Homepage;
use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

use crate::error::ApiResult;
use crate::extract::{Path, Query};
use crate::state::AppState;

/// Public catalog browsing.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/home", get(home))
        .route("/v1/artists", get(list_artists))
        .route("/v1/artists/{id}", get(get_artist))
        .route("/v1/artists/{id}/art", get(artist_art))
        .route("/v1/gallery", get(gallery))
        .route("/v1/collections/{id}", get(get_collection))
        .route("/v1/art", get(list_art))
        .route("/v1/art/featured", get(featured_art))
        .route("/v1/art/{id}", get(get_art))
}

async fn home(State(state): State<AppState>) -> ApiResult<Json<Homepage>> {
    Ok(Json(state.gallery().homepage().await?))
}

async fn list_artists(State(state): State<AppState>) -> ApiResult<Json<Vec<Artist>>> {
    Ok(Json(state.gallery().artists().await?))
}

async fn get_artist(State(state): State<AppState>, Path(id): Path<ArtistId>) -> ApiResult<Json<Artist>> {
    Ok(Json(state.gallery().artist(id).await?))
}

async fn artist_art(
    State(state): State<AppState>,
    Path(id): Path<ArtistId>,
) -> ApiResult<Json<Vec<ArtSummary>>> {
    Ok(Json(state.gallery().art_by_artist(id).await?))
}

async fn gallery(State(state): State<AppState>) -> ApiResult<Json<Vec<CollectionView>>> {
    Ok(Json(state.gallery().gallery().await?))
}

async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
) -> ApiResult<Json<CollectionView>> {
    Ok(Json(state.gallery().collection(id).await?))
}

/// `?search=&min_price=&max_price=&featured=&available=&collection=&artist=`
async fn list_art(
    State(state): State<AppState>,
    Query(filter): Query<ArtFilter>,
) -> ApiResult<Json<Vec<ArtSummary>>> {
    Ok(Json(state.gallery().list_art(&filter).await?))
}

async fn featured_art(State(state): State<AppState>) -> ApiResult<Json<Vec<ArtSummary>>> {
    Ok(Json(state.gallery().featured_art().await?))
}

async fn get_art(State(state): State<AppState>, Path(id): Path<ArtId>) -> ApiResult<Json<ArtDetail>> {
    Ok(Json(state.gallery().art_detail(id).await?))
}
