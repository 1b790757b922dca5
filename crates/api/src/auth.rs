//! Bearer-token authentication. Tokens are minted by the identity provider
//! and signed with the shared `JWT_SECRET`; this service only verifies them.

use atelier_core::ids::UserId;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The user's id.
    pub sub: Uuid,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
    /// Gallery owners may manage the catalog, orders and inbox.
    #[serde(default)]
    pub superuser: bool,
}

/// A signed-in user.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: UserId,
    pub is_owner: bool,
}

/// A signed-in user with owner rights; anyone else gets 403.
#[derive(Debug, Clone, Copy)]
pub struct OwnerUser(pub AuthUser);

/// The signed-in user when a valid token is present; anonymous otherwise.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<AuthUser>);

pub fn verify(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|err| {
        tracing::debug!(error = %err, "rejected bearer token");
        ApiError::Unauthorized
    })
}

/// Sign claims with the shared secret. Used by tests and local tooling.
pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, ApiError> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|err| ApiError::Internal(format!("token signing failed: {err}")))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized)?;
        let claims = verify(bearer.token(), &state.config().jwt_secret)?;
        Ok(AuthUser {
            id: UserId(claims.sub),
            is_owner: claims.superuser,
        })
    }
}

impl FromRequestParts<AppState> for OwnerUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_owner {
            return Err(ApiError::Forbidden("owner access required".to_string()));
        }
        Ok(OwnerUser(user))
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(AuthUser::from_request_parts(parts, state).await.ok()))
    }
}
