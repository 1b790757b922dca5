pub mod basket;
pub mod catalog;
pub mod exhibitions;
pub mod health;
pub mod messages;
pub mod orders;
pub mod owner;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(catalog::routes())
        .merge(exhibitions::routes())
        .merge(messages::routes())
        .merge(basket::routes())
        .merge(orders::routes())
        .merge(owner::routes())
        .with_state(state)
}
