pub mod health;
pub mod photos;
pub mod sections;
pub mod sites;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(sites::routes())
        .merge(sections::routes())
        .merge(photos::routes())
        .with_state(state)
}
