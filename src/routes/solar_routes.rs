use axum::{routing::get, Router};

use crate::controllers::solar_controller::get_solar;
use crate::shared_state::AppState;

/// Build the `/api/*` sub-router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/solar", get(get_solar))
        .with_state(state)
}
