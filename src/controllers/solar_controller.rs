use axum::{extract::State, Json};

use crate::models::telemetry::TelemetrySnapshot;
use crate::shared_state::AppState;

/// GET /api/solar
/// Latest telemetry snapshot of this node
///
/// Always answers 200; a failed or pending estimation is reported through the
/// `status` field. The snapshot is refreshed in the background every polling
/// interval, never by this call.
#[utoipa::path(
    get,
    path = "/api/solar",
    responses(
        (status = 200, description = "Latest node snapshot", body = TelemetrySnapshot)
    )
)]
pub async fn get_solar(State(state): State<AppState>) -> Json<TelemetrySnapshot> {
    let snapshot = state.latest();
    Json(snapshot.as_ref().clone())
}
