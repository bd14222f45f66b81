use utoipa::OpenApi;

use crate::controllers::solar_controller;
use crate::models::telemetry;

#[derive(OpenApi)]
#[openapi(
    paths(
        solar_controller::get_solar
    ),
    components(
        schemas(
            telemetry::TelemetrySnapshot,
            telemetry::NodeStatus
        )
    ),
    tags(
        (name = "solar-node", description = "Solar node telemetry API")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_the_snapshot_endpoint() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/solar"));
    }
}
