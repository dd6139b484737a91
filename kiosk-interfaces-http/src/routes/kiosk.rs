use axum::routing::{get, post};
use axum::Router;

use kiosk_application::AppState;

use crate::handlers::{kiosk_handlers, ops_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(kiosk_handlers::get_status))
        .route("/measure-base", post(kiosk_handlers::measure_base))
        .route("/capture", post(kiosk_handlers::capture))
        .route("/classify", post(kiosk_handlers::classify))
        .route("/process-waste", post(kiosk_handlers::process_waste))
        .route("/manual-reward", post(kiosk_handlers::manual_reward))
        .route("/ops/health/live", get(ops_handlers::health_live))
        .route("/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
