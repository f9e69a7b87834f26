use crate::routes;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_app(state: AppState, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route("/analyze", post(routes::submit_analysis))
        .route(
            "/analyze/:request_id",
            get(routes::get_analysis).delete(routes::cancel_analysis),
        )
        .route("/health", get(routes::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
