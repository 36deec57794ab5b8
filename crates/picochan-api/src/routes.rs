use axum::{
    Router,
    routing::{get, post},
};
use tower_http::services::{ServeDir, ServeFile};

use crate::state::AppState;
use crate::{canvas, messages};

/// All board routes plus the static page. Tracing and CORS layers are added
/// by the binary.
pub fn router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/healthz", get(messages::healthz))
        .route("/channels", get(messages::channels))
        .route("/poll", get(messages::poll))
        .route("/msg", post(messages::post_message))
        .route("/stream", get(messages::stream))
        .route("/dessin/canvas", get(canvas::get_canvas))
        .route("/dessin/stream", get(canvas::stream))
        .route("/dessin/diff", post(canvas::post_diff))
        .route("/dessin/publish", post(canvas::publish))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}
