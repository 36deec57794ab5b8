use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use tracing::debug;

use picochan_gateway::connection;
use picochan_types::api::{DiffRequest, DiffResponse, OkResponse};
use picochan_types::clock::{now_secs, now_secs_f64};
use picochan_types::events::GatewayEvent;
use picochan_types::models::{CanvasSnapshot, Channel};

use crate::client::ClientAddr;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /dessin/canvas
pub async fn get_canvas(State(state): State<AppState>, addr: ClientAddr) -> Json<CanvasSnapshot> {
    state.clients.mark_seen(addr.as_str(), now_secs());
    Json(state.canvas.snapshot())
}

/// GET /dessin/stream: full grid, then one frame per applied pixel.
pub async fn stream(State(state): State<AppState>, addr: ClientAddr) -> impl IntoResponse {
    state.clients.mark_seen(addr.as_str(), now_secs());

    // Subscribe first: a pixel landing between the two shows up in both the
    // snapshot and the stream, which is harmless.
    let subscriber = state.dispatcher.subscribe();
    let snapshot = state.canvas.snapshot();
    debug!("{} opened canvas stream ({})", addr.as_str(), subscriber.id());

    connection::into_sse(connection::canvas_stream(
        snapshot,
        subscriber,
        state.dispatcher.shutdown_token(),
    ))
}

/// POST /dessin/diff: apply a batch atomically, then broadcast each applied
/// pixel on its own.
pub async fn post_diff(
    State(state): State<AppState>,
    addr: ClientAddr,
    body: Result<Json<DiffRequest>, JsonRejection>,
) -> Result<Json<DiffResponse>, ApiError> {
    let Json(req) = body.map_err(|_| ApiError::Validation("bad diff"))?;
    state.clients.mark_seen(addr.as_str(), now_secs());

    let applied = state.canvas.apply_diff(&req.pixels)?;
    let n = applied.len();
    for pixel in applied {
        state.dispatcher.publish(GatewayEvent::Pixel(pixel));
    }

    debug!("{} applied {}/{} pixels", addr.as_str(), n, req.pixels.len());
    Ok(Json(DiffResponse { ok: true, n }))
}

/// POST /dessin/publish: post the current grid to the `dessin` channel.
pub async fn publish(
    State(state): State<AppState>,
    addr: ClientAddr,
) -> Result<Json<OkResponse>, ApiError> {
    let now = now_secs_f64();
    state.clients.mark_seen(addr.as_str(), now as i64);

    if !state.clients.check_and_record_post(addr.as_str(), now).is_allowed() {
        debug!("{} rate limited", addr.as_str());
        return Err(ApiError::RateLimited);
    }

    let text = state.canvas.snapshot_text();
    state.post(Channel::Dessin, text, addr.as_str(), now);
    Ok(Json(OkResponse { ok: true }))
}
