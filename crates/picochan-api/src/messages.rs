use axum::{
    Form, Json,
    extract::{Query, State, rejection::{FormRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use picochan_gateway::connection;
use picochan_store::log::POLL_BATCH;
use picochan_types::api::{HealthResponse, PollQuery, PostMessageForm, StreamQuery};
use picochan_types::clock::{now_secs, now_secs_f64};
use picochan_types::events::Topic;
use picochan_types::models::{Channel, Message};

use crate::client::ClientAddr;
use crate::error::ApiError;
use crate::state::AppState;

/// Longest message kept, in chars. Longer posts are cut, not refused.
pub const MAX_TEXT: usize = 240;

pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        clients_active: state.clients.active_count(now_secs()),
        msgs: state.log.len(),
        hash_rotate_daily: state.identity.rotates_daily(),
    })
}

pub async fn channels() -> Json<Vec<&'static str>> {
    Json(Channel::ALL.iter().map(Channel::as_str).collect())
}

/// GET /poll: retained messages after `last_id`. An unknown channel is
/// simply empty.
pub async fn poll(
    State(state): State<AppState>,
    addr: ClientAddr,
    query: Result<Query<PollQuery>, QueryRejection>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::Validation("bad query"))?;
    state.clients.mark_seen(addr.as_str(), now_secs());

    let since = u64::try_from(query.last_id).unwrap_or(0);
    let messages = match query.chan.as_deref().unwrap_or("discussion").parse::<Channel>() {
        Ok(chan) => state.log.query(since, chan, POLL_BATCH),
        Err(_) => Vec::new(),
    };
    Ok(Json(messages))
}

/// POST /msg: only `discussion` accepts free text; `dessin` is fed by
/// canvas publishes.
pub async fn post_message(
    State(state): State<AppState>,
    addr: ClientAddr,
    form: Result<Form<PostMessageForm>, FormRejection>,
) -> Result<StatusCode, ApiError> {
    let Form(form) = form.map_err(|_| ApiError::Validation("bad form"))?;
    let now = now_secs_f64();
    state.clients.mark_seen(addr.as_str(), now as i64);

    let chan = form.chan.as_deref().unwrap_or("discussion");
    if chan != Channel::Discussion.as_str() {
        return Err(ApiError::Validation("bad channel"));
    }

    if !state.clients.check_and_record_post(addr.as_str(), now).is_allowed() {
        debug!("{} rate limited", addr.as_str());
        return Err(ApiError::RateLimited);
    }

    let text = normalize_text(&form.text);
    if text.is_empty() {
        return Err(ApiError::Validation("empty"));
    }

    state.post(Channel::Discussion, text, addr.as_str(), now);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /stream: live messages for one channel as SSE.
pub async fn stream(
    State(state): State<AppState>,
    addr: ClientAddr,
    query: Result<Query<StreamQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::Validation("bad query"))?;
    let chan: Channel = query
        .chan
        .as_deref()
        .unwrap_or("discussion")
        .parse()
        .map_err(|_| ApiError::Validation("bad channel"))?;
    state.clients.mark_seen(addr.as_str(), now_secs());

    let subscriber = state.dispatcher.subscribe();
    debug!("{} opened {} stream ({})", addr.as_str(), chan, subscriber.id());

    let frames = connection::event_stream(
        subscriber,
        Topic::Channel(chan),
        state.dispatcher.shutdown_token(),
    );
    Ok(connection::into_sse(frames))
}

/// Trim, normalize CRLF to LF and cut to `MAX_TEXT` chars.
pub fn normalize_text(raw: &str) -> String {
    raw.trim().replace("\r\n", "\n").chars().take(MAX_TEXT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_converts_crlf() {
        assert_eq!(normalize_text("  hi\r\nthere \n"), "hi\nthere");
        assert_eq!(normalize_text(" \r\n\t "), "");
    }

    #[test]
    fn normalize_truncates_by_chars() {
        let long = "é".repeat(300);
        let out = normalize_text(&long);
        assert_eq!(out.chars().count(), MAX_TEXT);
    }
}
