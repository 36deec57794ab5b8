use serde::{Deserialize, Serialize};

use crate::models::Pixel;

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct PollQuery {
    #[serde(default)]
    pub last_id: i64,
    pub chan: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageForm {
    pub text: String,
    pub chan: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub chan: Option<String>,
}

// -- Canvas --

/// Keys other than `pixels` are ignored.
#[derive(Debug, Deserialize)]
pub struct DiffRequest {
    pub pixels: Vec<Pixel>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiffResponse {
    pub ok: bool,
    /// Pixels actually applied (out-of-bounds and multi-char cells are dropped)
    pub n: usize,
}

// -- Misc --

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub clients_active: usize,
    pub msgs: usize,
    pub hash_rotate_daily: bool,
}
