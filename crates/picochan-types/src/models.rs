use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named partition of the message log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Free text
    #[default]
    Discussion,
    /// Published canvas snapshots
    Dessin,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Discussion, Channel::Dessin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discussion => "discussion",
            Self::Dessin => "dessin",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannel(pub String);

impl fmt::Display for UnknownChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown channel '{}'", self.0)
    }
}

impl std::error::Error for UnknownChannel {}

impl FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownChannel(s.to_string()))
    }
}

/// A board message. Immutable once the log has assigned its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    /// Epoch seconds
    pub ts: i64,
    pub chan: Channel,
    /// Message text, or the newline-joined canvas rows for `dessin`.
    pub text: String,
    /// 6 uppercase hex chars
    pub hash: String,
    /// `#RRGGBB`
    pub color: String,
}

/// One canvas cell mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pixel {
    pub x: i64,
    pub y: i64,
    pub ch: String,
}

impl Pixel {
    pub fn new(x: i64, y: i64, ch: impl Into<String>) -> Self {
        Self { x, y, ch: ch.into() }
    }
}

/// Point-in-time copy of the whole canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSnapshot {
    pub w: usize,
    pub h: usize,
    pub lines: Vec<String>,
}

impl CanvasSnapshot {
    /// Rows joined with `\n`, the form a snapshot takes when posted to the log.
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}
