use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

pub const DEFAULT_SALT: &str = "pc/sel-🌊-2025";

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub secret_salt: String,
    pub hash_rotate_daily: bool,
    /// Seconds between posts from one address
    pub post_cooldown: f64,
    /// Log capacity per channel
    pub max_msgs: usize,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing keys take their default;
    /// unparseable numbers are logged and also take their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let rotate = lookup("PICOCHAN_HASH_ROTATE_DAILY").unwrap_or_else(|| "1".into());

        Self {
            secret_salt: lookup("PICOCHAN_SECRET_SALT").unwrap_or_else(|| DEFAULT_SALT.into()),
            hash_rotate_daily: !matches!(rotate.as_str(), "0" | "false" | "False" | "FALSE"),
            post_cooldown: parse_or(&lookup, "PICOCHAN_POST_COOLDOWN", 1.0),
            max_msgs: parse_or(&lookup, "PICOCHAN_MAX_MSGS", 512),
            host: lookup("PICOCHAN_HOST").unwrap_or_else(|| "127.0.0.1".into()),
            port: parse_or(&lookup, "PICOCHAN_PORT", 8080),
            static_dir: lookup("PICOCHAN_STATIC_DIR")
                .unwrap_or_else(|| "static".into())
                .into(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring {}={:?}, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
