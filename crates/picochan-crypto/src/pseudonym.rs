use sha1::{Digest, Sha1};

/// Seconds per rotation bucket when daily rotation is on.
pub const ROTATION_PERIOD_SECS: i64 = 86_400;

/// Hex digits kept from the digest.
pub const PSEUDONYM_LEN: usize = 6;

/// Derives per-author pseudonyms from network addresses.
#[derive(Debug, Clone)]
pub struct IdentityHasher {
    salt: String,
    rotate_daily: bool,
}

impl IdentityHasher {
    pub fn new(salt: impl Into<String>, rotate_daily: bool) -> Self {
        Self {
            salt: salt.into(),
            rotate_daily,
        }
    }

    pub fn rotates_daily(&self) -> bool {
        self.rotate_daily
    }

    /// Time bucket for `now_secs`: the epoch day, or 0 when rotation is off.
    pub fn bucket(&self, now_secs: i64) -> i64 {
        if self.rotate_daily {
            now_secs.div_euclid(ROTATION_PERIOD_SECS)
        } else {
            0
        }
    }

    /// First six uppercase hex digits of `SHA1(address|salt|bucket)`.
    pub fn pseudonym(&self, address: &str, now_secs: i64) -> String {
        let payload = format!("{}|{}|{}", address, self.salt, self.bucket(now_secs));
        let digest = Sha1::digest(payload.as_bytes());
        let mut hx = hex::encode_upper(digest);
        hx.truncate(PSEUDONYM_LEN);
        hx
    }
}
