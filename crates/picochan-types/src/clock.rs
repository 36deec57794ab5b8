/// Wall-clock helpers. Every timestamp in the board is epoch-based, so these
/// are the only places that read the system clock.

/// Current epoch time in whole seconds.
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Current epoch time in fractional seconds (microsecond precision).
pub fn now_secs_f64() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
