/// Saturation and lightness shared by every pseudonym color.
const SATURATION: f64 = 0.58;
const LIGHTNESS: f64 = 0.58;

/// Seed used when the pseudonym is not valid hex.
const FALLBACK_SEED: u32 = 0x7F7F7F;

/// Map a pseudonym to a `#RRGGBB` display color.
///
/// The six hex digits are read as a 24-bit integer whose value mod 360 is the
/// hue. Unparseable input falls back to a fixed seed instead of failing.
pub fn color_from_pseudonym(hash: &str) -> String {
    let n = u32::from_str_radix(hash, 16)
        .ok()
        .filter(|n| *n <= 0xFF_FFFF)
        .unwrap_or(FALLBACK_SEED);
    let (r, g, b) = hsl_to_rgb(f64::from(n % 360), SATURATION, LIGHTNESS);
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Standard sector-based HSL -> RGB. `h` in degrees, `s` and `l` in [0, 1].
fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}
