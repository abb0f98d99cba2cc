use serde::{Deserialize, Serialize};

use crate::error::LipstickError;

/// A named lipstick shade. Two shades are considered the same color iff
/// their hex strings match, regardless of the display name.
#[derive(Debug, Clone, Serialize, Deserialize, Eq)]
pub struct LipColor {
    pub name: String,
    pub hex: String,
}

impl PartialEq for LipColor {
    fn eq(&self, other: &Self) -> bool {
        self.hex == other.hex
    }
}

impl LipColor {
    pub fn new(name: &str, hex: &str) -> Self {
        LipColor {
            name: name.to_string(),
            hex: hex.to_string(),
        }
    }

    /// rgb decodes the shade into its R, G, B channels.
    ///
    /// # Returns
    /// * `Result<[u8; 3], LipstickError>`
    pub fn rgb(&self) -> Result<[u8; 3], LipstickError> {
        decode_hex(&self.hex)
    }
}

/// decode_hex parses a `#RRGGBB` string into its channels.
pub fn decode_hex(hex: &str) -> Result<[u8; 3], LipstickError> {
    let digits = match hex.strip_prefix('#') {
        None => return Err(LipstickError::InvalidColor(hex.to_string())),
        Some(digits) => digits,
    };
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(LipstickError::InvalidColor(hex.to_string()));
    }

    let r = u8::from_str_radix(&digits[0..2], 16)
        .map_err(|_| LipstickError::InvalidColor(hex.to_string()))?;
    let g = u8::from_str_radix(&digits[2..4], 16)
        .map_err(|_| LipstickError::InvalidColor(hex.to_string()))?;
    let b = u8::from_str_radix(&digits[4..6], 16)
        .map_err(|_| LipstickError::InvalidColor(hex.to_string()))?;

    Ok([r, g, b])
}

/// encode_hex formats channels as a lowercase zero-padded `#rrggbb` string.
pub fn encode_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// adjust_color shifts the brightness of a hex color.
///
/// Each channel is adjusted independently by adding `percent` and clamping
/// to `[0, 255]`. This is a plain additive adjustment, not a
/// gamma-correct one; the bottom gradient stop depends on these exact
/// semantics.
///
/// # Arguments
/// * `hex` - `#RRGGBB` color string
/// * `percent` - signed per-channel offset
///
/// # Returns
/// * `Result<String, LipstickError>`
pub fn adjust_color(hex: &str, percent: i32) -> Result<String, LipstickError> {
    let [r, g, b] = decode_hex(hex)?;
    let adjust = |ch: u8| -> u8 { (ch as i32 + percent).clamp(0, 255) as u8 };
    Ok(encode_hex([adjust(r), adjust(g), adjust(b)]))
}
