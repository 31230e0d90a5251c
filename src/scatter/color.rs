//! RGBA colour with hex string (de)serialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SamplerError;

/// 8-bit RGBA colour.
///
/// Serialized as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Color {
    /// Fully transparent black; the cleared raster value.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Points inside the quarter disc.
    pub const INSIDE_BLUE: Self = Self::rgb(0x3b, 0x82, 0xf6);
    /// Points outside the quarter disc.
    pub const OUTSIDE_RED: Self = Self::rgb(0xef, 0x44, 0x44);
    /// Quarter-circle outline, 20% opaque blue.
    pub const OUTLINE_BLUE: Self = Self::rgba(0x3b, 0x82, 0xf6, 0x33);

    /// Opaque colour.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Colour with explicit alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    ///
    /// # Errors
    ///
    /// Returns a configuration error for any other shape.
    pub fn from_hex(hex: &str) -> Result<Self, SamplerError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return Err(SamplerError::config(format!(
                "colour '{hex}' must be #rrggbb or #rrggbbaa"
            )));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| SamplerError::config(format!("colour '{hex}' has non-hex digits")))
        };

        let alpha = if digits.len() == 8 { channel(6)? } else { 0xff };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
    }

    /// Hex form, omitting alpha when opaque.
    #[must_use]
    pub fn to_hex(&self) -> String {
        if self.a == 0xff {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = SamplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = SamplerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
