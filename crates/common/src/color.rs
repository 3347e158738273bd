use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors from parsing color strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),
    #[error("color must have 6 hex digits: {0:?}")]
    BadLength(String),
    #[error("invalid hex digit in color: {0:?}")]
    BadDigit(String),
}

/// An sRGB color with components in [0, 1].
///
/// Serialized as a `#rrggbb` string so that configuration files stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(s: &str) -> Result<Self, ColorError> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ColorError::MissingHash(s.to_string()))?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorError::BadLength(s.to_string()));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorError::BadDigit(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| ColorError::BadDigit(s.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.to_srgb8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    pub fn to_srgb8(&self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    /// Convert to linear light for upload to an sRGB render target.
    pub fn to_linear(&self) -> [f32; 3] {
        fn channel(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        [channel(self.r), channel(self.g), channel(self.b)]
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_hex()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex() {
        let c = Rgb::from_hex("#ff0000").unwrap();
        assert_eq!(c, Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(c.to_hex(), "#ff0000");
    }

    #[test]
    fn hex_is_case_insensitive() {
        assert_eq!(
            Rgb::from_hex("#EFFF14").unwrap().to_hex(),
            Rgb::from_hex("#efff14").unwrap().to_hex()
        );
    }

    #[test]
    fn rejects_malformed() {
        assert!(matches!(Rgb::from_hex("ff0000"), Err(ColorError::MissingHash(_))));
        assert!(matches!(Rgb::from_hex("#fff"), Err(ColorError::BadLength(_))));
        assert!(matches!(Rgb::from_hex("#gg0000"), Err(ColorError::BadDigit(_))));
    }

    #[test]
    fn rejects_signed_channels() {
        assert!(matches!(Rgb::from_hex("#+f+f+f"), Err(ColorError::BadDigit(_))));
        assert!(matches!(Rgb::from_hex("#-10000"), Err(ColorError::BadDigit(_))));
    }

    #[test]
    fn linear_conversion_endpoints() {
        assert_eq!(Rgb::BLACK.to_linear(), [0.0, 0.0, 0.0]);
        let white = Rgb::WHITE.to_linear();
        assert!(white.iter().all(|c| (c - 1.0).abs() < 1e-6));
        let mid = Rgb::new(0.5, 0.5, 0.5).to_linear();
        assert!(mid[0] > 0.2 && mid[0] < 0.22);
    }

    #[test]
    fn serde_uses_hex_strings() {
        let json = serde_json::to_string(&Rgb::from_hex("#0550ff").unwrap()).unwrap();
        assert_eq!(json, "\"#0550ff\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_hex(), "#0550ff");
        assert!(serde_json::from_str::<Rgb>("\"red\"").is_err());
    }
}
