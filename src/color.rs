use std::fmt;
use std::str::FromStr;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<HexColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            HexColor(rgb.into_format::<u8>())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// HexColor – "#rrggbb" in config, converted per backend
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
#[error("invalid colour '{0}', expected #rrggbb")]
pub struct ColorError(pub String);

/// An sRGB colour written as `#rrggbb` in style sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(pub Srgb<u8>);

impl HexColor {
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        HexColor(Srgb::new(red, green, blue))
    }

    /// Colour for the static (plotters) renderer.
    pub fn to_plotters(self) -> RGBColor {
        RGBColor(self.0.red, self.0.green, self.0.blue)
    }

    /// Colour for the interactive viewer, with `alpha` in `0.0..=1.0`.
    pub fn to_egui(self, alpha: f32) -> Color32 {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color32::from_rgba_unmultiplied(self.0.red, self.0.green, self.0.blue, a)
    }
}

impl FromStr for HexColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 {
            return Err(ColorError(s.to_string()));
        }
        s.parse::<Srgb<u8>>()
            .map(HexColor)
            .map_err(|_| ColorError(s.to_string()))
    }
}

impl TryFrom<String> for HexColor {
    type Error = ColorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<HexColor> for String {
    fn from(c: HexColor) -> String {
        c.to_string()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0.red, self.0.green, self.0.blue)
    }
}
