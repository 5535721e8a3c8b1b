//! Hex, RGB and HSV conversions shared by the color pickers.

use serde::{Deserialize, Serialize};

use crate::format::parse_int_prefix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Hue in degrees `[0, 360)`, saturation and value in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl Hsv {
    pub fn new(h: f64, s: f64, v: f64) -> Self {
        Self { h, s, v }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedColor {
    Transparent,
    Rgb(Rgb),
}

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    max.min(min.max(value))
}

pub fn rgb_to_hex(rgb: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.r, rgb.g, rgb.b)
}

/// Parses `#rgb`, `#rrggbb` or the same without `#`, case-insensitive and
/// ignoring surrounding whitespace.
pub fn hex_to_rgb(hex: &str) -> Option<Rgb> {
    let normalized = hex.trim().to_ascii_lowercase();
    let compact = normalized.strip_prefix('#').unwrap_or(&normalized);
    if !compact.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let full = match compact.len() {
        3 => compact.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => compact.to_string(),
        _ => return None,
    };
    let channel = |ix: usize| u8::from_str_radix(&full[ix..ix + 2], 16).ok();
    Some(Rgb {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

/// Canonical 6-digit lowercase form, or `None` if `hex` does not parse.
pub fn normalize_hex(hex: &str) -> Option<String> {
    hex_to_rgb(hex).map(rgb_to_hex)
}

pub fn rgb_to_hsv(rgb: Rgb) -> Hsv {
    let r = f64::from(rgb.r) / 255.0;
    let g = f64::from(rgb.g) / 255.0;
    let b = f64::from(rgb.b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let mut h = 0.0;
    if delta != 0.0 {
        h = if max == r {
            ((g - b) / delta) % 6.0
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        h *= 60.0;
        if h < 0.0 {
            h += 360.0;
        }
    }

    let s = if max == 0.0 { 0.0 } else { delta / max };
    Hsv { h, s, v: max }
}

pub fn hsv_to_rgb(hsv: Hsv) -> Rgb {
    let Hsv { h, s, v } = hsv;
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let channel = |value: f64| clamp(((value + m) * 255.0).round(), 0.0, 255.0) as u8;
    Rgb {
        r: channel(r),
        g: channel(g),
        b: channel(b),
    }
}

pub fn hsv_to_hex(hsv: Hsv) -> String {
    rgb_to_hex(hsv_to_rgb(hsv))
}

/// Reads the color formats a style value can carry: empty or
/// `transparent`, hex, and `rgb(..)`/`rgba(..)` with channels clamped to
/// `0..=255`. Alpha is ignored.
pub fn parse_color(value: &str) -> Option<ParsedColor> {
    let normalized = value.trim().to_ascii_lowercase();
    if normalized.is_empty() || normalized == "transparent" {
        return Some(ParsedColor::Transparent);
    }
    if let Some(rgb) = hex_to_rgb(&normalized) {
        return Some(ParsedColor::Rgb(rgb));
    }

    let inner = normalized
        .strip_prefix("rgba(")
        .or_else(|| normalized.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    if inner.is_empty() || inner.contains(')') {
        return None;
    }
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }

    let channel = |part: &str| parse_int_prefix(part).map(|n| n.clamp(0, 255) as u8);
    Some(ParsedColor::Rgb(Rgb {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
    }))
}
