//! CSS colour and shadow values used by caption templates.
//!
//! Templates are authored with CSS notation (`#ffffff`,
//! `rgba(0,0,0,0.55)`, `0 2px 12px rgba(0,0,0,0.6)`), and serialize back
//! to it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid CSS colour \"{input}\": {reason}")]
pub struct ColorParseError {
    input: String,
    reason: &'static str,
}

impl ColorParseError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Straight-alpha RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba8(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgba8(0, 0, 0, 255);
    pub const WHITE: Color = Color::rgba8(255, 255, 255, 255);

    pub const fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba8(r, g, b, 255)
    }

    /// Colour with a CSS-style fractional alpha in `[0, 1]`.
    pub fn rgba(r: u8, g: u8, b: u8, alpha: f32) -> Self {
        Self::rgba8(r, g, b, alpha_to_u8(alpha))
    }

    pub fn alpha_f32(&self) -> f32 {
        self.a as f32 / 255.0
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// Parse `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)`
    /// or `transparent`.
    pub fn parse_css(input: &str) -> Result<Self, ColorParseError> {
        let s = input.trim().to_ascii_lowercase();
        if s == "transparent" {
            return Ok(Self::TRANSPARENT);
        }
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(input, hex);
        }
        if let Some(body) = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_function(input, body);
        }
        Err(ColorParseError::new(input, "unsupported notation"))
    }
}

fn alpha_to_u8(alpha: f32) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn parse_hex(input: &str, hex: &str) -> Result<Color, ColorParseError> {
    let digits: Vec<u8> = hex
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()
        .ok_or_else(|| ColorParseError::new(input, "non-hex digit"))?;

    let pair = |i: usize| digits[i] * 16 + digits[i + 1];
    let single = |i: usize| digits[i] * 17;
    match digits.len() {
        3 => Ok(Color::rgb(single(0), single(1), single(2))),
        4 => Ok(Color::rgba8(single(0), single(1), single(2), single(3))),
        6 => Ok(Color::rgb(pair(0), pair(2), pair(4))),
        8 => Ok(Color::rgba8(pair(0), pair(2), pair(4), pair(6))),
        _ => Err(ColorParseError::new(input, "hex colour needs 3, 4, 6 or 8 digits")),
    }
}

fn parse_rgb_function(input: &str, body: &str) -> Result<Color, ColorParseError> {
    let parts: Vec<&str> = body
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(ColorParseError::new(input, "expected 3 or 4 components"));
    }

    let channel = |part: &str| -> Result<u8, ColorParseError> {
        let value = match part.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().map(|v| v / 100.0 * 255.0),
            None => part.parse::<f32>(),
        }
        .map_err(|_| ColorParseError::new(input, "invalid channel"))?;
        Ok(value.clamp(0.0, 255.0).round() as u8)
    };

    let alpha = match parts.get(3) {
        Some(part) => match part.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().map(|v| v / 100.0),
            None => part.parse::<f32>(),
        }
        .map_err(|_| ColorParseError::new(input, "invalid alpha"))?,
        None => 1.0,
    };

    Ok(Color::rgba(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opaque() {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            let alpha = (self.alpha_f32() * 100.0).round() / 100.0;
            write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, alpha)
        }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_css(s)
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_css(&s).map_err(serde::de::Error::custom)
    }
}

/// Drop shadow painted beneath a caption background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
    pub color: Color,
}

impl Shadow {
    pub fn new(offset_x: f32, offset_y: f32, blur: f32, color: Color) -> Self {
        Self {
            offset_x,
            offset_y,
            blur: blur.max(0.0),
            color,
        }
    }

    /// Parse the CSS `box-shadow` shorthand `<x> <y> [<blur>] <colour>`.
    pub fn parse_css(input: &str) -> Result<Self, ColorParseError> {
        let s = input.trim();
        let color_start = s
            .find('#')
            .or_else(|| s.find("rgb"))
            .or_else(|| s.find("transparent"))
            .ok_or_else(|| ColorParseError::new(input, "shadow has no colour"))?;
        let color = Color::parse_css(&s[color_start..])?;

        let lengths: Vec<f32> = s[..color_start]
            .split_whitespace()
            .map(|token| {
                token
                    .trim_end_matches("px")
                    .parse::<f32>()
                    .map_err(|_| ColorParseError::new(input, "invalid shadow length"))
            })
            .collect::<Result<_, _>>()?;

        match lengths.as_slice() {
            [x, y] => Ok(Self::new(*x, *y, 0.0, color)),
            [x, y, blur, ..] => Ok(Self::new(*x, *y, *blur, color)),
            _ => Err(ColorParseError::new(input, "shadow needs x and y offsets")),
        }
    }
}

impl fmt::Display for Shadow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}px {}px {}px {}",
            self.offset_x, self.offset_y, self.blur, self.color
        )
    }
}

impl Serialize for Shadow {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Shadow {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_css(&s).map_err(serde::de::Error::custom)
    }
}
