//! Shared boundary types for the HRM validator.
//!
//! This module defines the data contract between the document provider and
//! the render model:
//! - Provider → Engine (in-memory): an [`Isd`], the fully resolved visual tree
//!   valid at one instant, made of regions holding styled text and boxes.
//! - The style primitives the engine reads from that tree, which also make up
//!   the key of the glyph cache.

use std::fmt;

use serde::Deserialize;

use crate::number::{Rational, parse_rational};

// ---------------------------------------------------------------------------
// Lengths
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthUnits {
    /// Percentage of the root container height.
    Rh,
    /// Percentage of the root container width.
    Rw,
    Pct,
    Px,
    Em,
    C,
}

impl LengthUnits {
    fn suffix(self) -> &'static str {
        match self {
            LengthUnits::Rh => "rh",
            LengthUnits::Rw => "rw",
            LengthUnits::Pct => "%",
            LengthUnits::Px => "px",
            LengthUnits::Em => "em",
            LengthUnits::C => "c",
        }
    }
}

impl fmt::Display for LengthUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// A scalar length with its units.
///
/// The value is exact, so two lengths are the same only if they are
/// numerically identical, which is what the glyph cache needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Length {
    pub value: Rational,
    pub units: LengthUnits,
}

impl Length {
    pub const fn new(value: Rational, units: LengthUnits) -> Self {
        Self { value, units }
    }

    pub const fn rh(value: i128) -> Self {
        Self::new(Rational::new_raw(value, 1), LengthUnits::Rh)
    }

    pub const fn rw(value: i128) -> Self {
        Self::new(Rational::new_raw(value, 1), LengthUnits::Rw)
    }
}

impl std::str::FromStr for Length {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
            .ok_or_else(|| format!("length {s:?} has no units"))?;
        let (number, suffix) = s.split_at(split);
        let value =
            parse_rational(number).ok_or_else(|| format!("invalid length value in {s:?}"))?;
        let units = match suffix {
            "rh" => LengthUnits::Rh,
            "rw" => LengthUnits::Rw,
            "%" => LengthUnits::Pct,
            "px" => LengthUnits::Px,
            "em" => LengthUnits::Em,
            "c" => LengthUnits::C,
            other => return Err(format!("unknown length units {other:?}")),
        };
        Ok(Length { value, units })
    }
}

impl<'de> Deserialize<'de> for Length {
    fn deserialize<D>(d: D) -> Result<Length, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct Extent {
    pub width: Length,
    pub height: Length,
}

impl Default for Extent {
    fn default() -> Self {
        Extent {
            width: Length::rw(100),
            height: Length::rh(100),
        }
    }
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// A resolved color.
///
/// Only 8-bit sRGB with alpha is understood by the render model; any other
/// colorimetry is carried through so the model can reject it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Color {
    Rgba8([u8; 4]),
    Other {
        colorimetry: String,
        components: Vec<u16>,
    },
}

impl Color {
    pub const TRANSPARENT: Color = Color::Rgba8([0, 0, 0, 0]);
    pub const BLACK: Color = Color::Rgba8([0, 0, 0, 255]);
    pub const WHITE: Color = Color::Rgba8([255, 255, 255, 255]);

    pub fn named(name: &str) -> Option<Color> {
        let rgb = match name.to_ascii_lowercase().as_str() {
            "transparent" => return Some(Color::TRANSPARENT),
            "black" => [0, 0, 0],
            "silver" => [192, 192, 192],
            "gray" => [128, 128, 128],
            "white" => [255, 255, 255],
            "maroon" => [128, 0, 0],
            "red" => [255, 0, 0],
            "purple" => [128, 0, 128],
            "fuchsia" | "magenta" => [255, 0, 255],
            "green" => [0, 128, 0],
            "lime" => [0, 255, 0],
            "olive" => [128, 128, 0],
            "yellow" => [255, 255, 0],
            "navy" => [0, 0, 128],
            "blue" => [0, 0, 255],
            "teal" => [0, 128, 128],
            "aqua" | "cyan" => [0, 255, 255],
            _ => return None,
        };
        Some(Color::Rgba8([rgb[0], rgb[1], rgb[2], 255]))
    }

    fn parse(s: &str) -> Result<Color, String> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            let byte = |i: usize| {
                hex.get(i..i + 2)
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| format!("invalid hex color {s:?}"))
            };
            return match hex.len() {
                6 => Ok(Color::Rgba8([byte(0)?, byte(2)?, byte(4)?, 255])),
                8 => Ok(Color::Rgba8([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
                _ => Err(format!("invalid hex color {s:?}")),
            };
        }
        for (prefix, arity) in [("rgba(", 4), ("rgb(", 3)] {
            if let Some(args) = s.strip_prefix(prefix).and_then(|r| r.strip_suffix(')')) {
                let parts = args
                    .split(',')
                    .map(|p| p.trim().parse::<u8>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| format!("invalid color {s:?}"))?;
                if parts.len() != arity {
                    return Err(format!("invalid color {s:?}"));
                }
                let alpha = parts.get(3).copied().unwrap_or(255);
                return Ok(Color::Rgba8([parts[0], parts[1], parts[2], alpha]));
            }
        }
        Color::named(s).ok_or_else(|| format!("unknown color {s:?}"))
    }
}

/// Accepts `"#rrggbb"`, `"#rrggbbaa"`, `"rgb(..)"`, `"rgba(..)"`, a named
/// color, or `{"colorimetry": "...", "components": [...]}`.
impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(d: D) -> Result<Color, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{Error, MapAccess, Visitor};

        #[derive(Deserialize)]
        struct Tagged {
            colorimetry: String,
            #[serde(default)]
            components: Vec<u16>,
        }

        struct ColorVisitor;

        impl<'de> Visitor<'de> for ColorVisitor {
            type Value = Color;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a color string or a colorimetry object")
            }

            fn visit_str<E: Error>(self, v: &str) -> Result<Color, E> {
                Color::parse(v).map_err(E::custom)
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Color, A::Error> {
                let tagged =
                    Tagged::deserialize(serde::de::value::MapAccessDeserializer::new(map))?;
                if tagged.colorimetry.eq_ignore_ascii_case("rgba8") {
                    let c = &tagged.components;
                    if c.len() == 4 && c.iter().all(|v| *v <= 255) {
                        return Ok(Color::Rgba8([c[0] as u8, c[1] as u8, c[2] as u8, c[3] as u8]));
                    }
                    return Err(A::Error::custom("rgba8 colors need four components in 0..=255"));
                }
                Ok(Color::Other {
                    colorimetry: tagged.colorimetry,
                    components: tagged.components,
                })
            }
        }

        d.deserialize_any(ColorVisitor)
    }
}

// ---------------------------------------------------------------------------
// Text styles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextDecoration {
    pub underline: bool,
    pub line_through: bool,
    pub overline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOutline {
    #[serde(default)]
    pub color: Option<Color>,
    pub thickness: Length,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextShadow {
    pub x_offset: Length,
    pub y_offset: Length,
    #[serde(default)]
    pub blur_radius: Option<Length>,
    #[serde(default)]
    pub color: Option<Color>,
}

/// Default font size: one cell of the default 32x15 cell grid.
pub const DEFAULT_FONT_SIZE: Length = Length::new(Rational::new_raw(20, 3), LengthUnits::Rh);

/// Resolved styles of one content element.
///
/// These are the render-affecting properties: together with a character they
/// decide whether two glyphs are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComputedStyle {
    pub color: Color,
    pub background_color: Option<Color>,
    pub font_family: Vec<String>,
    pub font_size: Length,
    pub font_style: FontStyle,
    pub font_weight: FontWeight,
    pub text_decoration: TextDecoration,
    pub text_outline: Option<TextOutline>,
    pub text_shadow: Vec<TextShadow>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        ComputedStyle {
            color: Color::WHITE,
            background_color: None,
            font_family: vec!["default".to_string()],
            font_size: DEFAULT_FONT_SIZE,
            font_style: FontStyle::Normal,
            font_weight: FontWeight::Normal,
            text_decoration: TextDecoration::default(),
            text_outline: None,
            text_shadow: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Region styles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShowBackground {
    #[default]
    Always,
    WhenActive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Display {
    #[default]
    Auto,
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

// ---------------------------------------------------------------------------
// Provider → Engine boundary (in-memory only)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Body,
    Div,
    P,
    Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsdElement {
    pub kind: ElementKind,
    pub style: ComputedStyle,
    pub children: Vec<IsdNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IsdNode {
    Element(IsdElement),
    /// Line break. Carries styles but never paints a background box.
    Br(ComputedStyle),
    /// Character data; styled by its parent element.
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsdRegion {
    pub id: String,
    pub extent: Extent,
    pub background_color: Option<Color>,
    pub show_background: ShowBackground,
    pub opacity: f64,
    pub display: Display,
    pub visibility: Visibility,
    pub children: Vec<IsdNode>,
}

impl IsdRegion {
    /// An empty, fully visible, full-frame region with no background.
    pub fn new(id: impl Into<String>) -> Self {
        IsdRegion {
            id: id.into(),
            extent: Extent::default(),
            background_color: None,
            show_background: ShowBackground::Always,
            opacity: 1.0,
            display: Display::Auto,
            visibility: Visibility::Visible,
            children: Vec::new(),
        }
    }
}

/// Intermediate Synchronic Document: the visual tree valid at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Isd {
    pub regions: Vec<IsdRegion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_parse_with_units() {
        let l: Length = "6.5rh".parse().unwrap();
        assert_eq!(l, Length::new(Rational::new(13, 2), LengthUnits::Rh));
        let l: Length = "50%".parse().unwrap();
        assert_eq!(l.units, LengthUnits::Pct);
        assert!("12".parse::<Length>().is_err());
        assert!("12pt".parse::<Length>().is_err());
    }

    #[test]
    fn colors_parse_from_strings_and_objects() {
        let colors: Vec<Color> = serde_json::from_str(
            r##"["red", "#00ff0080", "rgba(1,2,3,4)", {"colorimetry": "bt2020", "components": [1, 2, 3]}]"##,
        )
        .unwrap();
        assert_eq!(colors[0], Color::Rgba8([255, 0, 0, 255]));
        assert_eq!(colors[1], Color::Rgba8([0, 255, 0, 128]));
        assert_eq!(colors[2], Color::Rgba8([1, 2, 3, 4]));
        assert!(matches!(&colors[3], Color::Other { colorimetry, .. } if colorimetry == "bt2020"));
    }

    #[test]
    fn length_equality_is_exact() {
        let near: Length = "5.000001rh".parse().unwrap();
        assert_ne!(Length::rh(5), near);
        assert_ne!(Length::rh(5), Length::rw(5));

        let padded: Length = "5.50rh".parse().unwrap();
        let short: Length = "5.5rh".parse().unwrap();
        assert_eq!(padded, short);
    }

    #[test]
    fn default_font_size_is_a_fifteenth_of_the_root() {
        assert_eq!(DEFAULT_FONT_SIZE.value * Rational::from_integer(15), Rational::from_integer(100));
    }
}
