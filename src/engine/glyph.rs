//! Glyph identity: the key of the render model's glyph cache.

use crate::types::{
    Color, ComputedStyle, FontStyle, FontWeight, Length, TextDecoration, TextOutline, TextShadow,
};

/// One rendered character occurrence.
///
/// Two glyphs are interchangeable in the glyph buffer iff every field is
/// equal. Lengths compare by value; colors are compared as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Glyph {
    pub ch: char,
    pub color: Color,
    pub font_family: Vec<String>,
    pub font_size: Length,
    pub font_style: FontStyle,
    pub font_weight: FontWeight,
    pub text_decoration: TextDecoration,
    pub text_outline: Option<TextOutline>,
    pub text_shadow: Vec<TextShadow>,
    pub background_color: Option<Color>,
}

impl Glyph {
    /// Identity of `ch` drawn with the styles of its parent element.
    pub fn new(ch: char, style: &ComputedStyle) -> Self {
        Glyph {
            ch,
            color: style.color.clone(),
            font_family: style.font_family.clone(),
            font_size: style.font_size,
            font_style: style.font_style,
            font_weight: style.font_weight,
            text_decoration: style.text_decoration,
            text_outline: style.text_outline.clone(),
            text_shadow: style.text_shadow.clone(),
            background_color: style.background_color.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::number::Rational;
    use crate::types::LengthUnits;

    #[test]
    fn same_char_and_style_is_same_glyph() {
        let style = ComputedStyle::default();
        let mut set = HashSet::new();
        set.insert(Glyph::new('l', &style));
        assert!(set.contains(&Glyph::new('l', &style.clone())));
        assert!(!set.contains(&Glyph::new('L', &style)));
    }

    #[test]
    fn any_style_field_changes_identity() {
        let base = ComputedStyle::default();
        let variants = [
            ComputedStyle { color: Color::Rgba8([255, 0, 0, 255]), ..base.clone() },
            ComputedStyle { background_color: Some(Color::BLACK), ..base.clone() },
            ComputedStyle { font_family: vec!["monospace".into()], ..base.clone() },
            ComputedStyle { font_size: Length::rh(5), ..base.clone() },
            ComputedStyle { font_style: FontStyle::Italic, ..base.clone() },
            ComputedStyle { font_weight: FontWeight::Bold, ..base.clone() },
            ComputedStyle {
                text_decoration: TextDecoration { underline: true, ..Default::default() },
                ..base.clone()
            },
            ComputedStyle {
                text_outline: Some(TextOutline {
                    color: None,
                    thickness: Length::new(Rational::new(1, 2), LengthUnits::Rh),
                }),
                ..base.clone()
            },
            ComputedStyle {
                text_shadow: vec![TextShadow {
                    x_offset: Length::rh(1),
                    y_offset: Length::rh(1),
                    blur_radius: None,
                    color: None,
                }],
                ..base.clone()
            },
        ];
        let reference = Glyph::new('a', &base);
        for style in &variants {
            assert_ne!(Glyph::new('a', style), reference, "{style:?}");
        }
    }

    #[test]
    fn visually_close_colors_are_distinct() {
        let a = ComputedStyle { color: Color::Rgba8([255, 255, 255, 255]), ..Default::default() };
        let b = ComputedStyle { color: Color::Rgba8([255, 255, 254, 255]), ..Default::default() };
        assert_ne!(Glyph::new('x', &a), Glyph::new('x', &b));
    }
}
