//! Per-snapshot cost model.
//!
//! Two independent walks over the presented regions of one snapshot:
//! - [`text_cost`] visits every character, classifies it against the glyph
//!   buffers and sums its rendering or copy time.
//! - [`draw_area`] counts background boxes and sums the area to paint.

use std::collections::HashSet;

use crate::config::HrmParameters;
use crate::error::{HrmError, Result};
use crate::number::{Rational, checked_add, checked_div, checked_mul};
use crate::types::{
    Color, ComputedStyle, Display, Isd, IsdNode, IsdRegion, LengthUnits, ShowBackground,
    Visibility,
};

use super::codepoints::{is_base, is_complex_cjk};
use super::glyph::Glyph;

/// Result of the text walk over one snapshot.
#[derive(Debug, Default)]
pub struct TextCost {
    pub dur_t: Rational,
    /// Normalized area of glyphs that had to enter the glyph buffer.
    pub ngra_t: Rational,
    pub gren_count: usize,
    pub gcpy_count: usize,
    /// Every glyph drawn in this snapshot; becomes the next back buffer.
    pub front_buffer: HashSet<Glyph>,
}

/// Result of the background walk over one snapshot.
#[derive(Debug, Default, PartialEq)]
pub struct DrawCost {
    /// Normalized area painted, including the one-off frame clear.
    pub draw_area: Rational,
    pub nbg_total: usize,
    /// No region is presented.
    pub is_empty: bool,
}

/// Alpha of an RGBA8 color; any other colorimetry is unsupported.
fn alpha(color: &Color) -> Result<u8> {
    match color {
        Color::Rgba8([_, _, _, a]) => Ok(*a),
        Color::Other { colorimetry, .. } => Err(HrmError::UnsupportedColorimetry(colorimetry.clone())),
    }
}

fn has_visible_background(color: Option<&Color>) -> Result<bool> {
    match color {
        Some(c) => Ok(alpha(c)? != 0),
        None => Ok(false),
    }
}

/// Whether a region is presented, i.e. contributes to the rendered frame.
pub fn is_presented_region(region: &IsdRegion) -> Result<bool> {
    if region.opacity == 0.0
        || region.display == Display::None
        || region.visibility == Visibility::Hidden
    {
        return Ok(false);
    }

    if !region.children.is_empty() {
        return Ok(true);
    }

    if region.show_background != ShowBackground::Always {
        return Ok(false);
    }

    has_visible_background(region.background_color.as_ref())
}

fn presented_regions(isd: Option<&Isd>) -> impl Iterator<Item = Result<&IsdRegion>> {
    isd.into_iter()
        .flat_map(|isd| isd.regions.iter())
        .filter_map(|region| match is_presented_region(region) {
            Ok(true) => Some(Ok(region)),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        })
}

/// Percent-of-root lengths squared, as a fraction of the root area.
fn percent_area(a: Rational, b: Rational, what: &'static str) -> Result<Rational> {
    checked_div(checked_mul(a, b, what)?, Rational::from_integer(10_000), what)
}

/// Normalized rendered glyph area for text styled with `style`.
fn nrga(style: &ComputedStyle) -> Result<Rational> {
    let font_size = style.font_size;
    if font_size.units != LengthUnits::Rh {
        return Err(HrmError::UnsupportedUnits {
            property: "fontSize",
            units: font_size.units,
        });
    }
    percent_area(font_size.value, font_size.value, "glyph area")
}

fn region_normalized_size(region: &IsdRegion) -> Result<Rational> {
    let extent = region.extent;
    if extent.width.units != LengthUnits::Rw {
        return Err(HrmError::UnsupportedUnits {
            property: "extent width",
            units: extent.width.units,
        });
    }
    if extent.height.units != LengthUnits::Rh {
        return Err(HrmError::UnsupportedUnits {
            property: "extent height",
            units: extent.height.units,
        });
    }
    percent_area(extent.width.value, extent.height.value, "region area")
}

pub fn gcpy(c: char, params: &HrmParameters) -> Rational {
    if is_base(c) {
        params.gcpy_base
    } else {
        params.gcpy_other
    }
}

pub fn ren_g(c: char, params: &HrmParameters) -> Rational {
    if is_complex_cjk(c) {
        params.ren_g_cjk
    } else {
        params.ren_g_other
    }
}

/// Depth-first walk over text nodes, handing each to `f` with the style of
/// its parent element. Text placed directly in a region uses initial styles.
fn for_each_text<'a>(
    nodes: &'a [IsdNode],
    parent: &'a ComputedStyle,
    f: &mut impl FnMut(&'a str, &'a ComputedStyle) -> Result<()>,
) -> Result<()> {
    for node in nodes {
        match node {
            IsdNode::Element(element) => for_each_text(&element.children, &element.style, f)?,
            IsdNode::Text(text) => f(text, parent)?,
            IsdNode::Br(_) => {}
        }
    }
    Ok(())
}

/// Text rendering time of one snapshot against the previous snapshot's
/// glyph buffer.
pub fn text_cost(
    isd: Option<&Isd>,
    back_buffer: &HashSet<Glyph>,
    params: &HrmParameters,
) -> Result<TextCost> {
    let mut cost = TextCost::default();
    let initial = ComputedStyle::default();

    for region in presented_regions(isd) {
        for_each_text(&region?.children, &initial, &mut |text, style| {
            let area = nrga(style)?;

            for ch in text.chars() {
                let glyph = Glyph::new(ch, style);

                let (factor, buffered) = if cost.front_buffer.contains(&glyph) {
                    cost.gcpy_count += 1;
                    (gcpy(ch, params), false)
                } else if back_buffer.contains(&glyph) {
                    cost.gcpy_count += 1;
                    (gcpy(ch, params), true)
                } else {
                    cost.gren_count += 1;
                    (ren_g(ch, params), true)
                };

                let time = checked_div(area, factor, "text rendering time")?;
                cost.dur_t = checked_add(cost.dur_t, time, "text rendering time")?;
                if buffered {
                    cost.ngra_t = checked_add(cost.ngra_t, area, "glyph buffer size")?;
                }

                cost.front_buffer.insert(glyph);
            }

            Ok(())
        })?;
    }

    Ok(cost)
}

/// Count the non-transparent backgrounds in a subtree. Line breaks and
/// character data never paint a box.
fn count_backgrounds(nodes: &[IsdNode]) -> Result<usize> {
    let mut nbg = 0;
    for node in nodes {
        if let IsdNode::Element(element) = node {
            if has_visible_background(element.style.background_color.as_ref())? {
                nbg += 1;
            }
            nbg += count_backgrounds(&element.children)?;
        }
    }
    Ok(nbg)
}

/// Normalized area to paint for one snapshot.
pub fn draw_area(isd: Option<&Isd>) -> Result<DrawCost> {
    let mut cost = DrawCost {
        is_empty: true,
        ..DrawCost::default()
    };

    for region in presented_regions(isd) {
        let region = region?;
        cost.is_empty = false;

        let mut nbg = count_backgrounds(&region.children)?;
        if has_visible_background(region.background_color.as_ref())? {
            nbg += 1;
        }

        cost.nbg_total += nbg;
        let painted = checked_mul(
            region_normalized_size(region)?,
            Rational::from_integer(nbg as i128),
            "drawing area",
        )?;
        cost.draw_area = checked_add(cost.draw_area, painted, "drawing area")?;
    }

    if !cost.is_empty {
        // Clearing and compositing the frame.
        cost.draw_area = checked_add(cost.draw_area, Rational::from_integer(1), "drawing area")?;
    }

    Ok(cost)
}
