//! Engine — the Hypothetical Render Model.
//!
//! Estimates how long a reference decoder needs to paint each snapshot of a
//! caption stream. Glyphs already drawn in the previous snapshot are copied
//! out of the glyph buffer instead of being rendered again, so the engine
//! keeps that buffer between calls.
//!
//! The engine never sees documents or times; it consumes snapshots one at a
//! time, in presentation order.

pub mod codepoints;
pub mod cost;
pub mod glyph;

use std::collections::HashSet;

use num_traits::Zero;
use serde::Serialize;

use crate::config::HrmParameters;
use crate::error::Result;
use crate::number::{Rational, checked_add, checked_div, serde_rational};
use crate::types::Isd;
use glyph::Glyph;

/// What it took to present one snapshot.
///
/// Serializes with plain numbers, for diagnostic traces.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IsdStatistics {
    /// Total rendering time, in seconds.
    #[serde(serialize_with = "serde_rational::serialize")]
    pub dur: Rational,
    /// Text component of `dur`.
    #[serde(serialize_with = "serde_rational::serialize")]
    pub dur_t: Rational,
    /// Background drawing component of `dur`.
    #[serde(serialize_with = "serde_rational::serialize")]
    pub dur_d: Rational,
    /// Background boxes painted.
    pub nbg_total: usize,
    /// The frame had to be cleared.
    pub clear: bool,
    /// Normalized rendered glyph area that entered the glyph buffer.
    #[serde(serialize_with = "serde_rational::serialize")]
    pub ngra_t: Rational,
    /// Glyphs rendered from scratch.
    pub gren_count: usize,
    /// Glyphs copied from the glyph buffer.
    pub gcpy_count: usize,
    /// No region was presented.
    pub is_empty: bool,
}

#[derive(Debug, Default)]
pub struct HrmEngine {
    params: HrmParameters,
    back_buffer: HashSet<Glyph>,
}

impl HrmEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(params: HrmParameters) -> Self {
        HrmEngine {
            params,
            back_buffer: HashSet::new(),
        }
    }

    pub fn parameters(&self) -> &HrmParameters {
        &self.params
    }

    /// Glyphs drawn by the last processed snapshot.
    pub fn back_buffer(&self) -> &HashSet<Glyph> {
        &self.back_buffer
    }

    /// Process the next snapshot of the stream.
    ///
    /// `None` stands for a blank screen. It costs nothing but still empties
    /// the glyph buffer. On error the buffer is left untouched.
    pub fn process(&mut self, isd: Option<&Isd>) -> Result<IsdStatistics> {
        let text = cost::text_cost(isd, &self.back_buffer, &self.params)?;
        let draw = cost::draw_area(isd)?;

        let dur_d = checked_div(draw.draw_area, self.params.bdraw, "drawing time")?;
        let dur = checked_add(text.dur_t, dur_d, "rendering time")?;

        self.back_buffer = text.front_buffer;

        Ok(IsdStatistics {
            dur,
            dur_t: text.dur_t,
            dur_d,
            nbg_total: draw.nbg_total,
            clear: !draw.draw_area.is_zero(),
            ngra_t: text.ngra_t,
            gren_count: text.gren_count,
            gcpy_count: text.gcpy_count,
            is_empty: draw.is_empty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Color, ComputedStyle, ElementKind, Extent, IsdElement, IsdNode, IsdRegion, Length,
    };

    fn r(n: i128) -> Rational {
        Rational::from_integer(n)
    }

    fn q(n: i128, d: i128) -> Rational {
        Rational::new(n, d)
    }

    const BDRAW: Rational = Rational::new_raw(12, 1);
    const GCPY_BASE: Rational = Rational::new_raw(12, 1);
    const GCPY_OTHER: Rational = Rational::new_raw(3, 1);
    const REN_G_CJK: Rational = Rational::new_raw(3, 5);
    const REN_G_OTHER: Rational = Rational::new_raw(6, 5);

    /// Normalized area of a glyph at the default font size.
    const CELL: Rational = Rational::new_raw(1, 225);

    fn element(kind: ElementKind, style: ComputedStyle, children: Vec<IsdNode>) -> IsdNode {
        IsdNode::Element(IsdElement { kind, style, children })
    }

    fn span(text: &str) -> IsdNode {
        span_styled(text, ComputedStyle::default())
    }

    fn span_styled(text: &str, style: ComputedStyle) -> IsdNode {
        element(ElementKind::Span, style, vec![IsdNode::Text(text.to_string())])
    }

    /// body > div > p > spans, in one full-frame region.
    fn paragraph(spans: Vec<IsdNode>) -> Isd {
        let p = element(ElementKind::P, ComputedStyle::default(), spans);
        let div = element(ElementKind::Div, ComputedStyle::default(), vec![p]);
        let body = element(ElementKind::Body, ComputedStyle::default(), vec![div]);
        Isd {
            regions: vec![IsdRegion {
                children: vec![body],
                ..IsdRegion::new("r1")
            }],
        }
    }

    fn quarter_region(id: &str, background: Color, children: Vec<IsdNode>) -> IsdRegion {
        IsdRegion {
            extent: Extent {
                width: Length::rw(50),
                height: Length::rh(50),
            },
            background_color: Some(background),
            children,
            ..IsdRegion::new(id)
        }
    }

    #[test]
    fn hello() {
        let mut engine = HrmEngine::new();
        let stats = engine.process(Some(&paragraph(vec![span("hello")]))).unwrap();

        assert_eq!(stats.gren_count, 4);
        assert_eq!(stats.gcpy_count, 1);
        assert_eq!(stats.nbg_total, 0);
        assert!(stats.clear);
        assert!(!stats.is_empty);
        assert_eq!(stats.dur, r(1) / BDRAW + CELL * (r(4) / REN_G_OTHER + r(1) / GCPY_BASE));
        assert_eq!(stats.ngra_t, CELL * r(4));
    }

    #[test]
    fn glyphs_are_copied_from_previous_snapshot() {
        let mut engine = HrmEngine::new();
        engine.process(Some(&paragraph(vec![span("hello")]))).unwrap();

        let stats = engine
            .process(Some(&paragraph(vec![span("bonjour bonjour")])))
            .unwrap();

        // 'o' comes from the back buffer, "bnjur " is new, the rest repeats.
        assert_eq!(stats.gren_count, 6);
        assert_eq!(stats.gcpy_count, 9);
        assert_eq!(stats.nbg_total, 0);
        assert_eq!(stats.dur, r(1) / BDRAW + CELL * (r(6) / REN_G_OTHER + r(9) / GCPY_BASE));
        assert_eq!(stats.ngra_t, CELL * r(7));
    }

    #[test]
    fn superset_snapshot_reuses_the_buffer() {
        let mut engine = HrmEngine::new();
        engine.process(Some(&paragraph(vec![span("ab")]))).unwrap();

        let stats = engine.process(Some(&paragraph(vec![span("abab")]))).unwrap();

        assert_eq!(stats.gren_count, 0);
        assert_eq!(stats.gcpy_count, 4);
        assert_eq!(stats.ngra_t, CELL * r(2));
        assert_eq!(stats.dur_t, CELL * r(4) / GCPY_BASE);
    }

    #[test]
    fn blank_screen_empties_the_buffer() {
        let mut engine = HrmEngine::new();
        engine.process(Some(&paragraph(vec![span("hello")]))).unwrap();

        let stats = engine.process(Some(&Isd::default())).unwrap();
        assert!(stats.is_empty);
        assert!(!stats.clear);
        assert!(stats.dur.is_zero());
        assert!(engine.back_buffer().is_empty());

        let stats = engine
            .process(Some(&paragraph(vec![span("bonjour bonjour")])))
            .unwrap();
        assert_eq!(stats.gren_count, 7);
        assert_eq!(stats.gcpy_count, 8);
        assert_eq!(stats.ngra_t, CELL * r(7));
    }

    #[test]
    fn null_snapshot() {
        let mut engine = HrmEngine::new();
        for _ in 0..2 {
            let stats = engine.process(None).unwrap();
            assert!(stats.dur.is_zero());
            assert!(stats.ngra_t.is_zero());
            assert_eq!(stats.gren_count, 0);
            assert_eq!(stats.gcpy_count, 0);
            assert_eq!(stats.nbg_total, 0);
            assert!(stats.is_empty);
        }
    }

    #[test]
    fn region_background() {
        let mut engine = HrmEngine::new();
        let p = element(ElementKind::P, ComputedStyle::default(), vec![span("abc")]);
        let isd = Isd {
            regions: vec![quarter_region("r1", Color::BLACK, vec![p])],
        };

        let stats = engine.process(Some(&isd)).unwrap();

        assert_eq!(stats.gren_count, 3);
        assert_eq!(stats.gcpy_count, 0);
        assert_eq!(stats.nbg_total, 1);
        assert_eq!(stats.dur, (r(1) + q(1, 4)) / BDRAW + CELL * r(3) / REN_G_OTHER);
    }

    #[test]
    fn same_char_different_color() {
        let red = ComputedStyle {
            color: Color::Rgba8([255, 0, 0, 255]),
            ..Default::default()
        };
        let mut engine = HrmEngine::new();
        let stats = engine
            .process(Some(&paragraph(vec![span("hel"), span_styled("lo", red)])))
            .unwrap();

        assert_eq!(stats.gren_count, 5);
        assert_eq!(stats.gcpy_count, 0);
        assert_eq!(stats.dur, r(1) / BDRAW + CELL * r(5) / REN_G_OTHER);
        assert_eq!(stats.ngra_t, CELL * r(5));
    }

    #[test]
    fn cjk() {
        let mut engine = HrmEngine::new();
        let stats = engine
            .process(Some(&paragraph(vec![span("你好"), span("你好")])))
            .unwrap();

        assert_eq!(stats.gren_count, 2);
        assert_eq!(stats.gcpy_count, 2);
        assert_eq!(stats.dur, r(1) / BDRAW + CELL * (r(2) / REN_G_CJK + r(2) / GCPY_OTHER));
        assert_eq!(stats.ngra_t, CELL * r(2));
    }

    #[test]
    fn complex_non_cjk() {
        let mut engine = HrmEngine::new();
        let stats = engine
            .process(Some(&paragraph(vec![span("Բարեւ"), span("Բարեւ")])))
            .unwrap();

        assert_eq!(stats.gren_count, 5);
        assert_eq!(stats.gcpy_count, 5);
        assert_eq!(stats.dur, r(1) / BDRAW + CELL * (r(5) / REN_G_OTHER + r(5) / GCPY_OTHER));
        assert_eq!(stats.ngra_t, CELL * r(5));
    }

    #[test]
    fn multiple_regions() {
        let p = || element(ElementKind::P, ComputedStyle::default(), vec![span("abc")]);
        let isd = Isd {
            regions: vec![
                quarter_region("r1", Color::BLACK, vec![p()]),
                quarter_region("r2", Color::Rgba8([255, 0, 0, 255]), vec![p()]),
                // Empty, but its background is shown.
                quarter_region("r3", Color::Rgba8([0, 0, 255, 255]), Vec::new()),
            ],
        };

        let stats = HrmEngine::new().process(Some(&isd)).unwrap();

        assert_eq!(stats.gren_count, 3);
        assert_eq!(stats.gcpy_count, 3);
        assert_eq!(stats.nbg_total, 3);
        assert_eq!(
            stats.dur,
            (r(1) + q(3, 4)) / BDRAW + CELL * (r(3) / REN_G_OTHER + r(3) / GCPY_BASE),
        );
        assert_eq!(stats.ngra_t, CELL * r(3));
    }

    #[test]
    fn nested_backgrounds() {
        let bg = |rgb: [u8; 3]| ComputedStyle {
            background_color: Some(Color::Rgba8([rgb[0], rgb[1], rgb[2], 255])),
            ..Default::default()
        };
        let p = element(
            ElementKind::P,
            bg([255, 255, 255]),
            vec![span_styled("hel", bg([0, 128, 0])), span_styled("lo", bg([128, 128, 128]))],
        );
        let div = element(ElementKind::Div, bg([0, 0, 0]), vec![p]);
        let body = element(ElementKind::Body, bg([0, 0, 255]), vec![div]);
        let isd = Isd {
            regions: vec![quarter_region("r1", Color::Rgba8([255, 0, 0, 255]), vec![body])],
        };

        let stats = HrmEngine::new().process(Some(&isd)).unwrap();

        // Each span has its own background, so the two 'l's are distinct glyphs.
        assert_eq!(stats.gren_count, 5);
        assert_eq!(stats.gcpy_count, 0);
        assert_eq!(stats.nbg_total, 6);
        assert_eq!(stats.dur, (r(1) + q(1, 4) * r(6)) / BDRAW + CELL * r(5) / REN_G_OTHER);
        assert_eq!(stats.ngra_t, CELL * r(5));
    }

    #[test]
    fn large_text_over_background() {
        let style = ComputedStyle {
            font_size: Length::rh(20),
            ..Default::default()
        };
        let text = IsdNode::Text("abcdefghijklmnopqrstuvwxy".into());
        let p = element(ElementKind::P, style, vec![text]);
        let isd = Isd {
            regions: vec![IsdRegion {
                background_color: Some(Color::BLACK),
                children: vec![p],
                ..IsdRegion::new("r1")
            }],
        };

        let stats = HrmEngine::new().process(Some(&isd)).unwrap();

        assert_eq!(stats.gren_count, 25);
        assert_eq!(stats.nbg_total, 1);
        assert_eq!(stats.dur, r(2) / BDRAW + q(1, 25) * r(25) / REN_G_OTHER);
        assert_eq!(stats.ngra_t, r(1));
    }

    #[test]
    fn glyph_areas_add_up_exactly() {
        // 100 distinct glyphs of 0.01 and 225 of 1/225 each fill the buffer exactly.
        let distinct = |n: u32| -> String {
            (0..n).filter_map(|i| char::from_u32(0x100 + i)).collect()
        };
        let style = ComputedStyle {
            font_size: Length::rh(10),
            ..Default::default()
        };

        let stats = HrmEngine::new()
            .process(Some(&paragraph(vec![span_styled(&distinct(100), style)])))
            .unwrap();
        assert_eq!(stats.gren_count, 100);
        assert_eq!(stats.ngra_t, r(1));

        let stats = HrmEngine::new()
            .process(Some(&paragraph(vec![span(&distinct(225))])))
            .unwrap();
        assert_eq!(stats.ngra_t, r(1));
    }

    #[test]
    fn failed_snapshot_keeps_the_buffer() {
        let mut engine = HrmEngine::new();
        engine.process(Some(&paragraph(vec![span("ab")]))).unwrap();

        let bad = ComputedStyle {
            font_size: Length::rw(5),
            ..Default::default()
        };
        assert!(engine.process(Some(&paragraph(vec![span_styled("c", bad)]))).is_err());
        assert_eq!(engine.back_buffer().len(), 2);
    }

    #[test]
    fn statistics_serialize_as_plain_numbers() {
        let mut engine = HrmEngine::new();
        let stats = engine.process(Some(&paragraph(vec![span("ab")]))).unwrap();

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["gren_count"], 2);
        assert_eq!(json["clear"], true);
        let ngra = json["ngra_t"].as_f64().unwrap();
        assert!((ngra - 2.0 / 225.0).abs() < 1e-12);
        assert!(json["dur"].is_f64());
    }
}
