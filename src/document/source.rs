//! Source document types — the authored caption format.
//!
//! These types describe *what is shown when*: regions, and a body tree of
//! timed, styled content. The provider resolves them into one [`Isd`] per
//! instant.
//!
//! [`Isd`]: crate::types::Isd

use serde::Deserialize;

use crate::time::Time;
use crate::types::{
    Color, Display, Extent, FontStyle, FontWeight, Length, ShowBackground, TextDecoration,
    TextOutline, TextShadow, Visibility,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    #[serde(default)]
    pub regions: Vec<SourceRegion>,
    #[serde(default)]
    pub body: Option<SourceElement>,
}

fn default_opacity() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRegion {
    pub id: String,
    #[serde(default)]
    pub extent: Extent,
    #[serde(default)]
    pub background_color: Option<Color>,
    #[serde(default)]
    pub show_background: ShowBackground,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub display: Display,
    #[serde(default)]
    pub visibility: Visibility,
}

/// Style properties as authored. `None` means "not specified here".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleSpec {
    pub color: Option<Color>,
    pub background_color: Option<Color>,
    pub font_family: Option<Vec<String>>,
    pub font_size: Option<Length>,
    pub font_style: Option<FontStyle>,
    pub font_weight: Option<FontWeight>,
    pub text_decoration: Option<TextDecoration>,
    pub text_outline: Option<TextOutline>,
    pub text_shadow: Option<Vec<TextShadow>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceElement {
    #[serde(default)]
    pub region: Option<String>,
    /// Absolute document time at which the element becomes active.
    #[serde(default)]
    pub begin: Option<Time>,
    /// Absolute document time at which the element stops being active.
    #[serde(default)]
    pub end: Option<Time>,
    #[serde(flatten)]
    pub style: StyleSpec,
    #[serde(default)]
    pub children: Vec<SourceNode>,
}

impl SourceElement {
    pub fn is_active_at(&self, t: Time) -> bool {
        self.begin.is_none_or(|b| b <= t) && self.end.is_none_or(|e| t < e)
    }
}

/// A child of a content element. Plain JSON strings are character data.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SourceNode {
    Text(String),
    Tagged(TaggedNode),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaggedNode {
    Div(SourceElement),
    P(SourceElement),
    Span(SourceElement),
    Br(SourceElement),
}
