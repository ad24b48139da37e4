//! Document — the temporal snapshot provider.
//!
//! Resolves a [`SourceDocument`] into the [`Isd`] valid at a given instant:
//! inactive content is pruned, content is selected into regions and styles
//! are inherited down the tree.

pub mod source;

use crate::error::Result;
use crate::sequence::{DocumentModel, DocumentParser};
use crate::time::Time;
use crate::types::{ComputedStyle, ElementKind, Isd, IsdElement, IsdNode, IsdRegion};
use source::{SourceDocument, SourceElement, SourceNode, SourceRegion, StyleSpec, TaggedNode};

/// Id of the region synthesized for documents that declare none.
pub const DEFAULT_REGION_ID: &str = "default";

#[derive(Debug, Clone)]
pub struct CaptionDocument {
    regions: Vec<SourceRegion>,
    /// Content without a region goes to the default region.
    implicit_region: bool,
    body: Option<SourceElement>,
}

impl CaptionDocument {
    pub fn from_source(source: SourceDocument) -> Self {
        let implicit_region = source.regions.is_empty();
        let regions = if implicit_region {
            vec![SourceRegion {
                id: DEFAULT_REGION_ID.to_string(),
                extent: Default::default(),
                background_color: None,
                show_background: Default::default(),
                opacity: 1.0,
                display: Default::default(),
                visibility: Default::default(),
            }]
        } else {
            source.regions
        };
        CaptionDocument {
            regions,
            implicit_region,
            body: source.body,
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let source: SourceDocument = serde_json::from_str(text)?;
        Ok(Self::from_source(source))
    }

    fn selects(&self, region: &SourceRegion, associated: Option<&str>) -> bool {
        match associated {
            Some(id) => id == region.id,
            None => self.implicit_region,
        }
    }

    /// Prune `element` for `region` at `t`. Returns `None` when nothing of the
    /// element is shown in that region.
    fn resolve_element(
        &self,
        kind: ElementKind,
        element: &SourceElement,
        region: &SourceRegion,
        inherited_region: Option<&str>,
        parent_style: &ComputedStyle,
        t: Time,
    ) -> Option<IsdElement> {
        if !element.is_active_at(t) {
            return None;
        }

        let associated = element.region.as_deref().or(inherited_region);
        let selected = self.selects(region, associated);
        let style = compute_style(&element.style, parent_style);

        let mut children = Vec::new();
        for child in &element.children {
            let (kind, child) = match child {
                SourceNode::Text(text) => {
                    if selected {
                        children.push(IsdNode::Text(text.clone()));
                    }
                    continue;
                }
                SourceNode::Tagged(TaggedNode::Br(br)) => {
                    if selected && br.is_active_at(t) {
                        children.push(IsdNode::Br(compute_style(&br.style, &style)));
                    }
                    continue;
                }
                SourceNode::Tagged(TaggedNode::Div(e)) => (ElementKind::Div, e),
                SourceNode::Tagged(TaggedNode::P(e)) => (ElementKind::P, e),
                SourceNode::Tagged(TaggedNode::Span(e)) => (ElementKind::Span, e),
            };
            if let Some(resolved) = self.resolve_element(kind, child, region, associated, &style, t)
            {
                children.push(IsdNode::Element(resolved));
            }
        }

        // Containers left without content are not part of the snapshot.
        if children.is_empty() {
            return None;
        }

        Some(IsdElement {
            kind,
            style,
            children,
        })
    }

    fn collect_times(element: &SourceElement, times: &mut Vec<Time>) {
        times.extend(element.begin);
        times.extend(element.end);
        for child in &element.children {
            if let SourceNode::Tagged(
                TaggedNode::Div(e) | TaggedNode::P(e) | TaggedNode::Span(e) | TaggedNode::Br(e),
            ) = child
            {
                Self::collect_times(e, times);
            }
        }
    }
}

/// Inheritable properties come from the parent; background color does not
/// inherit.
fn compute_style(spec: &StyleSpec, parent: &ComputedStyle) -> ComputedStyle {
    ComputedStyle {
        color: spec.color.clone().unwrap_or_else(|| parent.color.clone()),
        background_color: spec.background_color.clone(),
        font_family: spec
            .font_family
            .clone()
            .unwrap_or_else(|| parent.font_family.clone()),
        font_size: spec.font_size.unwrap_or(parent.font_size),
        font_style: spec.font_style.unwrap_or(parent.font_style),
        font_weight: spec.font_weight.unwrap_or(parent.font_weight),
        text_decoration: spec.text_decoration.unwrap_or(parent.text_decoration),
        text_outline: spec
            .text_outline
            .clone()
            .or_else(|| parent.text_outline.clone()),
        text_shadow: spec
            .text_shadow
            .clone()
            .unwrap_or_else(|| parent.text_shadow.clone()),
    }
}

impl DocumentModel for CaptionDocument {
    fn significant_times(&self) -> Vec<Time> {
        let mut times = vec![Time::ZERO];
        if let Some(body) = &self.body {
            Self::collect_times(body, &mut times);
        }
        times.sort();
        times.dedup();
        times
    }

    fn isd_at(&self, t: Time) -> Isd {
        let initial = ComputedStyle::default();
        let regions = self
            .regions
            .iter()
            .map(|region| {
                let body = self.body.as_ref().and_then(|body| {
                    self.resolve_element(ElementKind::Body, body, region, None, &initial, t)
                });
                IsdRegion {
                    id: region.id.clone(),
                    extent: region.extent,
                    background_color: region.background_color.clone(),
                    show_background: region.show_background,
                    opacity: region.opacity,
                    display: region.display,
                    visibility: region.visibility,
                    children: body.map(IsdNode::Element).into_iter().collect(),
                }
            })
            .collect();
        Isd { regions }
    }
}

/// Parser for the JSON caption document format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDocumentParser;

impl DocumentParser for JsonDocumentParser {
    type Model = CaptionDocument;

    fn parse(&self, text: &str) -> Result<CaptionDocument> {
        CaptionDocument::parse(text)
    }
}
