//! Selection clipboard.
//!
//! Entries store geometry relative to the source selection's bounding-box
//! origin so a paste can target any new anchor, and only the whitelisted
//! style attributes for the entry's kind, so stale attributes from a
//! previous tool configuration never leak into a later paste.

use crate::item::{CanvasItem, ItemKind, ItemStyle};
use kurbo::Point;

/// A single style attribute, for the per-kind whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleAttr {
    Fill,
    Outline,
    Width,
    Cap,
    Smooth,
    Font,
    Text,
    Anchor,
    ImagePath,
}

/// Explicit kind → allowed-attributes table, shared by clipboard capture and
/// the serialization codec. A kind absent from the table captures nothing.
pub fn allowed_attributes(kind: ItemKind) -> &'static [StyleAttr] {
    use StyleAttr::*;
    match kind {
        ItemKind::Stroke | ItemKind::Line => &[Fill, Width, Cap, Smooth],
        ItemKind::Text => &[Fill, Font, Text, Anchor],
        ItemKind::Oval | ItemKind::Rectangle => &[Fill, Outline, Width],
        ItemKind::Image => &[Anchor, ImagePath],
    }
}

/// Copy only the whitelisted attributes of `style` for `kind`; everything
/// else stays at its default.
pub fn style_subset(style: &ItemStyle, kind: ItemKind) -> ItemStyle {
    let mut out = ItemStyle::default();
    for attr in allowed_attributes(kind) {
        match attr {
            StyleAttr::Fill => out.fill = style.fill,
            StyleAttr::Outline => out.outline = style.outline,
            StyleAttr::Width => out.width = style.width,
            StyleAttr::Cap => out.cap = style.cap,
            StyleAttr::Smooth => out.smooth = style.smooth,
            StyleAttr::Font => out.font = style.font.clone(),
            StyleAttr::Text => out.text = style.text.clone(),
            StyleAttr::Anchor => out.anchor = style.anchor,
            StyleAttr::ImagePath => {
                out.image_path = style.image_path.clone();
                // The probed size travels with the path
                out.image_size = style.image_size;
            }
        }
    }
    out
}

/// One copied item, geometry relative to the selection bbox origin.
#[derive(Debug, Clone)]
pub struct ClipboardEntry {
    pub kind: ItemKind,
    pub points: Vec<Point>,
    pub style: ItemStyle,
}

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    entries: Vec<ClipboardEntry>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ClipboardEntry] {
        &self.entries
    }

    /// Replace the clipboard contents with the given items, re-basing
    /// geometry onto `origin` (the selection bbox top-left corner).
    pub fn capture<'a>(&mut self, items: impl Iterator<Item = &'a CanvasItem>, origin: Point) {
        self.entries = items
            .map(|item| ClipboardEntry {
                kind: item.kind,
                points: item
                    .points
                    .iter()
                    .map(|p| Point::new(p.x - origin.x, p.y - origin.y))
                    .collect(),
                style: style_subset(&item.style, item.kind),
            })
            .collect();
    }
}
