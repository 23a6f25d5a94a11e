//! Drawing item definitions.
//!
//! Every item carries an explicit [`ItemKind`] discriminant; tags are an
//! auxiliary set used for cross-cutting grouping (selection, grid, no-save),
//! never for type identity. Geometry is an ordered point sequence in logical
//! canvas coordinates for every kind: two or more samples for strokes and
//! lines, two opposite corners for ovals and rectangles, a single anchor
//! point for text and images.

use crate::color::Color;
use crate::font::FontSpec;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Unique identifier for items. Allocated monotonically by the store and
/// never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// The logical kind of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Freehand polyline.
    Stroke,
    /// Committed straight or multi-point line.
    Line,
    Text,
    Oval,
    Rectangle,
    Image,
}

impl ItemKind {
    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Stroke => "stroke",
            ItemKind::Line => "line",
            ItemKind::Text => "text",
            ItemKind::Oval => "oval",
            ItemKind::Rectangle => "rectangle",
            ItemKind::Image => "image",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "stroke" => Some(ItemKind::Stroke),
            "line" => Some(ItemKind::Line),
            "text" => Some(ItemKind::Text),
            "oval" => Some(ItemKind::Oval),
            "rectangle" => Some(ItemKind::Rectangle),
            "image" => Some(ItemKind::Image),
            _ => None,
        }
    }

    /// True for the kinds sharing the polyline geometry representation.
    pub fn is_polyline(&self) -> bool {
        matches!(self, ItemKind::Stroke | ItemKind::Line)
    }
}

/// Grouping/filtering tags. Membership, not identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// Every persisted item carries this.
    All,
    /// Grid overlay lines.
    Grid,
    /// Excluded from serialization and hit-testing.
    NoSave,
    /// Ephemeral selection marker; cleared on every load, never serialized.
    Selected,
    /// Text items, for filtering.
    Text,
    /// Image items, for filtering.
    Image,
}

impl Tag {
    pub fn name(&self) -> &'static str {
        match self {
            Tag::All => "all",
            Tag::Grid => "grid",
            Tag::NoSave => "no_save",
            Tag::Selected => "selected",
            Tag::Text => "text",
            Tag::Image => "image",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "all" => Some(Tag::All),
            "grid" => Some(Tag::Grid),
            "no_save" => Some(Tag::NoSave),
            "selected" => Some(Tag::Selected),
            "text" => Some(Tag::Text),
            "image" => Some(Tag::Image),
            _ => None,
        }
    }
}

/// Nine-way compass anchor for text and image placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Anchor {
    #[default]
    Nw,
    N,
    Ne,
    W,
    Center,
    E,
    Sw,
    S,
    Se,
}

impl Anchor {
    pub fn name(&self) -> &'static str {
        match self {
            Anchor::Nw => "nw",
            Anchor::N => "n",
            Anchor::Ne => "ne",
            Anchor::W => "w",
            Anchor::Center => "center",
            Anchor::E => "e",
            Anchor::Sw => "sw",
            Anchor::S => "s",
            Anchor::Se => "se",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "nw" => Some(Anchor::Nw),
            "n" => Some(Anchor::N),
            "ne" => Some(Anchor::Ne),
            "w" => Some(Anchor::W),
            "center" => Some(Anchor::Center),
            "e" => Some(Anchor::E),
            "sw" => Some(Anchor::Sw),
            "s" => Some(Anchor::S),
            "se" => Some(Anchor::Se),
            _ => None,
        }
    }

    /// Fraction of the box width lying left of the anchor point.
    fn fx(&self) -> f64 {
        match self {
            Anchor::Nw | Anchor::W | Anchor::Sw => 0.0,
            Anchor::N | Anchor::Center | Anchor::S => 0.5,
            Anchor::Ne | Anchor::E | Anchor::Se => 1.0,
        }
    }

    /// Fraction of the box height lying above the anchor point.
    fn fy(&self) -> f64 {
        match self {
            Anchor::Nw | Anchor::N | Anchor::Ne => 0.0,
            Anchor::W | Anchor::Center | Anchor::E => 0.5,
            Anchor::Sw | Anchor::S | Anchor::Se => 1.0,
        }
    }

    /// Box of the given size anchored at `point`.
    pub fn rect_for(&self, point: Point, width: f64, height: f64) -> Rect {
        let x0 = point.x - width * self.fx();
        let y0 = point.y - height * self.fy();
        Rect::new(x0, y0, x0 + width, y0 + height)
    }
}

/// Line cap style for strokes and lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CapStyle {
    Butt,
    #[default]
    Round,
    Projecting,
}

impl CapStyle {
    pub fn name(&self) -> &'static str {
        match self {
            CapStyle::Butt => "butt",
            CapStyle::Round => "round",
            CapStyle::Projecting => "projecting",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "butt" => Some(CapStyle::Butt),
            "round" => Some(CapStyle::Round),
            "projecting" => Some(CapStyle::Projecting),
            _ => None,
        }
    }
}

/// Kind-specific style attributes. Which fields are meaningful for a given
/// kind is governed by the attribute table in [`crate::clipboard`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStyle {
    /// Drawn color: line color for strokes/lines, interior for shapes,
    /// glyph color for text.
    pub fill: Option<Color>,
    /// Border color for ovals and rectangles.
    pub outline: Option<Color>,
    /// Stroke width.
    pub width: f64,
    pub cap: CapStyle,
    /// Curve smoothing for strokes/lines.
    pub smooth: bool,
    pub font: Option<FontSpec>,
    /// Text content.
    pub text: Option<String>,
    pub anchor: Anchor,
    /// Source path for image items; a side channel that supports re-export
    /// and reload rather than a drawn attribute.
    pub image_path: Option<PathBuf>,
    /// Pixel dimensions probed when the image was inserted or reloaded.
    /// Runtime-only: never serialized, re-probed from `image_path` on load.
    #[serde(skip)]
    pub image_size: Option<(f64, f64)>,
}

impl Default for ItemStyle {
    fn default() -> Self {
        Self {
            fill: None,
            outline: None,
            width: 1.0,
            cap: CapStyle::default(),
            smooth: false,
            font: None,
            text: None,
            anchor: Anchor::default(),
            image_path: None,
            image_size: None,
        }
    }
}

/// A single addressable drawing primitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasItem {
    pub id: ItemId,
    pub kind: ItemKind,
    /// Geometry in logical canvas coordinates.
    pub points: Vec<Point>,
    pub style: ItemStyle,
    pub tags: BTreeSet<Tag>,
    /// Runtime-only visibility flag (text items hide while an inline edit
    /// surface covers them). Never serialized.
    #[serde(skip)]
    pub hidden: bool,
}

impl CanvasItem {
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_selected(&self) -> bool {
        self.has_tag(Tag::Selected)
    }

    /// Items excluded from serialization and from selection/eraser
    /// hit-testing.
    pub fn is_no_save(&self) -> bool {
        self.has_tag(Tag::NoSave)
    }

    /// Bounding box in logical coordinates, or `None` for an item with no
    /// geometry.
    pub fn bounds(&self) -> Option<Rect> {
        match self.kind {
            ItemKind::Text => {
                let anchor_point = *self.points.first()?;
                let (w, h) = self.text_extent();
                Some(self.style.anchor.rect_for(anchor_point, w, h))
            }
            ItemKind::Image => {
                let anchor_point = *self.points.first()?;
                let (w, h) = self.style.image_size.unwrap_or((0.0, 0.0));
                Some(self.style.anchor.rect_for(anchor_point, w, h))
            }
            _ => {
                let first = self.points.first()?;
                let mut rect = Rect::new(first.x, first.y, first.x, first.y);
                for p in &self.points[1..] {
                    rect = rect.union_pt(*p);
                }
                Some(rect)
            }
        }
    }

    /// Approximate text extent from content and font; the host toolkit owns
    /// exact metrics.
    fn text_extent(&self) -> (f64, f64) {
        let content = self.style.text.as_deref().unwrap_or("");
        let size = self.style.font.as_ref().map(|f| f.size).unwrap_or(12.0);
        let max_line_len = content.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        let mut line_count = content.lines().count().max(1);
        if content.ends_with('\n') {
            line_count += 1;
        }
        (
            (max_line_len as f64 * size * 0.55).max(size * 0.55),
            line_count as f64 * size * 1.2,
        )
    }

    /// Translate all geometry by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
    }

    /// Scale coordinates around a pivot. Coordinates only: stroke widths and
    /// font sizes are not rescaled.
    pub fn scale_about(&mut self, pivot: Point, factor: f64) {
        for p in &mut self.points {
            p.x = pivot.x + (p.x - pivot.x) * factor;
            p.y = pivot.y + (p.y - pivot.y) * factor;
        }
    }

    /// Whether this item overlaps a rectangular region (eraser test).
    pub fn overlaps_rect(&self, rect: Rect) -> bool {
        if self.kind.is_polyline() {
            return polyline_intersects_rect(&self.points, rect);
        }
        match self.bounds() {
            Some(b) => rect.intersect(b).area() > 0.0 || rect.contains(b.center()),
            None => false,
        }
    }

    /// Whether this item is geometrically enclosed by a rectangle
    /// (rubber-band test).
    pub fn enclosed_by(&self, rect: Rect) -> bool {
        match self.bounds() {
            Some(b) => b.x0 >= rect.x0 && b.y0 >= rect.y0 && b.x1 <= rect.x1 && b.y1 <= rect.y1,
            None => false,
        }
    }

    /// Distance from a point to this item; 0.0 when the point is on or
    /// inside it. Used to pick the nearest item under the pointer.
    pub fn distance_to(&self, point: Point) -> f64 {
        if self.kind.is_polyline() {
            return point_to_polyline_dist(point, &self.points);
        }
        match self.bounds() {
            Some(b) => {
                if b.contains(point) {
                    0.0
                } else {
                    let dx = (b.x0 - point.x).max(point.x - b.x1).max(0.0);
                    let dy = (b.y0 - point.y).max(point.y - b.y1).max(0.0);
                    (dx * dx + dy * dy).sqrt()
                }
            }
            None => f64::INFINITY,
        }
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let pv = Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    ((point.x - proj.x).powi(2) + (point.y - proj.y).powi(2)).sqrt()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    if points.len() == 1 {
        return Vec2::new(point.x - points[0].x, point.y - points[0].y).hypot();
    }
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Test whether any segment of a polyline crosses or lies inside a rectangle.
fn polyline_intersects_rect(points: &[Point], rect: Rect) -> bool {
    if points.iter().any(|p| rect.contains(*p)) {
        return true;
    }
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    let edges = [
        (corners[0], corners[1]),
        (corners[1], corners[2]),
        (corners[2], corners[3]),
        (corners[3], corners[0]),
    ];
    for w in points.windows(2) {
        for &(c, d) in &edges {
            if segments_intersect(w[0], w[1], c, d) {
                return true;
            }
        }
    }
    false
}

/// Test whether two line segments (a-b) and (c-d) intersect.
fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let cross =
        |o: Point, p: Point, q: Point| (p.x - o.x) * (q.y - o.y) - (p.y - o.y) * (q.x - o.x);
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    // Collinear cases: endpoint on the other segment
    let on_segment = |p: Point, q: Point, r: Point| {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    (d1.abs() < 1e-10 && on_segment(c, d, a))
        || (d2.abs() < 1e-10 && on_segment(c, d, b))
        || (d3.abs() < 1e-10 && on_segment(a, b, c))
        || (d4.abs() < 1e-10 && on_segment(a, b, d))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(points: Vec<Point>) -> CanvasItem {
        CanvasItem {
            id: ItemId(1),
            kind: ItemKind::Stroke,
            points,
            style: ItemStyle::default(),
            tags: BTreeSet::from([Tag::All]),
            hidden: false,
        }
    }

    #[test]
    fn test_kind_names_roundtrip() {
        for kind in [
            ItemKind::Stroke,
            ItemKind::Line,
            ItemKind::Text,
            ItemKind::Oval,
            ItemKind::Rectangle,
            ItemKind::Image,
        ] {
            assert_eq!(ItemKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ItemKind::from_name("polygon"), None);
    }

    #[test]
    fn test_polyline_bounds() {
        let item = stroke(vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 50.0),
            Point::new(50.0, 100.0),
        ]);
        let b = item.bounds().unwrap();
        assert!((b.x1 - 100.0).abs() < f64::EPSILON);
        assert!((b.y1 - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_text_bounds_honor_anchor() {
        let mut item = stroke(vec![Point::new(100.0, 100.0)]);
        item.kind = ItemKind::Text;
        item.style.text = Some("Hi".to_string());
        item.style.font = Some(FontSpec::new("Helvetica", 12.0));

        item.style.anchor = Anchor::Nw;
        let nw = item.bounds().unwrap();
        assert!((nw.x0 - 100.0).abs() < f64::EPSILON);
        assert!((nw.y0 - 100.0).abs() < f64::EPSILON);

        item.style.anchor = Anchor::Center;
        let centered = item.bounds().unwrap();
        assert!((centered.center().x - 100.0).abs() < 1e-9);
        assert!((centered.center().y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_about_pivot() {
        let mut item = stroke(vec![Point::new(60.0, 50.0), Point::new(70.0, 50.0)]);
        item.scale_about(Point::new(50.0, 50.0), 2.0);
        assert!((item.points[0].x - 70.0).abs() < f64::EPSILON);
        assert!((item.points[1].x - 90.0).abs() < f64::EPSILON);
        assert!((item.points[0].y - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scale_preserves_width() {
        let mut item = stroke(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        item.style.width = 3.0;
        item.scale_about(Point::ZERO, 4.0);
        assert!((item.style.width - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overlaps_rect_segment_crossing() {
        // Segment crosses the rect without either endpoint inside
        let item = stroke(vec![Point::new(-10.0, 5.0), Point::new(20.0, 5.0)]);
        assert!(item.overlaps_rect(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(!item.overlaps_rect(Rect::new(0.0, 20.0, 10.0, 30.0)));
    }

    #[test]
    fn test_enclosed_by() {
        let item = stroke(vec![Point::new(5.0, 5.0), Point::new(8.0, 8.0)]);
        assert!(item.enclosed_by(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(!item.enclosed_by(Rect::new(0.0, 0.0, 7.0, 10.0)));
    }

    #[test]
    fn test_distance_to_polyline() {
        let item = stroke(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
        assert!(item.distance_to(Point::new(50.0, 0.0)) < f64::EPSILON);
        assert!((item.distance_to(Point::new(50.0, 30.0)) - 30.0).abs() < 1e-9);
    }
}
