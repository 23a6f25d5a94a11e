//! Document payload codec.
//!
//! The payload is `{items, camera}`; geometry is written normalized by the
//! current zoom so persisted coordinates are zoom-independent, and load
//! re-applies the saved zoom as one absolute scaling pass. Loading is
//! default-filling throughout: partial or older payloads degrade to empty
//! values, unrecognized kinds are skipped entry by entry, and nothing here
//! aborts. Schema validation belongs to upstream collaborators.

use crate::camera::Camera;
use crate::clipboard::{StyleAttr, allowed_attributes};
use crate::item::{Anchor, CanvasItem, CapStyle, ItemId, ItemKind, ItemStyle, Tag};
use crate::store::ItemStore;
use crate::{color::Color, font::FontSpec};
use kurbo::Point;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

/// Serialize the persisted document (everything not tagged `no_save`).
pub fn serialize(store: &ItemStore, camera: &Camera) -> Value {
    let zoom = camera.zoom;
    let items: Vec<Value> = store
        .iter()
        .filter(|item| !item.is_no_save())
        .map(|item| item_to_value(item, zoom))
        .collect();
    json!({
        "items": items,
        "camera": {
            "zoom": zoom,
            "viewport_x": [camera.viewport_x.0, camera.viewport_x.1],
            "viewport_y": [camera.viewport_y.0, camera.viewport_y.1],
        }
    })
}

fn item_to_value(item: &CanvasItem, zoom: f64) -> Value {
    let geometry: Vec<f64> = item
        .points
        .iter()
        .flat_map(|p| [p.x / zoom, p.y / zoom])
        .collect();

    let mut style = serde_json::Map::new();
    for attr in allowed_attributes(item.kind) {
        match attr {
            StyleAttr::Fill => {
                if let Some(fill) = item.style.fill {
                    style.insert("fill".into(), json!(fill.to_hex()));
                }
            }
            StyleAttr::Outline => {
                if let Some(outline) = item.style.outline {
                    style.insert("outline".into(), json!(outline.to_hex()));
                }
            }
            StyleAttr::Width => {
                style.insert("width".into(), json!(item.style.width));
            }
            StyleAttr::Cap => {
                style.insert("cap".into(), json!(item.style.cap.name()));
            }
            StyleAttr::Smooth => {
                style.insert("smooth".into(), json!(item.style.smooth));
            }
            StyleAttr::Font => {
                if let Some(font) = &item.style.font {
                    style.insert("font".into(), json!(font.descriptor()));
                }
            }
            StyleAttr::Text => {
                if let Some(text) = &item.style.text {
                    style.insert("text".into(), json!(text));
                }
            }
            StyleAttr::Anchor => {
                style.insert("anchor".into(), json!(item.style.anchor.name()));
            }
            StyleAttr::ImagePath => {
                if let Some(path) = &item.style.image_path {
                    style.insert("image_path".into(), json!(path.to_string_lossy()));
                }
            }
        }
    }

    // Tags are persisted for filtering; the ephemeral selection marker is not
    let tags: Vec<&str> = item
        .tags
        .iter()
        .filter(|t| !matches!(t, Tag::Selected))
        .map(|t| t.name())
        .collect();
    style.insert("tags".into(), json!(tags));

    json!({
        "kind": item.kind.name(),
        "geometry": geometry,
        "style": Value::Object(style),
    })
}

/// Load a payload into the store and camera: clears current items, recreates
/// each through the kind-keyed dispatch, re-applies tag `all`, resets zoom
/// to 1.0, re-applies the saved zoom absolutely, then restores the viewport
/// fractions. Selection never survives: the `selected` tag is not part of
/// the persisted payload and is dropped if present.
pub fn load_into(store: &mut ItemStore, camera: &mut Camera, data: &Value) {
    store.clear();

    let items = data
        .get("items")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    for entry in &items {
        let kind_name = entry.get("kind").and_then(|k| k.as_str()).unwrap_or("");
        let Some(kind) = ItemKind::from_name(kind_name) else {
            log::warn!("skipping item with unrecognized kind {kind_name:?}");
            continue;
        };
        let points = parse_geometry(entry.get("geometry"));
        let style = parse_style(entry.get("style"));
        let Some(id) = instantiate(store, kind, points, style) else {
            log::warn!("skipping malformed {kind_name} item");
            continue;
        };
        apply_persisted_tags(store, id, entry.get("style").and_then(|s| s.get("tags")));
    }

    let cam = data.get("camera");
    let zoom = cam
        .and_then(|c| c.get("zoom"))
        .and_then(|z| z.as_f64())
        .filter(|z| *z > 0.0)
        .unwrap_or(1.0);

    camera.set_zoom(1.0);
    if (zoom - 1.0).abs() > f64::EPSILON {
        for item in store.iter_mut() {
            item.scale_about(Point::ZERO, zoom);
        }
    }
    camera.set_zoom(zoom);

    let viewport_x = parse_fraction_range(cam.and_then(|c| c.get("viewport_x")));
    let viewport_y = parse_fraction_range(cam.and_then(|c| c.get("viewport_y")));
    camera.recompute_scroll_region(store.content_bounds());
    camera.set_viewport(viewport_x, viewport_y);
}

/// Kind-keyed item construction, shared by document load and paste. Stroke
/// and line use the same polyline path; a malformed entry yields `None` and
/// the caller skips it.
pub(crate) fn instantiate(
    store: &mut ItemStore,
    kind: ItemKind,
    points: Vec<Point>,
    mut style: ItemStyle,
) -> Option<ItemId> {
    match kind {
        ItemKind::Stroke | ItemKind::Line => {
            if points.len() < 2 {
                return None;
            }
        }
        ItemKind::Oval | ItemKind::Rectangle => {
            if points.len() < 2 {
                return None;
            }
        }
        ItemKind::Text => {
            if points.is_empty() {
                return None;
            }
        }
        ItemKind::Image => {
            if points.is_empty() {
                return None;
            }
            let path = style.image_path.clone()?;
            if style.image_size.is_none() {
                style.image_size = probe_image_size(&path);
            }
        }
    }
    Some(store.create(kind, points, style))
}

/// Read pixel dimensions from an image file header. Failures are logged and
/// reported as `None`; callers decide whether that kills the item.
pub(crate) fn probe_image_size(path: &Path) -> Option<(f64, f64)> {
    match image::image_dimensions(path) {
        Ok((w, h)) => Some((w as f64, h as f64)),
        Err(e) => {
            log::warn!("cannot read image {}: {e}", path.display());
            None
        }
    }
}

fn parse_geometry(value: Option<&Value>) -> Vec<Point> {
    let coords: Vec<f64> = value
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|n| n.as_f64()).collect())
        .unwrap_or_default();
    coords
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

fn parse_style(value: Option<&Value>) -> ItemStyle {
    let get = |key: &str| value.and_then(|s| s.get(key));
    ItemStyle {
        fill: get("fill").and_then(|v| v.as_str()).map(Color::parse),
        outline: get("outline").and_then(|v| v.as_str()).map(Color::parse),
        width: get("width").and_then(|v| v.as_f64()).unwrap_or(1.0),
        cap: get("cap")
            .and_then(|v| v.as_str())
            .and_then(CapStyle::from_name)
            .unwrap_or_default(),
        smooth: get("smooth").and_then(|v| v.as_bool()).unwrap_or(false),
        font: get("font").and_then(|v| v.as_str()).map(FontSpec::parse),
        text: get("text")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        anchor: get("anchor")
            .and_then(|v| v.as_str())
            .and_then(Anchor::from_name)
            .unwrap_or_default(),
        image_path: get("image_path")
            .and_then(|v| v.as_str())
            .map(PathBuf::from),
        image_size: None,
    }
}

fn apply_persisted_tags(store: &mut ItemStore, id: ItemId, tags: Option<&Value>) {
    let Some(item) = store.get_mut(id) else { return };
    if let Some(names) = tags.and_then(|t| t.as_array()) {
        for name in names.iter().filter_map(|n| n.as_str()) {
            if let Some(tag) = Tag::from_name(name) {
                // Ephemeral and overlay tags never come back from a payload
                if !matches!(tag, Tag::Selected | Tag::NoSave | Tag::Grid) {
                    item.tags.insert(tag);
                }
            }
        }
    }
    item.tags.insert(Tag::All);
}

fn parse_fraction_range(value: Option<&Value>) -> (f64, f64) {
    value
        .and_then(|v| v.as_array())
        .and_then(|arr| {
            let a = arr.first().and_then(|n| n.as_f64())?;
            let b = arr.get(1).and_then(|n| n.as_f64())?;
            Some((a, b))
        })
        .unwrap_or((0.0, 1.0))
}
