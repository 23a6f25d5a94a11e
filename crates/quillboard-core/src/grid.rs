//! Grid overlay.
//!
//! Grid lines are ordinary line items tagged `Grid`+`NoSave`: invisible to
//! serialization, selection, and the eraser. Zoom changes regenerate them at
//! the new spacing instead of scaling their geometry, so they stay crisp.

use crate::camera::Camera;
use crate::color::Color;
use crate::item::{ItemKind, ItemStyle, Tag};
use crate::store::ItemStore;
use kurbo::Point;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GridSettings {
    pub enabled: bool,
    /// Spacing in logical units (multiplied by the zoom when drawn).
    pub spacing: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            spacing: 50.0,
        }
    }
}

/// Delete every grid line and, if the grid is enabled, redraw it across the
/// current scroll region at `spacing × zoom` intervals.
pub fn regenerate(store: &mut ItemStore, camera: &Camera, grid: &GridSettings) {
    for id in store.ids_with_tag(Tag::Grid) {
        store.remove(id);
    }
    if !grid.enabled {
        return;
    }

    let step = grid.spacing * camera.zoom;
    if step < 1e-3 {
        log::warn!("grid step {step} too small, skipping redraw");
        return;
    }

    let region = camera.scroll_region;
    let style = ItemStyle {
        fill: Some(Color::grid_gray()),
        width: 1.0,
        ..ItemStyle::default()
    };
    let tags = BTreeSet::from([Tag::Grid, Tag::NoSave]);

    let mut x = (region.x0 / step).ceil() * step;
    while x <= region.x1 {
        store.create_with_tags(
            ItemKind::Line,
            vec![Point::new(x, region.y0), Point::new(x, region.y1)],
            style.clone(),
            tags.clone(),
        );
        x += step;
    }
    let mut y = (region.y0 / step).ceil() * step;
    while y <= region.y1 {
        store.create_with_tags(
            ItemKind::Line,
            vec![Point::new(region.x0, y), Point::new(region.x1, y)],
            style.clone(),
            tags.clone(),
        );
        y += step;
    }
}
