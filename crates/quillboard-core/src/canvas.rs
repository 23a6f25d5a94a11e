//! Canvas document and state management.

use crate::camera::Camera;
use crate::clipboard::{Clipboard, ClipboardEntry};
use crate::codec;
use crate::color::Color;
use crate::font::FontSpec;
use crate::grid::{self, GridSettings};
use crate::history::{Document, UndoManager, UndoObserver};
use crate::item::{Anchor, CanvasItem, ItemId, ItemKind, ItemStyle, Tag};
use crate::store::{ItemSelector, ItemStore};
use crate::tools::{Gesture, GesturePreview, MAX_STROKE_POINTS, ToolKind};
use kurbo::{Point, Rect};
use serde_json::Value;
use std::path::Path;
use uuid::Uuid;

/// The document: item store, camera, and grid settings. This is the object
/// the undo manager sees through the [`Document`] trait.
#[derive(Debug, Clone)]
pub struct DocumentState {
    /// Runtime identity, used as the default storage key. Not part of the
    /// document payload.
    pub id: String,
    pub name: String,
    pub store: ItemStore,
    pub camera: Camera,
    pub grid: GridSettings,
}

impl Default for DocumentState {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            store: ItemStore::new(),
            camera: Camera::new(),
            grid: GridSettings::default(),
        }
    }

    /// Redraw the grid overlay for the current camera.
    pub fn regenerate_grid(&mut self) {
        grid::regenerate(&mut self.store, &self.camera, &self.grid);
    }
}

impl Document for DocumentState {
    fn serialize(&self) -> Value {
        codec::serialize(&self.store, &self.camera)
    }

    fn load(&mut self, data: &Value, _internal: bool) {
        // No history is recorded here; Canvas layers the automatic post-load
        // snapshot on top and suppresses it when `internal` is set.
        codec::load_into(&mut self.store, &mut self.camera, data);
        self.regenerate_grid();
    }
}

/// Active tool attributes applied to newly created items.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub pencil_color: Color,
    pub pencil_width: f64,
    /// Side of the square eraser region.
    pub eraser_width: f64,
    pub line_color: Color,
    pub line_width: f64,
    pub text_color: Color,
    pub font: FontSpec,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            pencil_color: Color::black(),
            pencil_width: 2.0,
            eraser_width: 20.0,
            line_color: Color::black(),
            line_width: 2.0,
            text_color: Color::black(),
            font: FontSpec::default(),
        }
    }
}

/// Requests the canvas hands back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// The text tool wants a modal prompt; the host answers with
    /// [`Canvas::commit_text`].
    TextPrompt { position: Point },
}

/// What the host needs to place an inline text editor over an item.
#[derive(Debug, Clone)]
pub struct TextEditInfo {
    pub id: ItemId,
    pub text: String,
    pub bounds: Rect,
}

#[derive(Debug, Clone)]
struct ActiveTextEdit {
    id: ItemId,
    original: String,
}

/// The drawing canvas: document, history, tool state, and clipboard.
#[derive(Debug)]
pub struct Canvas {
    doc: DocumentState,
    history: UndoManager,
    tool: ToolKind,
    gesture: Gesture,
    clipboard: Clipboard,
    pub settings: ToolSettings,
    text_edit: Option<ActiveTextEdit>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create an empty canvas with a baseline undo snapshot already in
    /// place, so the first undo returns to the empty document.
    pub fn new() -> Self {
        let doc = DocumentState::new();
        let mut history = UndoManager::new();
        history.clear(&doc);
        Self {
            doc,
            history,
            tool: ToolKind::default(),
            gesture: Gesture::Idle,
            clipboard: Clipboard::new(),
            settings: ToolSettings::default(),
            text_edit: None,
        }
    }

    pub fn document(&self) -> &DocumentState {
        &self.doc
    }

    pub fn items(&self) -> impl Iterator<Item = &CanvasItem> {
        self.doc.store.iter()
    }

    pub fn get_zoom(&self) -> f64 {
        self.doc.camera.zoom
    }

    pub fn get_selected_items(&self) -> Vec<ItemId> {
        self.doc.store.ids_with_tag(Tag::Selected)
    }

    /// Register the host callback invoked with `(can_undo, can_redo)` after
    /// every history change.
    pub fn on_undo_redo_update(&mut self, observer: UndoObserver) {
        self.history.set_observer(observer);
    }

    // ------------------------------------------------------------------
    // Tools

    /// Switch tools. Explicit only: never pointer-triggered. Any in-flight
    /// gesture is discarded.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
        self.gesture = Gesture::Idle;
    }

    /// Switch tools by name. Unknown names are ignored with no state change.
    pub fn set_tool_named(&mut self, name: &str) {
        match ToolKind::from_name(name) {
            Some(tool) => self.set_tool(tool),
            None => log::debug!("ignoring unknown tool name {name:?}"),
        }
    }

    pub fn get_tool(&self) -> ToolKind {
        self.tool
    }

    pub fn get_tool_name(&self) -> &'static str {
        self.tool.name()
    }

    /// Non-persisted visual feedback for the renderer.
    pub fn gesture_preview(&self) -> Option<GesturePreview> {
        self.gesture.preview()
    }

    // ------------------------------------------------------------------
    // Pointer gesture phases

    /// Pointer down in device coordinates. `modifier` is the selection
    /// modifier key.
    pub fn pointer_down(
        &mut self,
        device_x: f64,
        device_y: f64,
        modifier: bool,
    ) -> Option<CanvasEvent> {
        let p = self.doc.camera.to_logical(device_x, device_y);
        match self.tool {
            ToolKind::Pencil => {
                self.gesture = Gesture::Pencil { points: vec![p] };
                None
            }
            ToolKind::Eraser => {
                let erased_any = self.erase_at(p);
                self.gesture = Gesture::Eraser { erased_any };
                None
            }
            ToolKind::Line => {
                self.gesture = Gesture::Line {
                    anchor: p,
                    current: p,
                };
                None
            }
            ToolKind::Text => Some(CanvasEvent::TextPrompt { position: p }),
            ToolKind::Select => {
                if modifier {
                    self.toggle_nearest(p);
                } else {
                    self.gesture = Gesture::RubberBand {
                        anchor: p,
                        current: p,
                    };
                }
                None
            }
        }
    }

    /// Pointer moved while down.
    pub fn pointer_drag(&mut self, device_x: f64, device_y: f64) {
        let p = self.doc.camera.to_logical(device_x, device_y);
        if matches!(self.gesture, Gesture::Eraser { .. }) {
            let erased = self.erase_at(p);
            if let Gesture::Eraser { erased_any } = &mut self.gesture {
                *erased_any |= erased;
            }
            return;
        }
        match &mut self.gesture {
            Gesture::Pencil { points } => {
                // Samples beyond the cap are dropped; tracking continues
                if points.len() < MAX_STROKE_POINTS {
                    points.push(p);
                }
            }
            Gesture::Line { current, .. } | Gesture::RubberBand { current, .. } => {
                *current = p;
            }
            Gesture::Idle | Gesture::Eraser { .. } => {}
        }
    }

    /// Pointer up: finalize or discard the gesture. A tool switch
    /// mid-gesture leaves `Idle` here, so a stale stop discards silently.
    pub fn pointer_up(&mut self, device_x: f64, device_y: f64) {
        let p = self.doc.camera.to_logical(device_x, device_y);
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => {}
            Gesture::Pencil { points } => self.finish_stroke(points),
            Gesture::Eraser { erased_any } => {
                if erased_any {
                    self.after_mutation();
                }
            }
            Gesture::Line { anchor, .. } => {
                let style = ItemStyle {
                    fill: Some(self.settings.line_color),
                    width: self.settings.line_width,
                    ..ItemStyle::default()
                };
                self.doc.store.create(ItemKind::Line, vec![anchor, p], style);
                self.after_mutation();
            }
            Gesture::RubberBand { anchor, .. } => {
                self.select_enclosed(Rect::from_points(anchor, p));
            }
        }
    }

    fn finish_stroke(&mut self, points: Vec<Point>) {
        if points.len() <= 1 {
            // Click without drag: a filled dot of pencil-width diameter
            let Some(center) = points.first().copied() else {
                return;
            };
            let r = self.settings.pencil_width / 2.0;
            let style = ItemStyle {
                fill: Some(self.settings.pencil_color),
                ..ItemStyle::default()
            };
            self.doc.store.create(
                ItemKind::Oval,
                vec![
                    Point::new(center.x - r, center.y - r),
                    Point::new(center.x + r, center.y + r),
                ],
                style,
            );
        } else {
            let style = ItemStyle {
                fill: Some(self.settings.pencil_color),
                width: self.settings.pencil_width,
                smooth: true,
                ..ItemStyle::default()
            };
            self.doc.store.create(ItemKind::Stroke, points, style);
        }
        self.after_mutation();
    }

    /// Delete every non-`no_save` item overlapping the square eraser region
    /// centered at `p`. Returns whether anything was deleted.
    fn erase_at(&mut self, p: Point) -> bool {
        let half = self.settings.eraser_width / 2.0;
        let region = Rect::new(p.x - half, p.y - half, p.x + half, p.y + half);
        let victims: Vec<ItemId> = self
            .doc
            .store
            .iter()
            .filter(|item| !item.is_no_save() && item.overlaps_rect(region))
            .map(|item| item.id)
            .collect();
        let erased = !victims.is_empty();
        for id in victims {
            self.remove_item(id);
        }
        erased
    }

    fn remove_item(&mut self, id: ItemId) {
        if let Some(item) = self.doc.store.remove(id) {
            if item.kind == ItemKind::Image {
                if let Some(path) = &item.style.image_path {
                    log::debug!("released image backing {}", path.display());
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Selection

    fn toggle_nearest(&mut self, p: Point) {
        let mut best: Option<(f64, ItemId)> = None;
        for item in self
            .doc
            .store
            .iter()
            .filter(|i| !i.is_no_save() && !i.hidden)
        {
            let d = item.distance_to(p);
            if best.map(|(bd, _)| d < bd).unwrap_or(true) {
                best = Some((d, item.id));
            }
        }
        if let Some((_, id)) = best {
            if let Some(item) = self.doc.store.get_mut(id) {
                if !item.tags.remove(&Tag::Selected) {
                    item.tags.insert(Tag::Selected);
                }
            }
        }
    }

    /// Replace the selection with every item geometrically enclosed by the
    /// rectangle, excluding `no_save` items. Selection is ephemeral: no
    /// snapshot.
    fn select_enclosed(&mut self, rect: Rect) {
        self.clear_selection();
        for item in self.doc.store.iter_mut() {
            if !item.is_no_save() && item.enclosed_by(rect) {
                item.tags.insert(Tag::Selected);
            }
        }
    }

    pub fn clear_selection(&mut self) {
        for item in self.doc.store.iter_mut() {
            item.tags.remove(&Tag::Selected);
        }
    }

    // ------------------------------------------------------------------
    // Clipboard

    /// Copy the selection: geometry relative to the selection bbox origin,
    /// styles whitelisted per kind. No-op (no clipboard mutation) when the
    /// selection is empty.
    pub fn copy(&mut self) {
        let selector = ItemSelector::Tag(Tag::Selected);
        let Some(bbox) = self.doc.store.bounding_box(&selector) else {
            return;
        };
        let origin = Point::new(bbox.x0, bbox.y0);
        self.clipboard.capture(
            self.doc.store.iter().filter(|i| i.is_selected()),
            origin,
        );
    }

    /// Paste at the center of the visible viewport. Freshly created items
    /// become the new selection; exactly one snapshot per batch. No-op when
    /// the clipboard is empty.
    pub fn paste(&mut self) {
        if self.clipboard.is_empty() {
            return;
        }
        let anchor = self.doc.camera.visible_center();
        self.clear_selection();
        let entries: Vec<ClipboardEntry> = self.clipboard.entries().to_vec();
        let mut created_any = false;
        for entry in entries {
            let points = entry
                .points
                .iter()
                .map(|p| Point::new(anchor.x + p.x, anchor.y + p.y))
                .collect();
            match codec::instantiate(&mut self.doc.store, entry.kind, points, entry.style) {
                Some(id) => {
                    if let Some(item) = self.doc.store.get_mut(id) {
                        item.tags.insert(Tag::Selected);
                    }
                    created_any = true;
                }
                None => log::warn!("skipping unpasteable {} entry", entry.kind.name()),
            }
        }
        if created_any {
            self.after_mutation();
        }
    }

    /// Delete all selected items in one batch with one snapshot.
    pub fn delete_selection(&mut self) {
        let ids = self.doc.store.ids_with_tag(Tag::Selected);
        if ids.is_empty() {
            return;
        }
        for id in ids {
            self.remove_item(id);
        }
        self.after_mutation();
    }

    /// Remove every persisted item in one batch with one snapshot. Grid
    /// lines are untouched.
    pub fn clear_all(&mut self) {
        let ids = self.doc.store.ids_with_tag(Tag::All);
        if ids.is_empty() {
            return;
        }
        for id in ids {
            self.remove_item(id);
        }
        self.after_mutation();
    }

    /// Translate all selected items: one snapshot per completed move.
    pub fn move_selection(&mut self, dx: f64, dy: f64) {
        let ids = self.doc.store.ids_with_tag(Tag::Selected);
        if ids.is_empty() {
            return;
        }
        for id in ids {
            if let Some(item) = self.doc.store.get_mut(id) {
                item.translate(dx, dy);
            }
        }
        self.after_mutation();
    }

    // ------------------------------------------------------------------
    // Text

    /// Place a text item at `position` (the answer to a
    /// [`CanvasEvent::TextPrompt`]). The current font is scaled to
    /// compensate for the current zoom. Empty content creates nothing.
    pub fn commit_text(&mut self, position: Point, content: &str) -> Option<ItemId> {
        if content.is_empty() {
            return None;
        }
        let style = ItemStyle {
            fill: Some(self.settings.text_color),
            font: Some(self.settings.font.scaled(self.doc.camera.zoom)),
            text: Some(content.to_string()),
            anchor: Anchor::Nw,
            ..ItemStyle::default()
        };
        let id = self.doc.store.create(ItemKind::Text, vec![position], style);
        self.after_mutation();
        Some(id)
    }

    /// Start the inline edit path (double-click on a text item): the item is
    /// hidden while the host positions its edit surface over `bounds`.
    pub fn begin_text_edit(&mut self, id: ItemId) -> Option<TextEditInfo> {
        if self.text_edit.is_some() {
            return None;
        }
        let item = self.doc.store.get(id)?;
        if item.kind != ItemKind::Text {
            return None;
        }
        let text = item.style.text.clone().unwrap_or_default();
        let bounds = item.bounds()?;
        self.doc.store.get_mut(id)?.hidden = true;
        self.text_edit = Some(ActiveTextEdit {
            id,
            original: text.clone(),
        });
        Some(TextEditInfo { id, text, bounds })
    }

    /// Commit the inline edit (confirm or focus loss): replace the item's
    /// text and restore visibility. Snapshot dedup makes an unchanged commit
    /// a no-op.
    pub fn commit_text_edit(&mut self, new_text: &str) {
        let Some(edit) = self.text_edit.take() else {
            return;
        };
        if let Some(item) = self.doc.store.get_mut(edit.id) {
            item.style.text = Some(new_text.to_string());
            item.hidden = false;
        }
        self.save_state();
    }

    /// Abandon the inline edit: the original text comes back unmodified.
    pub fn cancel_text_edit(&mut self) {
        let Some(edit) = self.text_edit.take() else {
            return;
        };
        if let Some(item) = self.doc.store.get_mut(edit.id) {
            item.style.text = Some(edit.original);
            item.hidden = false;
        }
    }

    // ------------------------------------------------------------------
    // Images

    /// Insert an image item anchored at `position`. An unreadable or
    /// unsupported file is logged and swallowed: no item, no snapshot.
    pub fn insert_image(&mut self, path: &Path, position: Point) -> Option<ItemId> {
        let size = codec::probe_image_size(path)?;
        let style = ItemStyle {
            image_path: Some(path.to_path_buf()),
            image_size: Some(size),
            ..ItemStyle::default()
        };
        let id = self.doc.store.create(ItemKind::Image, vec![position], style);
        self.after_mutation();
        Some(id)
    }

    // ------------------------------------------------------------------
    // Transform

    /// Scale matching items around a pivot and multiply the stored zoom.
    /// Coordinates only: widths and font sizes stay. Non-positive factors
    /// are a guarded no-op. The grid is redrawn (spacing is logical) and the
    /// scroll region recomputed.
    pub fn scale(&mut self, selector: &ItemSelector, pivot_x: f64, pivot_y: f64, factor: f64) {
        if factor <= 0.0 {
            log::warn!("ignoring non-positive scale factor {factor}");
            return;
        }
        let pivot = Point::new(pivot_x, pivot_y);
        for item in self.doc.store.iter_mut() {
            if selector.matches(item) {
                item.scale_about(pivot, factor);
            }
        }
        self.doc.camera.zoom_by(factor);
        self.doc
            .camera
            .recompute_scroll_region(self.doc.store.content_bounds());
        self.doc.regenerate_grid();
    }

    pub fn bounding_box(&self, selector: &ItemSelector) -> Option<Rect> {
        self.doc.store.bounding_box(selector)
    }

    // ------------------------------------------------------------------
    // Grid

    pub fn set_grid_enabled(&mut self, enabled: bool) {
        self.doc.grid.enabled = enabled;
        self.doc.regenerate_grid();
    }

    pub fn set_grid_spacing(&mut self, spacing: f64) {
        if spacing > 0.0 {
            self.doc.grid.spacing = spacing;
            self.doc.regenerate_grid();
        }
    }

    // ------------------------------------------------------------------
    // History and persistence

    /// Snapshot the current document (content-equality deduped).
    pub fn save_state(&mut self) {
        self.history.save_state(&self.doc);
    }

    pub fn undo(&mut self) -> bool {
        self.abort_interactions();
        self.history.undo(&mut self.doc)
    }

    pub fn redo(&mut self) -> bool {
        self.abort_interactions();
        self.history.redo(&mut self.doc)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Snapshot count currently on the undo stack.
    pub fn undo_stack_len(&self) -> usize {
        self.history.len()
    }

    /// Drop all history and re-establish a baseline snapshot of the current
    /// document (used when starting over on a fresh document).
    pub fn clear_history(&mut self) {
        self.history.clear(&self.doc);
    }

    pub fn serialize(&self) -> Value {
        self.doc.serialize()
    }

    /// Load a document payload. `internal` suppresses the automatic
    /// post-load snapshot; top-level loads pass `false`.
    pub fn load(&mut self, data: &Value, internal: bool) {
        self.abort_interactions();
        self.doc.load(data, internal);
        if !internal {
            self.save_state();
        }
    }

    fn abort_interactions(&mut self) {
        self.gesture = Gesture::Idle;
        self.cancel_text_edit();
    }

    fn after_mutation(&mut self) {
        self.doc
            .camera
            .recompute_scroll_region(self.doc.store.content_bounds());
        self.history.save_state(&self.doc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_stroke(canvas: &mut Canvas, from: (f64, f64), to: (f64, f64)) {
        canvas.set_tool(ToolKind::Pencil);
        canvas.pointer_down(from.0, from.1, false);
        canvas.pointer_drag((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0);
        canvas.pointer_drag(to.0, to.1);
        canvas.pointer_up(to.0, to.1);
    }

    fn select_all_items(canvas: &mut Canvas) {
        canvas.set_tool(ToolKind::Select);
        canvas.pointer_down(-10_000.0, -10_000.0, false);
        canvas.pointer_drag(10_000.0, 10_000.0);
        canvas.pointer_up(10_000.0, 10_000.0);
    }

    #[test]
    fn test_scenario_a_stroke_undo_redo() {
        let mut canvas = Canvas::new();
        assert_eq!(canvas.undo_stack_len(), 1);

        draw_stroke(&mut canvas, (0.0, 0.0), (10.0, 0.0));
        assert_eq!(canvas.items().count(), 1);
        assert_eq!(canvas.items().next().unwrap().kind, ItemKind::Stroke);
        assert_eq!(canvas.undo_stack_len(), 2);

        assert!(canvas.undo());
        assert_eq!(canvas.items().count(), 0);

        assert!(canvas.redo());
        assert_eq!(canvas.items().count(), 1);
        assert_eq!(canvas.items().next().unwrap().kind, ItemKind::Stroke);
    }

    #[test]
    fn test_scenario_b_scale_doubles_around_pivot() {
        let mut canvas = Canvas::new();
        draw_stroke(&mut canvas, (60.0, 50.0), (70.0, 50.0));

        canvas.scale(&ItemSelector::All, 50.0, 50.0, 2.0);
        let item = canvas.items().next().unwrap();
        assert!((item.points[0].x - 70.0).abs() < 1e-9);
        assert!((item.points.last().unwrap().x - 90.0).abs() < 1e-9);
        assert!((item.points[0].y - 50.0).abs() < 1e-9);
        assert!((canvas.get_zoom() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scenario_c_empty_copy_paste_is_noop() {
        let mut canvas = Canvas::new();
        draw_stroke(&mut canvas, (0.0, 0.0), (10.0, 0.0));
        let depth = canvas.undo_stack_len();
        let before = canvas.serialize();

        canvas.copy();
        canvas.paste();

        assert_eq!(canvas.serialize(), before);
        assert_eq!(canvas.undo_stack_len(), depth);
    }

    #[test]
    fn test_scale_invertibility() {
        let mut canvas = Canvas::new();
        draw_stroke(&mut canvas, (10.0, 10.0), (90.0, 40.0));
        let before = canvas.bounding_box(&ItemSelector::All).unwrap();

        canvas.scale(&ItemSelector::All, 33.0, 44.0, 2.5);
        canvas.scale(&ItemSelector::All, 33.0, 44.0, 1.0 / 2.5);
        let after = canvas.bounding_box(&ItemSelector::All).unwrap();

        assert!((before.x0 - after.x0).abs() < 1e-9);
        assert!((before.y0 - after.y0).abs() < 1e-9);
        assert!((before.x1 - after.x1).abs() < 1e-9);
        assert!((before.y1 - after.y1).abs() < 1e-9);
    }

    #[test]
    fn test_scale_rejects_non_positive_factor() {
        let mut canvas = Canvas::new();
        draw_stroke(&mut canvas, (0.0, 0.0), (10.0, 0.0));
        let before = canvas.serialize();
        canvas.scale(&ItemSelector::All, 0.0, 0.0, 0.0);
        canvas.scale(&ItemSelector::All, 0.0, 0.0, -1.0);
        assert_eq!(canvas.serialize(), before);
    }

    #[test]
    fn test_degenerate_pencil_click_makes_dot() {
        let mut canvas = Canvas::new();
        canvas.settings.pencil_width = 6.0;
        canvas.set_tool(ToolKind::Pencil);
        canvas.pointer_down(100.0, 100.0, false);
        canvas.pointer_up(100.0, 100.0);

        let item = canvas.items().next().unwrap();
        assert_eq!(item.kind, ItemKind::Oval);
        let b = item.bounds().unwrap();
        assert!((b.width() - 6.0).abs() < 1e-9);
        assert!((b.height() - 6.0).abs() < 1e-9);
        assert!((b.center().x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_pencil_cap_drops_extra_samples() {
        let mut canvas = Canvas::new();
        canvas.set_tool(ToolKind::Pencil);
        canvas.pointer_down(0.0, 0.0, false);
        for i in 0..(MAX_STROKE_POINTS + 500) {
            canvas.pointer_drag(i as f64 * 0.1, 0.0);
        }
        canvas.pointer_up(0.0, 0.0);

        let item = canvas.items().next().unwrap();
        assert_eq!(item.points.len(), MAX_STROKE_POINTS);
    }

    #[test]
    fn test_tool_switch_mid_gesture_discards() {
        let mut canvas = Canvas::new();
        canvas.set_tool(ToolKind::Line);
        canvas.pointer_down(0.0, 0.0, false);
        canvas.pointer_drag(50.0, 50.0);
        canvas.set_tool(ToolKind::Pencil);
        canvas.pointer_up(50.0, 50.0);

        assert_eq!(canvas.items().count(), 0);
        assert_eq!(canvas.undo_stack_len(), 1);
    }

    #[test]
    fn test_unknown_tool_name_ignored() {
        let mut canvas = Canvas::new();
        canvas.set_tool_named("line");
        assert_eq!(canvas.get_tool(), ToolKind::Line);
        canvas.set_tool_named("chainsaw");
        assert_eq!(canvas.get_tool(), ToolKind::Line);
    }

    #[test]
    fn test_eraser_noop_leaves_stack_unchanged() {
        let mut canvas = Canvas::new();
        draw_stroke(&mut canvas, (0.0, 0.0), (10.0, 0.0));
        let depth = canvas.undo_stack_len();

        canvas.set_tool(ToolKind::Eraser);
        canvas.pointer_down(500.0, 500.0, false);
        canvas.pointer_drag(510.0, 500.0);
        canvas.pointer_up(510.0, 500.0);

        assert_eq!(canvas.undo_stack_len(), depth);
        assert_eq!(canvas.items().count(), 1);
    }

    #[test]
    fn test_eraser_deletes_and_snapshots_once() {
        let mut canvas = Canvas::new();
        draw_stroke(&mut canvas, (0.0, 0.0), (10.0, 0.0));
        draw_stroke(&mut canvas, (5.0, -5.0), (5.0, 5.0));
        let depth = canvas.undo_stack_len();

        canvas.set_tool(ToolKind::Eraser);
        canvas.pointer_down(5.0, 0.0, false);
        canvas.pointer_up(5.0, 0.0);

        assert_eq!(canvas.items().count(), 0);
        assert_eq!(canvas.undo_stack_len(), depth + 1);
    }

    #[test]
    fn test_eraser_spares_grid_lines() {
        let mut canvas = Canvas::new();
        canvas.set_grid_enabled(true);
        let grid_lines = canvas.items().count();
        assert!(grid_lines > 0);

        canvas.set_tool(ToolKind::Eraser);
        canvas.pointer_down(100.0, 100.0, false);
        canvas.pointer_up(100.0, 100.0);
        assert_eq!(canvas.items().count(), grid_lines);
    }

    #[test]
    fn test_rubber_band_selects_enclosed_only() {
        let mut canvas = Canvas::new();
        draw_stroke(&mut canvas, (10.0, 10.0), (20.0, 20.0));
        draw_stroke(&mut canvas, (200.0, 200.0), (220.0, 220.0));

        canvas.set_tool(ToolKind::Select);
        canvas.pointer_down(0.0, 0.0, false);
        canvas.pointer_drag(50.0, 50.0);
        canvas.pointer_up(50.0, 50.0);

        assert_eq!(canvas.get_selected_items().len(), 1);
    }

    #[test]
    fn test_modifier_click_toggles_nearest() {
        let mut canvas = Canvas::new();
        draw_stroke(&mut canvas, (10.0, 10.0), (20.0, 10.0));
        let id = canvas.items().next().unwrap().id;

        canvas.set_tool(ToolKind::Select);
        canvas.pointer_down(15.0, 10.0, true);
        assert_eq!(canvas.get_selected_items(), vec![id]);

        canvas.pointer_down(15.0, 10.0, true);
        assert!(canvas.get_selected_items().is_empty());
    }

    #[test]
    fn test_selection_isolation_copy_paste() {
        let mut canvas = Canvas::new();
        draw_stroke(&mut canvas, (10.0, 10.0), (20.0, 10.0));
        draw_stroke(&mut canvas, (40.0, 30.0), (60.0, 30.0));
        select_all_items(&mut canvas);

        canvas.copy();
        canvas.delete_selection();
        assert_eq!(canvas.items().count(), 0);

        canvas.paste();
        let pasted: Vec<&CanvasItem> = canvas.items().collect();
        assert_eq!(pasted.len(), 2);
        // Relative offset between the two items is preserved
        let delta_x = pasted[1].points[0].x - pasted[0].points[0].x;
        let delta_y = pasted[1].points[0].y - pasted[0].points[0].y;
        assert!((delta_x - 30.0).abs() < 1e-9);
        assert!((delta_y - 20.0).abs() < 1e-9);
        // Pasted items carry the selection overlay tag
        assert_eq!(canvas.get_selected_items().len(), 2);
    }

    #[test]
    fn test_paste_snapshots_once_per_batch() {
        let mut canvas = Canvas::new();
        draw_stroke(&mut canvas, (10.0, 10.0), (20.0, 10.0));
        draw_stroke(&mut canvas, (40.0, 30.0), (60.0, 30.0));
        select_all_items(&mut canvas);
        canvas.copy();

        let depth = canvas.undo_stack_len();
        canvas.paste();
        assert_eq!(canvas.undo_stack_len(), depth + 1);
    }

    #[test]
    fn test_move_selection_single_snapshot() {
        let mut canvas = Canvas::new();
        draw_stroke(&mut canvas, (10.0, 10.0), (20.0, 10.0));
        select_all_items(&mut canvas);
        let depth = canvas.undo_stack_len();

        canvas.move_selection(5.0, 7.0);
        assert_eq!(canvas.undo_stack_len(), depth + 1);
        let item = canvas.items().next().unwrap();
        assert!((item.points[0].x - 15.0).abs() < 1e-9);
        assert!((item.points[0].y - 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_commit_scales_font_with_zoom() {
        let mut canvas = Canvas::new();
        canvas.scale(&ItemSelector::All, 0.0, 0.0, 2.0);
        canvas.settings.font = FontSpec::new("Helvetica", 12.0);

        canvas.set_tool(ToolKind::Text);
        let event = canvas.pointer_down(100.0, 100.0, false);
        let Some(CanvasEvent::TextPrompt { position }) = event else {
            panic!("expected a text prompt");
        };
        canvas.commit_text(position, "note");

        let item = canvas.items().next().unwrap();
        assert_eq!(item.kind, ItemKind::Text);
        assert!((item.style.font.as_ref().unwrap().size - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text_commit_creates_nothing() {
        let mut canvas = Canvas::new();
        let depth = canvas.undo_stack_len();
        assert!(canvas.commit_text(Point::new(10.0, 10.0), "").is_none());
        assert_eq!(canvas.items().count(), 0);
        assert_eq!(canvas.undo_stack_len(), depth);
    }

    #[test]
    fn test_text_edit_commit_and_cancel() {
        let mut canvas = Canvas::new();
        let id = canvas.commit_text(Point::new(10.0, 10.0), "first").unwrap();

        let edit = canvas.begin_text_edit(id).unwrap();
        assert_eq!(edit.text, "first");
        assert!(canvas.items().next().unwrap().hidden);

        canvas.commit_text_edit("second");
        let item = canvas.items().next().unwrap();
        assert!(!item.hidden);
        assert_eq!(item.style.text.as_deref(), Some("second"));

        canvas.begin_text_edit(id).unwrap();
        canvas.cancel_text_edit();
        let item = canvas.items().next().unwrap();
        assert!(!item.hidden);
        assert_eq!(item.style.text.as_deref(), Some("second"));
    }

    #[test]
    fn test_text_edit_unchanged_commit_dedups() {
        let mut canvas = Canvas::new();
        let id = canvas.commit_text(Point::new(10.0, 10.0), "same").unwrap();
        let depth = canvas.undo_stack_len();

        canvas.begin_text_edit(id).unwrap();
        canvas.commit_text_edit("same");
        assert_eq!(canvas.undo_stack_len(), depth);
    }

    #[test]
    fn test_begin_text_edit_rejects_non_text() {
        let mut canvas = Canvas::new();
        draw_stroke(&mut canvas, (0.0, 0.0), (10.0, 0.0));
        let id = canvas.items().next().unwrap().id;
        assert!(canvas.begin_text_edit(id).is_none());
    }

    #[test]
    fn test_insert_image_failure_is_silent() {
        let mut canvas = Canvas::new();
        let depth = canvas.undo_stack_len();
        let result = canvas.insert_image(Path::new("/no/such/image.png"), Point::new(0.0, 0.0));
        assert!(result.is_none());
        assert_eq!(canvas.items().count(), 0);
        assert_eq!(canvas.undo_stack_len(), depth);
    }

    #[test]
    fn test_load_roundtrip_and_selection_cleared() {
        let mut canvas = Canvas::new();
        draw_stroke(&mut canvas, (0.0, 0.0), (10.0, 0.0));
        select_all_items(&mut canvas);
        assert_eq!(canvas.get_selected_items().len(), 1);

        let payload = canvas.serialize();
        canvas.load(&payload, false);
        assert_eq!(canvas.items().count(), 1);
        assert!(canvas.get_selected_items().is_empty());
        assert_eq!(canvas.serialize(), payload);
    }

    #[test]
    fn test_undo_redo_symmetry_over_actions() {
        let mut canvas = Canvas::new();
        draw_stroke(&mut canvas, (0.0, 0.0), (10.0, 0.0));
        draw_stroke(&mut canvas, (20.0, 0.0), (30.0, 0.0));
        draw_stroke(&mut canvas, (40.0, 0.0), (50.0, 0.0));
        let top = canvas.serialize();

        for _ in 0..3 {
            assert!(canvas.undo());
        }
        assert_eq!(canvas.items().count(), 0);
        for _ in 0..3 {
            assert!(canvas.redo());
        }
        assert_eq!(canvas.serialize(), top);
    }

    #[test]
    fn test_grid_never_serialized_or_undone() {
        let mut canvas = Canvas::new();
        canvas.set_grid_enabled(true);
        assert!(canvas.items().count() > 0);
        assert_eq!(canvas.serialize()["items"].as_array().unwrap().len(), 0);

        draw_stroke(&mut canvas, (0.0, 0.0), (10.0, 0.0));
        canvas.undo();
        // Grid lines survive the undo; only the stroke goes away
        assert!(canvas.items().all(|i| i.has_tag(Tag::Grid)));
    }

    #[test]
    fn test_clear_all_spares_grid_and_snapshots_once() {
        let mut canvas = Canvas::new();
        canvas.set_grid_enabled(true);
        let grid_lines = canvas.items().count();
        draw_stroke(&mut canvas, (0.0, 0.0), (10.0, 0.0));
        draw_stroke(&mut canvas, (20.0, 0.0), (30.0, 0.0));
        let depth = canvas.undo_stack_len();

        canvas.clear_all();
        assert_eq!(canvas.items().count(), grid_lines);
        assert_eq!(canvas.undo_stack_len(), depth + 1);

        canvas.clear_all();
        assert_eq!(canvas.undo_stack_len(), depth + 1);
    }

    #[test]
    fn test_observer_reports_toolbar_state() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let state = Rc::new(RefCell::new((false, false)));
        let sink = Rc::clone(&state);

        let mut canvas = Canvas::new();
        canvas.on_undo_redo_update(Box::new(move |u, r| *sink.borrow_mut() = (u, r)));

        draw_stroke(&mut canvas, (0.0, 0.0), (10.0, 0.0));
        assert_eq!(*state.borrow(), (true, false));
        canvas.undo();
        assert_eq!(*state.borrow(), (false, true));
    }
}
