//! PNG export via CPU rasterization.
//!
//! The visible viewport is mapped onto the requested pixel size. Geometric
//! items are drawn with tiny-skia; image items are decoded and composited.
//! Text items are skipped: glyph shaping belongs to the host toolkit, and
//! the vector exporter carries full font information instead.

use quillboard_core::{CanvasItem, CapStyle, DocumentState, ItemKind};
use std::path::Path;
use thiserror::Error;
use tiny_skia::{
    FillRule, IntSize, LineCap, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid output dimensions {0}x{1}")]
    InvalidDimensions(u32, u32),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Render the visible viewport to PNG bytes of the given pixel size.
pub fn render_png(doc: &DocumentState, width: u32, height: u32) -> Result<Vec<u8>, ExportError> {
    let mut pixmap =
        Pixmap::new(width, height).ok_or(ExportError::InvalidDimensions(width, height))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let view = doc.camera.visible_rect();
    if view.width() <= 0.0 || view.height() <= 0.0 {
        return pixmap
            .encode_png()
            .map_err(|e| ExportError::Encode(e.to_string()));
    }
    let sx = width as f64 / view.width();
    let sy = height as f64 / view.height();
    let ts = Transform::from_row(
        sx as f32,
        0.0,
        0.0,
        sy as f32,
        (-view.x0 * sx) as f32,
        (-view.y0 * sy) as f32,
    );

    for item in doc.store.iter().filter(|i| !i.is_no_save() && !i.hidden) {
        match item.kind {
            ItemKind::Stroke | ItemKind::Line => draw_polyline(&mut pixmap, item, ts),
            ItemKind::Oval => draw_shape(&mut pixmap, item, ts, true),
            ItemKind::Rectangle => draw_shape(&mut pixmap, item, ts, false),
            ItemKind::Image => draw_image(&mut pixmap, item, ts),
            ItemKind::Text => {
                log::debug!("glyph rasterization not supported; skipping text item");
            }
        }
    }

    pixmap
        .encode_png()
        .map_err(|e| ExportError::Encode(e.to_string()))
}

/// Render and write straight to a file.
pub fn write_png(
    doc: &DocumentState,
    path: &Path,
    width: u32,
    height: u32,
) -> Result<(), ExportError> {
    let bytes = render_png(doc, width, height)?;
    std::fs::write(path, bytes).map_err(|e| ExportError::Io(e.to_string()))
}

fn paint_for(color: quillboard_core::Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(tiny_skia::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    paint.anti_alias = true;
    paint
}

fn line_cap(cap: CapStyle) -> LineCap {
    match cap {
        CapStyle::Butt => LineCap::Butt,
        CapStyle::Round => LineCap::Round,
        CapStyle::Projecting => LineCap::Square,
    }
}

fn draw_polyline(pixmap: &mut Pixmap, item: &CanvasItem, ts: Transform) {
    if item.points.len() < 2 {
        return;
    }
    let Some(color) = item.style.fill else { return };
    let mut pb = PathBuilder::new();
    pb.move_to(item.points[0].x as f32, item.points[0].y as f32);
    for p in &item.points[1..] {
        pb.line_to(p.x as f32, p.y as f32);
    }
    let Some(path) = pb.finish() else { return };
    let stroke = Stroke {
        width: item.style.width as f32,
        line_cap: line_cap(item.style.cap),
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint_for(color), &stroke, ts, None);
}

fn draw_shape(pixmap: &mut Pixmap, item: &CanvasItem, ts: Transform, oval: bool) {
    let Some(b) = item.bounds() else { return };
    let Some(rect) =
        tiny_skia::Rect::from_ltrb(b.x0 as f32, b.y0 as f32, b.x1 as f32, b.y1 as f32)
    else {
        return;
    };
    let mut pb = PathBuilder::new();
    if oval {
        pb.push_oval(rect);
    } else {
        pb.push_rect(rect);
    }
    let Some(path) = pb.finish() else { return };

    if let Some(fill) = item.style.fill {
        pixmap.fill_path(&path, &paint_for(fill), FillRule::Winding, ts, None);
    }
    if let Some(outline) = item.style.outline {
        let stroke = Stroke {
            width: item.style.width as f32,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint_for(outline), &stroke, ts, None);
    }
}

fn draw_image(pixmap: &mut Pixmap, item: &CanvasItem, ts: Transform) {
    let Some(b) = item.bounds() else { return };
    let Some(path) = &item.style.image_path else {
        return;
    };
    let img = match image::open(path) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            log::warn!("cannot decode image {}: {e}", path.display());
            return;
        }
    };
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 || b.width() <= 0.0 || b.height() <= 0.0 {
        return;
    }

    // tiny-skia wants premultiplied RGBA
    let mut data = img.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        px[0] = ((px[0] as u16 * a) / 255) as u8;
        px[1] = ((px[1] as u16 * a) / 255) as u8;
        px[2] = ((px[2] as u16 * a) / 255) as u8;
    }
    let Some(size) = IntSize::from_wh(w, h) else {
        return;
    };
    let Some(src) = Pixmap::from_vec(data, size) else {
        return;
    };

    let local = Transform::from_row(
        (b.width() / w as f64) as f32,
        0.0,
        0.0,
        (b.height() / h as f64) as f32,
        b.x0 as f32,
        b.y0 as f32,
    );
    pixmap.draw_pixmap(
        0,
        0,
        src.as_ref(),
        &PixmapPaint::default(),
        local.post_concat(ts),
        None,
    );
}
