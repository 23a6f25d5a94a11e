//! SVG export.
//!
//! One polyline per stroke/line item, one text element per text item (font
//! resolved to family/size/weight/slant), ellipse/rect elements for shapes,
//! and one image reference per image item, re-referencing the original
//! source path rather than embedding pixel data. Overlay items (`no_save`)
//! and hidden items are not exported.

use quillboard_core::{CanvasItem, CapStyle, DocumentState, FontSlant, FontWeight, ItemKind};
use std::fmt::Write;

/// Render the document to an SVG string sized to the visible viewport.
pub fn document_to_svg(doc: &DocumentState) -> String {
    let view = doc.camera.visible_rect();
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="{} {} {} {}">"#,
        view.width(),
        view.height(),
        fmt_num(view.x0),
        fmt_num(view.y0),
        fmt_num(view.width()),
        fmt_num(view.height()),
    );

    for item in doc.store.iter().filter(|i| !i.is_no_save() && !i.hidden) {
        match item.kind {
            ItemKind::Stroke | ItemKind::Line => polyline_element(&mut out, item),
            ItemKind::Oval => oval_element(&mut out, item),
            ItemKind::Rectangle => rect_element(&mut out, item),
            ItemKind::Text => text_element(&mut out, item),
            ItemKind::Image => image_element(&mut out, item),
        }
    }

    out.push_str("</svg>\n");
    out
}

fn polyline_element(out: &mut String, item: &CanvasItem) {
    let points: Vec<String> = item
        .points
        .iter()
        .map(|p| format!("{},{}", fmt_num(p.x), fmt_num(p.y)))
        .collect();
    let stroke = item
        .style
        .fill
        .map(|c| c.to_hex())
        .unwrap_or_else(|| "#000000".to_string());
    let cap = match item.style.cap {
        CapStyle::Butt => "butt",
        CapStyle::Round => "round",
        CapStyle::Projecting => "square",
    };
    let _ = writeln!(
        out,
        r#"  <polyline points="{}" fill="none" stroke="{}" stroke-width="{}" stroke-linecap="{}"/>"#,
        points.join(" "),
        stroke,
        fmt_num(item.style.width),
        cap,
    );
}

fn oval_element(out: &mut String, item: &CanvasItem) {
    let Some(bounds) = item.bounds() else { return };
    let _ = writeln!(
        out,
        r#"  <ellipse cx="{}" cy="{}" rx="{}" ry="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
        fmt_num(bounds.center().x),
        fmt_num(bounds.center().y),
        fmt_num(bounds.width() / 2.0),
        fmt_num(bounds.height() / 2.0),
        item.style
            .fill
            .map(|c| c.to_hex())
            .unwrap_or_else(|| "none".to_string()),
        item.style
            .outline
            .map(|c| c.to_hex())
            .unwrap_or_else(|| "none".to_string()),
        fmt_num(item.style.width),
    );
}

fn rect_element(out: &mut String, item: &CanvasItem) {
    let Some(bounds) = item.bounds() else { return };
    let _ = writeln!(
        out,
        r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
        fmt_num(bounds.x0),
        fmt_num(bounds.y0),
        fmt_num(bounds.width()),
        fmt_num(bounds.height()),
        item.style
            .fill
            .map(|c| c.to_hex())
            .unwrap_or_else(|| "none".to_string()),
        item.style
            .outline
            .map(|c| c.to_hex())
            .unwrap_or_else(|| "none".to_string()),
        fmt_num(item.style.width),
    );
}

fn text_element(out: &mut String, item: &CanvasItem) {
    let Some(bounds) = item.bounds() else { return };
    let content = item.style.text.as_deref().unwrap_or("");
    let font = item.style.font.clone().unwrap_or_default();
    let weight = match font.weight {
        FontWeight::Normal => "normal",
        FontWeight::Bold => "bold",
    };
    let style = match font.slant {
        FontSlant::Roman => "normal",
        FontSlant::Italic => "italic",
    };
    let _ = write!(
        out,
        r#"  <text x="{}" y="{}" font-family="{}" font-size="{}" font-weight="{}" font-style="{}" fill="{}">"#,
        fmt_num(bounds.x0),
        fmt_num(bounds.y0 + font.size),
        escape(&font.family),
        fmt_num(font.size),
        weight,
        style,
        item.style
            .fill
            .map(|c| c.to_hex())
            .unwrap_or_else(|| "#000000".to_string()),
    );
    for (i, line) in content.lines().enumerate() {
        if i == 0 {
            let _ = write!(out, "{}", escape(line));
        } else {
            let _ = write!(
                out,
                r#"<tspan x="{}" dy="1.2em">{}</tspan>"#,
                fmt_num(bounds.x0),
                escape(line)
            );
        }
    }
    out.push_str("</text>\n");
}

fn image_element(out: &mut String, item: &CanvasItem) {
    let Some(bounds) = item.bounds() else { return };
    let Some(path) = &item.style.image_path else {
        return;
    };
    let _ = writeln!(
        out,
        r#"  <image x="{}" y="{}" width="{}" height="{}" href="{}"/>"#,
        fmt_num(bounds.x0),
        fmt_num(bounds.y0),
        fmt_num(bounds.width()),
        fmt_num(bounds.height()),
        escape(&path.to_string_lossy()),
    );
}

/// Trim trailing zeros so coordinates stay readable.
fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.3}", value)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use quillboard_core::{Canvas, FontSpec, ItemSelector, ToolKind};

    fn canvas_with_stroke() -> Canvas {
        let mut canvas = Canvas::new();
        canvas.set_tool(ToolKind::Pencil);
        canvas.pointer_down(10.0, 10.0, false);
        canvas.pointer_drag(20.0, 15.0);
        canvas.pointer_drag(30.0, 10.0);
        canvas.pointer_up(30.0, 10.0);
        canvas
    }

    #[test]
    fn test_stroke_becomes_polyline() {
        let canvas = canvas_with_stroke();
        let svg = document_to_svg(canvas.document());
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("10,10 20,15 30,10"));
    }

    #[test]
    fn test_text_resolves_font() {
        let mut canvas = Canvas::new();
        canvas.settings.font = FontSpec::parse("Noto Sans 14 bold italic");
        canvas.commit_text(Point::new(50.0, 60.0), "a < b & c");
        let svg = document_to_svg(canvas.document());
        assert!(svg.contains(r#"font-family="Noto Sans""#));
        assert!(svg.contains(r#"font-weight="bold""#));
        assert!(svg.contains(r#"font-style="italic""#));
        assert!(svg.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_grid_lines_not_exported() {
        let mut canvas = canvas_with_stroke();
        canvas.set_grid_enabled(true);
        let svg = document_to_svg(canvas.document());
        assert_eq!(svg.matches("<polyline").count(), 1);
    }

    #[test]
    fn test_multiline_text_uses_tspans() {
        let mut canvas = Canvas::new();
        canvas.commit_text(Point::new(0.0, 0.0), "one\ntwo");
        let svg = document_to_svg(canvas.document());
        assert_eq!(svg.matches("<tspan").count(), 1);
        assert!(svg.contains("two"));
    }

    #[test]
    fn test_dot_becomes_ellipse() {
        let mut canvas = Canvas::new();
        canvas.set_tool(ToolKind::Pencil);
        canvas.pointer_down(40.0, 40.0, false);
        canvas.pointer_up(40.0, 40.0);
        let svg = document_to_svg(canvas.document());
        assert!(svg.contains("<ellipse"));
        assert!(svg.contains(r#"cx="40" cy="40""#));
    }

    #[test]
    fn test_scaled_document_exports_scaled_coords() {
        let mut canvas = canvas_with_stroke();
        canvas.scale(&ItemSelector::All, 0.0, 0.0, 2.0);
        let svg = document_to_svg(canvas.document());
        assert!(svg.contains("20,20 40,30 60,20"));
    }
}
