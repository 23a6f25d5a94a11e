//! Tool kinds and gesture state.
//!
//! Every tool interprets one pointer gesture as three phases: start
//! (pointer down), drag (pointer moves while down), stop (pointer up). The
//! in-flight state is a single typed [`Gesture`] value owned by the canvas;
//! a tool switch mid-gesture resets it to `Idle` and the stop phase
//! discards silently.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Points accumulated per stroke before further motion samples are dropped.
pub const MAX_STROKE_POINTS: usize = 2000;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToolKind {
    #[default]
    Pencil,
    Eraser,
    Line,
    Text,
    Select,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Pencil => "pencil",
            ToolKind::Eraser => "eraser",
            ToolKind::Line => "line",
            ToolKind::Text => "text",
            ToolKind::Select => "select",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pencil" => Some(ToolKind::Pencil),
            "eraser" => Some(ToolKind::Eraser),
            "line" => Some(ToolKind::Line),
            "text" => Some(ToolKind::Text),
            "select" => Some(ToolKind::Select),
            _ => None,
        }
    }
}

/// In-flight gesture state, in logical coordinates.
#[derive(Debug, Clone, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Pencil samples accumulated so far.
    Pencil { points: Vec<Point> },
    /// Whether any item has been deleted during this eraser pass.
    Eraser { erased_any: bool },
    /// Line anchor and current pointer (the preview segment).
    Line { anchor: Point, current: Point },
    /// Rubber-band corners (the preview rectangle).
    RubberBand { anchor: Point, current: Point },
}

impl Gesture {
    pub fn is_active(&self) -> bool {
        !matches!(self, Gesture::Idle)
    }
}

/// Non-persisted visual feedback for the host renderer. Never stored, never
/// serialized, never snapshotted.
#[derive(Debug, Clone, PartialEq)]
pub enum GesturePreview {
    /// Pencil trail so far.
    Trail { points: Vec<Point> },
    /// Line preview from anchor to pointer.
    Segment { from: Point, to: Point },
    /// Rubber-band rectangle.
    Band { rect: Rect },
}

impl Gesture {
    /// The preview the renderer should draw for the current state, if any.
    pub fn preview(&self) -> Option<GesturePreview> {
        match self {
            Gesture::Idle | Gesture::Eraser { .. } => None,
            Gesture::Pencil { points } => {
                if points.len() >= 2 {
                    Some(GesturePreview::Trail {
                        points: points.clone(),
                    })
                } else {
                    None
                }
            }
            Gesture::Line { anchor, current } => Some(GesturePreview::Segment {
                from: *anchor,
                to: *current,
            }),
            Gesture::RubberBand { anchor, current } => Some(GesturePreview::Band {
                rect: Rect::from_points(*anchor, *current),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_roundtrip() {
        for tool in [
            ToolKind::Pencil,
            ToolKind::Eraser,
            ToolKind::Line,
            ToolKind::Text,
            ToolKind::Select,
        ] {
            assert_eq!(ToolKind::from_name(tool.name()), Some(tool));
        }
        assert_eq!(ToolKind::from_name("lasso"), None);
    }

    #[test]
    fn test_idle_has_no_preview() {
        assert!(Gesture::Idle.preview().is_none());
    }

    #[test]
    fn test_band_preview_normalizes_corners() {
        let g = Gesture::RubberBand {
            anchor: Point::new(10.0, 10.0),
            current: Point::new(0.0, 0.0),
        };
        match g.preview() {
            Some(GesturePreview::Band { rect }) => {
                assert!((rect.x0 - 0.0).abs() < f64::EPSILON);
                assert!((rect.x1 - 10.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected preview: {other:?}"),
        }
    }

    #[test]
    fn test_single_point_pencil_has_no_trail() {
        let g = Gesture::Pencil {
            points: vec![Point::new(1.0, 1.0)],
        };
        assert!(g.preview().is_none());
    }
}
