//! Read-only exporters for Quillboard documents.
//!
//! Both exporters are pure consumers of the item store: they never mutate
//! the document and never touch undo history.

pub mod raster;
pub mod svg;

pub use raster::{ExportError, render_png, write_png};
pub use svg::document_to_svg;
