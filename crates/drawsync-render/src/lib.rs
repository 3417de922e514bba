//! drawsync Render Library
//!
//! Raster surface for drawsync sessions, backed by a `tiny-skia` pixmap.
//! Snapshots and exports are PNG images.

mod paint;
mod pixmap;

pub use paint::{parse_color, stroke_paint, stroke_style};
pub use pixmap::PixmapSurface;
