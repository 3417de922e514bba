//! Pixmap-backed raster surface.

use crate::paint::{stroke_paint, stroke_style};
use drawsync_core::{DrawOperation, RasterSurface, ShapeKind, Snapshot, SurfaceError};
use kurbo::Point;
use tiny_skia::{Color, Path, PathBuilder, Pixmap, Rect, Transform};

/// Raster surface over a premultiplied RGBA pixmap. Starts transparent.
pub struct PixmapSurface {
    pixmap: Pixmap,
}

impl PixmapSurface {
    /// Create a blank surface.
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        let pixmap = Pixmap::new(width, height).ok_or(SurfaceError::InvalidSize { width, height })?;
        Ok(Self { pixmap })
    }

    /// Get the underlying pixmap.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight (non-premultiplied) RGBA of one pixel, or `None` outside the
    /// surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.pixmap.width() || y >= self.pixmap.height() {
            return None;
        }
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
    }

    /// Whether every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.pixmap.pixels().iter().all(|p| p.alpha() == 0)
    }

    fn encode(&self) -> Result<Vec<u8>, SurfaceError> {
        self.pixmap
            .encode_png()
            .map_err(|e| SurfaceError::Encode(e.to_string()))
    }
}

fn line_path(from: Point, to: Point) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(from.x as f32, from.y as f32);
    pb.line_to(to.x as f32, to.y as f32);
    pb.finish()
}

/// Rectangle with one corner at `from` and size `to - from`; negative sizes
/// flip, so any two corners give the same rectangle.
fn rect_path(from: Point, to: Point) -> Option<Path> {
    let rect = kurbo::Rect::from_points(from, to);
    let rect = Rect::from_ltrb(rect.x0 as f32, rect.y0 as f32, rect.x1 as f32, rect.y1 as f32)?;
    Some(PathBuilder::from_rect(rect))
}

/// Full circle centered at `from` through `to`.
fn circle_path(from: Point, to: Point) -> Option<Path> {
    let radius = from.distance(to);
    PathBuilder::from_circle(from.x as f32, from.y as f32, radius as f32)
}

fn operation_path(op: &DrawOperation) -> Option<Path> {
    match op {
        DrawOperation::Segment { from, to, .. } => line_path(*from, *to),
        DrawOperation::Shape { shape, from, to, .. } => match shape {
            ShapeKind::Rectangle => rect_path(*from, *to),
            ShapeKind::Circle => circle_path(*from, *to),
            ShapeKind::Line => line_path(*from, *to),
        },
    }
}

impl RasterSurface for PixmapSurface {
    fn apply(&mut self, op: &DrawOperation) {
        // Degenerate geometry (zero-size rectangle or circle) paints nothing
        let Some(path) = operation_path(op) else {
            log::trace!("Nothing to paint for {:?}", op);
            return;
        };
        let style = op.style();
        self.pixmap.stroke_path(
            &path,
            &stroke_paint(style),
            &stroke_style(style),
            Transform::identity(),
            None,
        );
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    fn snapshot(&self) -> Result<Snapshot, SurfaceError> {
        self.encode().map(Snapshot::from_bytes)
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), SurfaceError> {
        if snapshot.is_empty() {
            self.clear();
            return Ok(());
        }
        let decoded = Pixmap::decode_png(snapshot.as_bytes())
            .map_err(|e| SurfaceError::Decode(e.to_string()))?;
        if decoded.width() != self.pixmap.width() || decoded.height() != self.pixmap.height() {
            return Err(SurfaceError::Decode(format!(
                "snapshot is {}x{}, surface is {}x{}",
                decoded.width(),
                decoded.height(),
                self.pixmap.width(),
                self.pixmap.height()
            )));
        }
        self.pixmap = decoded;
        Ok(())
    }

    fn export_png(&self) -> Result<Vec<u8>, SurfaceError> {
        self.encode()
    }

    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }
}
