//! Zoom and pan correction between client and surface coordinates.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Zoom change applied by one zoom-in/zoom-out step.
pub const ZOOM_STEP: f64 = 0.1;

/// Smallest allowed zoom level.
pub const MIN_ZOOM: f64 = 0.1;

/// Maps client (pointer) coordinates onto the surface.
///
/// `offset` is where the surface's origin sits in client space; `zoom` is the
/// display scale of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Client-space position of the surface origin.
    pub offset: Vec2,
    /// Current zoom level (1.0 = 100%).
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface to client transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Client to surface transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    /// Convert a client point to surface coordinates.
    pub fn client_to_surface(&self, client: Point) -> Point {
        self.inverse_transform() * client
    }

    /// Convert a surface point to client coordinates.
    pub fn surface_to_client(&self, surface: Point) -> Point {
        self.transform() * surface
    }

    /// Move the surface origin in client space.
    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    pub fn zoom_in(&mut self) {
        self.zoom += ZOOM_STEP;
    }

    /// Zoom out one step, never below [`MIN_ZOOM`].
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - ZOOM_STEP).max(MIN_ZOOM);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_by_default() {
        let viewport = Viewport::new();
        let p = Point::new(100.0, 200.0);
        assert_eq!(viewport.client_to_surface(p), p);
    }

    #[test]
    fn test_offset_and_zoom() {
        let viewport = Viewport {
            offset: Vec2::new(50.0, 10.0),
            zoom: 2.0,
        };
        let surface = viewport.client_to_surface(Point::new(150.0, 110.0));
        assert!((surface.x - 50.0).abs() < 1e-10);
        assert!((surface.y - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let viewport = Viewport {
            offset: Vec2::new(30.0, -20.0),
            zoom: 1.5,
        };
        let original = Point::new(123.0, 456.0);
        let back = viewport.surface_to_client(viewport.client_to_surface(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_steps_clamp() {
        let mut viewport = Viewport::new();
        viewport.zoom_in();
        assert!((viewport.zoom - 1.1).abs() < 1e-10);

        for _ in 0..30 {
            viewport.zoom_out();
        }
        assert!((viewport.zoom - MIN_ZOOM).abs() < f64::EPSILON);

        viewport.reset();
        assert_eq!(viewport, Viewport::default());
    }
}
