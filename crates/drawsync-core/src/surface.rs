//! Raster surface abstraction.

use crate::operation::DrawOperation;
use crate::snapshot::Snapshot;
use thiserror::Error;

/// Surface errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Invalid surface size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Failed to encode surface: {0}")]
    Encode(String),
    #[error("Failed to decode snapshot: {0}")]
    Decode(String),
}

/// A 2-D pixel buffer that drawing operations are painted onto.
///
/// Implementations keep no state beyond their pixels: every operation is
/// painted with the style it carries.
pub trait RasterSurface {
    /// Paint one operation.
    fn apply(&mut self, op: &DrawOperation);

    /// Reset to a blank buffer.
    fn clear(&mut self);

    /// Capture the whole buffer.
    fn snapshot(&self) -> Result<Snapshot, SurfaceError>;

    /// Replace the whole buffer with `snapshot`. Never blends with the
    /// current contents; the empty sentinel restores a blank buffer.
    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), SurfaceError>;

    /// Encode the buffer as a standalone PNG image for download.
    fn export_png(&self) -> Result<Vec<u8>, SurfaceError>;

    /// Surface size in pixels.
    fn size(&self) -> (u32, u32);
}
