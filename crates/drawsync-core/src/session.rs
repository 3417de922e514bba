//! Session controller.
//!
//! Routes local pointer input through the stroke projector to the surface and
//! the sync channel, applies remote operations, and records one history
//! snapshot per completed local action.

use crate::config::ConfigError;
use crate::history::HistoryStore;
use crate::input::PointerEvent;
use crate::operation::{DashStyle, DrawOperation, DrawingEvent, OperationError, StrokeStyle};
use crate::snapshot::Snapshot;
use crate::storage::{Storage, StorageError};
use crate::surface::{RasterSurface, SurfaceError};
use crate::sync::{SyncChannel, SyncError};
use crate::tools::{ActiveTool, StrokeProjector};
use crate::viewport::Viewport;
use kurbo::{Point, Vec2};
use thiserror::Error;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Whether a local drag is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Drawing,
}

/// One participant's drawing session.
pub struct Session<S: RasterSurface, C: SyncChannel, P: Storage> {
    surface: S,
    channel: C,
    history: HistoryStore<P>,
    projector: StrokeProjector,
    tool: ActiveTool,
    style: StrokeStyle,
    viewport: Viewport,
    state: SessionState,
}

impl<S: RasterSurface, C: SyncChannel, P: Storage> Session<S, C, P> {
    /// Open a session: restore persisted history and paint its last snapshot
    /// before any input can reach the surface.
    pub fn open(mut surface: S, channel: C, mut history: HistoryStore<P>) -> Self {
        match history.restore().last() {
            Some(last) => {
                if let Err(e) = surface.restore(last) {
                    log::warn!("Failed to paint restored snapshot: {}", e);
                    surface.clear();
                }
            }
            None => surface.clear(),
        }
        log::info!("Session opened with {} history entries", history.len());

        Self {
            surface,
            channel,
            history,
            projector: StrokeProjector::new(),
            tool: ActiveTool::default(),
            style: StrokeStyle::default(),
            viewport: Viewport::default(),
            state: SessionState::Idle,
        }
    }

    // --- Local input ---

    /// Start a drag at `point` (surface coordinates).
    pub fn pointer_down(&mut self, point: Point) {
        if self.state == SessionState::Drawing {
            log::debug!("Pointer down during a drag, restarting it");
        }
        self.projector.begin(point);
        self.state = SessionState::Drawing;
    }

    /// Continue the drag. Freehand tools paint and publish one segment.
    pub fn pointer_move(&mut self, point: Point) -> Option<DrawOperation> {
        if self.state != SessionState::Drawing {
            return None;
        }
        let op = self.projector.extend(self.tool, &self.style, point)?;
        self.emit(&op);
        Some(op)
    }

    /// Finish the drag. Shape tools paint and publish their shape; every
    /// completed drag commits one snapshot.
    pub fn pointer_up(&mut self, point: Point) -> Option<DrawOperation> {
        if self.state != SessionState::Drawing {
            return None;
        }
        self.state = SessionState::Idle;

        let op = self.projector.end(self.tool, &self.style, point);
        if let Some(op) = &op {
            self.emit(op);
        }
        self.commit();
        op
    }

    /// Abandon the drag. Segments already painted stay on the surface but no
    /// snapshot is taken.
    pub fn pointer_leave(&mut self) {
        if self.state == SessionState::Drawing {
            log::debug!("Pointer left the surface, abandoning drag");
            self.projector.cancel();
            self.state = SessionState::Idle;
        }
    }

    /// Dispatch a pointer event given in client coordinates.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<DrawOperation> {
        match event {
            PointerEvent::Down { position } => {
                self.pointer_down(self.viewport.client_to_surface(position));
                None
            }
            PointerEvent::Move { position } => {
                self.pointer_move(self.viewport.client_to_surface(position))
            }
            PointerEvent::Up { position } => {
                self.pointer_up(self.viewport.client_to_surface(position))
            }
            PointerEvent::Leave => {
                self.pointer_leave();
                None
            }
        }
    }

    fn emit(&mut self, op: &DrawOperation) {
        self.surface.apply(op);
        if let Err(e) = self.channel.publish(op) {
            log::warn!("Failed to publish operation: {}", e);
        }
    }

    fn commit(&mut self) {
        match self.surface.snapshot() {
            Ok(snapshot) => self.history.commit(snapshot),
            Err(e) => log::warn!("Skipping history entry, snapshot failed: {}", e),
        }
    }

    // --- Remote input ---

    /// Paint an operation received from another participant. Remote
    /// operations are never republished and never committed.
    pub fn apply_remote(&mut self, event: DrawingEvent) -> Result<(), OperationError> {
        let op = DrawOperation::try_from(event)?;
        self.surface.apply(&op);
        Ok(())
    }

    /// Apply everything the channel delivered since the last call. Returns
    /// the number of operations painted.
    pub fn process_remote(&mut self) -> usize {
        let surface = &mut self.surface;
        let mut applied = 0;
        self.channel.drain_remote(&mut |event| match DrawOperation::try_from(event) {
            Ok(op) => {
                surface.apply(&op);
                applied += 1;
            }
            Err(e) => log::debug!("Skipping remote event: {}", e),
        });
        if applied > 0 {
            log::trace!("Applied {} remote operations", applied);
        }
        applied
    }

    // --- History ---

    /// Step back one action. Returns false when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.paint(&snapshot);
                true
            }
            None => false,
        }
    }

    /// Re-apply the last undone action. Returns false when there was nothing
    /// to redo.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.paint(&snapshot);
                true
            }
            None => false,
        }
    }

    /// Show a history snapshot. A snapshot the surface cannot decode leaves
    /// it blank, so history and surface never disagree about the position.
    fn paint(&mut self, snapshot: &Snapshot) {
        if let Err(e) = self.surface.restore(snapshot) {
            log::warn!("Failed to paint history snapshot: {}", e);
            self.surface.clear();
        }
    }

    /// Blank the surface and drop all history. Other participants are not
    /// told.
    pub fn clear(&mut self) {
        self.projector.cancel();
        self.state = SessionState::Idle;
        self.surface.clear();
        self.history.clear();
    }

    // --- Tool and style ---

    pub fn set_tool(&mut self, tool: ActiveTool) {
        self.tool = tool;
    }

    pub fn set_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.style.color = color.into();
    }

    /// Set the stroke width. Non-positive widths are ignored.
    pub fn set_line_width(&mut self, line_width: f64) {
        self.style = self.style.clone().with_line_width(line_width);
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.style = self.style.clone().with_opacity(opacity);
    }

    pub fn set_dash(&mut self, dash: DashStyle) {
        self.style.dash = dash;
    }

    /// Switch to the eraser preset (a freehand stroke in the backdrop color).
    pub fn use_eraser(&mut self) {
        self.tool = ActiveTool::Freehand;
        self.style = self.style.eraser();
    }

    pub fn use_smart_eraser(&mut self) {
        self.tool = ActiveTool::Freehand;
        self.style = self.style.smart_eraser();
    }

    // --- Viewport ---

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.viewport.set_offset(offset);
    }

    /// Encode the current surface as a PNG for download.
    pub fn export_png(&self) -> SessionResult<Vec<u8>> {
        Ok(self.surface.export_png()?)
    }

    // --- Accessors ---

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn tool(&self) -> ActiveTool {
        self.tool
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn history(&self) -> &HistoryStore<P> {
        &self.history
    }
}
