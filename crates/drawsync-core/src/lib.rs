//! drawsync Core Library
//!
//! Platform-agnostic drawing operations, history and sync logic for the
//! drawsync shared canvas. Rasterization lives in `drawsync-render`.

pub mod config;
pub mod history;
pub mod input;
pub mod operation;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod surface;
pub mod sync;
pub mod tools;
pub mod viewport;

pub use config::{ConfigError, SessionConfig};
pub use history::{DEFAULT_HISTORY_KEY, HistoryStore};
pub use input::PointerEvent;
pub use operation::{DashStyle, DrawOperation, DrawingEvent, OperationError, ShapeKind, StrokeStyle};
pub use session::{Session, SessionError, SessionResult, SessionState};
pub use snapshot::{Snapshot, SnapshotError};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use surface::{RasterSurface, SurfaceError};
pub use sync::{ConnectionState, HubChannel, LocalHub, OfflineChannel, SyncChannel, SyncError, WebSocketChannel};
pub use tools::{ActiveTool, StrokeProjector};
pub use viewport::Viewport;
