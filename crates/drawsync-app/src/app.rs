//! Application state and lifecycle.

use crate::action::{Action, ScriptError, load_script};
use clap::Parser;
use drawsync_core::{
    ActiveTool, FileStorage, HistoryStore, OfflineChannel, Session, SessionConfig, SessionError,
    SessionResult, Storage, SyncChannel, WebSocketChannel,
};
use drawsync_render::PixmapSurface;
use kurbo::Vec2;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("Failed to write {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Command-line options.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "drawsync", about = "Replay a drawing script against a shared canvas")]
pub struct AppOptions {
    /// Action script to replay.
    pub script: PathBuf,

    /// Session configuration file (defaults apply when absent).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where the exported PNG is written.
    #[arg(long = "out", default_value = "drawing.png")]
    pub output: PathBuf,
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Actions replayed.
    pub actions: usize,
    /// History entries after the run.
    pub history_len: usize,
    /// Remote operations painted during the run.
    pub remote_applied: usize,
}

type AppSession = Session<PixmapSurface, Box<dyn SyncChannel>, Box<dyn Storage>>;

/// A session plus the bookkeeping of the shell driving it.
pub struct App {
    session: AppSession,
    remote_applied: usize,
}

impl App {
    /// Open a session as described by `config`.
    pub fn open(config: &SessionConfig) -> SessionResult<Self> {
        config.validate()?;

        let storage: Box<dyn Storage> = match &config.storage_dir {
            Some(dir) => Box::new(FileStorage::new(dir.clone())?),
            None => Box::new(FileStorage::default_location()?),
        };
        let channel: Box<dyn SyncChannel> = match &config.relay_url {
            Some(url) => {
                log::info!("Joining relay at {}", url);
                Box::new(WebSocketChannel::connect_to(url)?)
            }
            None => Box::new(OfflineChannel),
        };
        let surface = PixmapSurface::new(config.width, config.height)?;
        let history = HistoryStore::with_key(storage, config.storage_key.clone());

        let mut session = Session::open(surface, channel, history);
        session.set_tool(config.tool);
        session.set_style(config.style.clone());

        Ok(Self {
            session,
            remote_applied: 0,
        })
    }

    /// Load configuration, replay the script and write the exported PNG.
    pub fn run(options: &AppOptions) -> Result<RunSummary, AppError> {
        let config = match &options.config {
            Some(path) => SessionConfig::load(path).map_err(SessionError::from)?,
            None => SessionConfig::default(),
        };
        let actions = load_script(&options.script)?;

        let mut app = Self::open(&config)?;
        for action in &actions {
            app.perform(action);
        }
        app.sync();

        let png = app.session.export_png()?;
        std::fs::write(&options.output, png).map_err(|e| AppError::Io {
            path: options.output.clone(),
            message: e.to_string(),
        })?;
        log::info!("Exported drawing to {}", options.output.display());

        Ok(RunSummary {
            actions: actions.len(),
            history_len: app.session.history().len(),
            remote_applied: app.remote_applied,
        })
    }

    /// Perform one action, then apply whatever the relay delivered meanwhile.
    pub fn perform(&mut self, action: &Action) {
        match action {
            Action::Pointer { event } => {
                self.session.handle_pointer(*event);
            }
            Action::Tool { name } => match ActiveTool::from_name(name) {
                Some(tool) => self.session.set_tool(tool),
                None => log::warn!("Unknown tool '{}', keeping {}", name, self.session.tool().name()),
            },
            Action::Color { color } => self.session.set_color(color.clone()),
            Action::LineWidth { width } => self.session.set_line_width(*width),
            Action::Opacity { opacity } => self.session.set_opacity(*opacity),
            Action::Dash { dash } => self.session.set_dash(*dash),
            Action::Eraser => self.session.use_eraser(),
            Action::SmartEraser => self.session.use_smart_eraser(),
            Action::Undo => {
                if !self.session.undo() {
                    log::debug!("Nothing to undo");
                }
            }
            Action::Redo => {
                if !self.session.redo() {
                    log::debug!("Nothing to redo");
                }
            }
            Action::Clear => self.session.clear(),
            Action::ZoomIn => self.session.zoom_in(),
            Action::ZoomOut => self.session.zoom_out(),
            Action::Pan { x, y } => self.session.set_offset(Vec2::new(*x, *y)),
            Action::Wait { millis } => std::thread::sleep(Duration::from_millis(*millis)),
        }
        self.sync();
    }

    /// Apply remote operations received so far.
    pub fn sync(&mut self) {
        self.remote_applied += self.session.process_remote();
    }

    pub fn session(&self) -> &AppSession {
        &self.session
    }
}
