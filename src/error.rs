use std::path::PathBuf;

/// Errors surfaced by the loaders and the event loop.
///
/// Most of these never reach the user: the feature that hit them logs and
/// carries on with its default.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed ini {path}: {source}")]
    Ini {
        path: PathBuf,
        #[source]
        source: ini::ParseError,
    },

    #[error("malformed json {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("skin not found: {0}")]
    SkinNotFound(String),

    #[error("audio output unavailable: {0}")]
    Audio(String),

    #[error("gamepad backend unavailable: {0}")]
    Gamepad(String),

    #[error("tray icon unavailable: {0}")]
    Tray(String),

    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("autostart registration failed: {0}")]
    Autostart(String),

    #[error("event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window creation: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("gpu surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable gpu adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("gpu device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("no config directory available on this platform")]
    NoConfigDir,
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
