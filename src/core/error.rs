//! Engine error types

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Stage of asset handling that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetPhase {
    /// Opening or reading the file
    Open,
    /// Decoding the file contents
    Decode,
    /// Producing a derived payload (e.g. rasterising text)
    Render,
}

impl fmt::Display for AssetPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Decode => write!(f, "decode"),
            Self::Render => write!(f, "render"),
        }
    }
}

/// Failure to load an image, font or sound asset
#[derive(Debug, Error)]
#[error("asset failure: filename={} phase={phase}: {reason}", .filename.display())]
pub struct AssetError {
    /// File the asset was loaded from
    pub filename: PathBuf,
    /// Phase in which the failure happened
    pub phase: AssetPhase,
    /// Underlying cause
    pub reason: String,
}

impl AssetError {
    /// Create a new asset error
    pub fn new(filename: impl Into<PathBuf>, phase: AssetPhase, reason: impl fmt::Display) -> Self {
        Self {
            filename: filename.into(),
            phase,
            reason: reason.to_string(),
        }
    }
}

/// Errors surfaced by the engine runtime
#[derive(Debug, Error)]
pub enum EngineError {
    /// A second component of the same concrete type was added to an entity
    #[error("entity {entity} already has a component of type {component}")]
    DuplicateComponent {
        /// Entity display name
        entity: String,
        /// Component type name
        component: &'static str,
    },

    /// An asset could not be loaded
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// An event pool with the same name already exists
    #[error("event pool '{0}' already exists")]
    PoolExists(String),

    /// A register and a delegate disagree on the payload type
    #[error("delegate '{delegate}' publishes {published}, register expects {expected}")]
    PayloadMismatch {
        /// Delegate name
        delegate: String,
        /// Payload type the delegate publishes
        published: &'static str,
        /// Payload type the register was created for
        expected: &'static str,
    },

    /// No factory is registered under this component name
    #[error("unknown component type '{0}'")]
    UnknownComponent(String),

    /// A component data bag could not be applied
    #[error("invalid component data: {0}")]
    ComponentData(String),

    /// Window, renderer or audio device failure
    #[error("platform error: {0}")]
    Platform(String),

    /// Configuration could not be read or parsed
    #[error("config error: {0}")]
    Config(String),

    /// I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
