//! Mascot Core Library
//!
//! This library provides the data model shared by mascot agents: sprite frames,
//! validated animation tables, logical positions and the built-in sprite data.

pub mod animation;
pub mod frame;
pub mod position;
pub mod sprites;

pub use animation::{AnimationDefinition, AnimationId, AnimationTable, InterruptionPolicy};
pub use frame::{Frame, FrameSize, RenderOffset, SourceRegion};
pub use position::LogicalPosition;

/// Result type for mascot-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for mascot-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Animation not found: {0}")]
    AnimationNotFound(String),

    #[error("Animation '{0}' has no frames")]
    EmptyAnimation(String),

    #[error("Animation '{name}' frame {index} has a zero duration")]
    ZeroFrameDuration { name: String, index: usize },

    #[error("Duplicate animation name: {0}")]
    DuplicateAnimation(String),

    #[error(
        "Animation '{name}' frame {index} is {width}x{height}, expected {expected_width}x{expected_height}"
    )]
    FrameSizeMismatch {
        name: String,
        index: usize,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
}
