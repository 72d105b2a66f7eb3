//! Mascot Agent Library
//!
//! This library animates a sprite-sheet character on a [`Surface`]: it plays
//! timed frame sequences, moves the character with eased transitions and shows
//! speech bubbles, all driven by a logical clock the host advances.

pub mod agent;
pub mod bubble;
pub mod config;
pub mod easing;
pub mod loader;
pub mod motion;
pub mod playback;
pub mod raster;
pub mod scheduler;
pub mod surface;

use std::path::PathBuf;

pub use agent::Agent;
pub use bubble::{BubbleId, BubblePhase};
pub use config::{AgentConfig, AgentOptions, MoveOrigin};
pub use easing::Easing;
pub use loader::{init, init_with, load_agent, LoadedAgent, SpriteSheet};
pub use motion::Transition;
pub use playback::{Completion, PlaybackOutcome};
pub use raster::RasterSurface;
pub use surface::{RecordingSurface, Surface, SurfaceEvent};

/// Result type for mascot-agent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for mascot-agent operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Mascot core error: {0}")]
    Core(#[from] mascot_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load sprite sheet {}: {source}", .path.display())]
    AssetLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("No animation table for agent '{agent}' (looked for {})", .path.display())]
    MissingAnimationTable { agent: String, path: PathBuf },

    #[error("Animation '{animation}' frame {index} lies outside the {width}x{height} sprite sheet")]
    RegionOutOfBounds {
        animation: String,
        index: usize,
        width: u32,
        height: u32,
    },
}
