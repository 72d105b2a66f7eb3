//! Frame data structures for sprite-sheet animations

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Size of a single sprite frame in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    /// Creates a new frame size
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Region of the sprite sheet shown by a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceRegion {
    /// Left edge of the region on the sheet
    pub x: u32,
    /// Top edge of the region on the sheet
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SourceRegion {
    /// Creates a new source region
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the size of this region
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }
}

/// Local offset applied to the sprite while a frame is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderOffset {
    pub dx: i32,
    pub dy: i32,
}

impl RenderOffset {
    /// Creates a new render offset
    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// A single timed sample of an animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame {
    /// How long the frame stays on screen, in milliseconds
    pub duration_ms: u64,
    /// Sprite sheet region to display
    pub region: SourceRegion,
    /// Offset relative to the agent's box (can be negative)
    #[cfg_attr(feature = "serde", serde(default))]
    pub offset: RenderOffset,
}

impl Frame {
    /// Creates a new frame
    pub fn new(duration_ms: u64, region: SourceRegion, offset: RenderOffset) -> Self {
        Self {
            duration_ms,
            region,
            offset,
        }
    }
}
