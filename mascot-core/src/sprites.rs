//! Built-in sprite data for the bundled agents

use crate::{
    AnimationDefinition, AnimationTable, Frame, FrameSize, InterruptionPolicy, RenderOffset,
    Result, SourceRegion,
};

/// Name of the bundled agent
pub const CLIPPY: &str = "Clippy";

/// Frame size of the Clippy sprite sheet
pub const CLIPPY_FRAME_SIZE: FrameSize = FrameSize {
    width: 124,
    height: 93,
};

fn clippy_frame(x: u32, y: u32, duration_ms: u64, dy: i32) -> Frame {
    Frame::new(
        duration_ms,
        SourceRegion::new(x, y, CLIPPY_FRAME_SIZE.width, CLIPPY_FRAME_SIZE.height),
        RenderOffset::new(0, dy),
    )
}

/// Animation table for the Clippy sprite sheet
pub fn clippy_animations() -> Result<AnimationTable> {
    AnimationTable::new(
        CLIPPY_FRAME_SIZE,
        vec![
            AnimationDefinition::new(
                "Idle",
                vec![clippy_frame(0, 0, 400, 0)],
                InterruptionPolicy::Preempt,
            ),
            AnimationDefinition::new(
                "Wave",
                vec![clippy_frame(124, 0, 400, -10), clippy_frame(0, 0, 400, 0)],
                InterruptionPolicy::Queue,
            ),
        ],
    )
}
