//! Logical agent position, expressed as offsets from the right and bottom edges

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Committed agent position.
///
/// Offsets are measured from the right and bottom viewport edges to the
/// matching edges of the agent's box, so `(0, 0)` is the bottom-right corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LogicalPosition {
    pub right: f64,
    pub bottom: f64,
}

impl LogicalPosition {
    /// Creates a new position
    pub fn new(right: f64, bottom: f64) -> Self {
        Self { right, bottom }
    }

    /// Linear interpolation between two positions, `t` in `[0, 1]`
    pub fn lerp(self, to: Self, t: f64) -> Self {
        Self {
            right: (to.right - self.right).mul_add(t, self.right),
            bottom: (to.bottom - self.bottom).mul_add(t, self.bottom),
        }
    }

    /// Clamps the position so a box of `agent` size stays inside `viewport`
    pub fn clamp_within(self, viewport: (u32, u32), agent: (u32, u32)) -> Self {
        let max_right = viewport.0.saturating_sub(agent.0) as f64;
        let max_bottom = viewport.1.saturating_sub(agent.1) as f64;
        Self {
            right: self.right.clamp(0.0, max_right),
            bottom: self.bottom.clamp(0.0, max_bottom),
        }
    }
}

impl fmt::Display for LogicalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "right: {}px, bottom: {}px", self.right, self.bottom)
    }
}
