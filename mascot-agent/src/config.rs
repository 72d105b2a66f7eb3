//! Agent configuration

use crate::Easing;
use mascot_core::{sprites, LogicalPosition};
use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where a new move starts when another transition is still in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MoveOrigin {
    /// Start from wherever the agent is currently drawn
    #[default]
    Rendered,
    /// Start from the last committed position
    Committed,
}

/// Agent behaviour configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AgentConfig {
    /// Position the agent starts at
    pub initial_position: LogicalPosition,
    /// Duration used by `move_to` when none is given
    pub move_duration_ms: u64,
    /// How long a bubble stays before fading out, when none is given
    pub speak_duration_ms: u64,
    /// Duration of the bubble fade in and fade out
    pub bubble_fade_ms: u64,
    /// Easing curve of position transitions
    pub easing: Easing,
    /// Start point policy for overlapping moves
    pub move_origin: MoveOrigin,
    /// Animation played by `show`
    pub idle_animation: String,
    /// Initial viewport size, used to clamp the position
    pub viewport: Option<(u32, u32)>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            initial_position: LogicalPosition::new(20.0, 20.0),
            move_duration_ms: 1000,
            speak_duration_ms: 3000,
            bubble_fade_ms: 300,
            easing: Easing::EaseInOut,
            move_origin: MoveOrigin::Rendered,
            idle_animation: "Idle".to_string(),
            viewport: None,
        }
    }
}

/// Options for loading an agent from disk
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Directory containing `agents/<name>/`
    pub base_path: PathBuf,
    /// Agent directory name
    pub agent_name: String,
    pub config: AgentConfig,
}

impl AgentOptions {
    /// Options for the bundled agent under `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            agent_name: sprites::CLIPPY.to_string(),
            config: AgentConfig::default(),
        }
    }

    /// Selects a different agent directory
    pub fn with_agent(mut self, name: impl Into<String>) -> Self {
        self.agent_name = name.into();
        self
    }

    /// Replaces the behaviour configuration
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self::new("")
    }
}
