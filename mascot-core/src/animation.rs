//! Animation definitions and the validated animation table

use crate::{Error, Frame, FrameSize, Result};
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use std::io::{Read, Write};

/// What happens when an animation is requested while another one is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum InterruptionPolicy {
    /// Wait until the active animation and everything queued before it completes
    Queue,
    /// Cancel the active animation and start immediately
    Preempt,
}

/// A named, ordered sequence of frames
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnimationDefinition {
    pub name: String,
    pub frames: Vec<Frame>,
    pub policy: InterruptionPolicy,
}

impl AnimationDefinition {
    /// Creates a new animation definition
    pub fn new(name: impl Into<String>, frames: Vec<Frame>, policy: InterruptionPolicy) -> Self {
        Self {
            name: name.into(),
            frames,
            policy,
        }
    }

    /// Total playback time of one run, in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.frames
            .iter()
            .fold(0u64, |total, f| total.saturating_add(f.duration_ms))
    }

    fn validate(&self, frame_size: FrameSize) -> Result<()> {
        if self.frames.is_empty() {
            return Err(Error::EmptyAnimation(self.name.clone()));
        }

        for (index, frame) in self.frames.iter().enumerate() {
            if frame.duration_ms == 0 {
                return Err(Error::ZeroFrameDuration {
                    name: self.name.clone(),
                    index,
                });
            }
            if frame.region.size() != frame_size {
                return Err(Error::FrameSizeMismatch {
                    name: self.name.clone(),
                    index,
                    width: frame.region.width,
                    height: frame.region.height,
                    expected_width: frame_size.width,
                    expected_height: frame_size.height,
                });
            }
        }

        Ok(())
    }
}

/// Handle to an animation inside one [`AnimationTable`].
///
/// Only produced by [`AnimationTable::resolve`], so it always refers to a
/// valid definition of the table that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationId(usize);

impl AnimationId {
    /// Position of the definition inside its table
    pub fn index(self) -> usize {
        self.0
    }
}

/// Validated mapping from animation name to definition
#[derive(Debug, Clone)]
pub struct AnimationTable {
    frame_size: FrameSize,
    animations: Vec<AnimationDefinition>,
    index: HashMap<String, AnimationId>,
}

impl AnimationTable {
    /// Builds a table, rejecting empty animations, zero-length frames,
    /// duplicate names and frames whose region does not match `frame_size`
    pub fn new(frame_size: FrameSize, animations: Vec<AnimationDefinition>) -> Result<Self> {
        let mut index = HashMap::with_capacity(animations.len());

        for (i, animation) in animations.iter().enumerate() {
            animation.validate(frame_size)?;
            if index.insert(animation.name.clone(), AnimationId(i)).is_some() {
                return Err(Error::DuplicateAnimation(animation.name.clone()));
            }
        }

        Ok(Self {
            frame_size,
            animations,
            index,
        })
    }

    /// Size every frame of this table shares
    pub fn frame_size(&self) -> FrameSize {
        self.frame_size
    }

    /// Resolves a name to a handle
    pub fn resolve(&self, name: &str) -> Option<AnimationId> {
        self.index.get(name).copied()
    }

    /// Resolves a name, failing with [`Error::AnimationNotFound`]
    pub fn require(&self, name: &str) -> Result<AnimationId> {
        self.resolve(name)
            .ok_or_else(|| Error::AnimationNotFound(name.to_string()))
    }

    /// Gets the definition behind a handle
    pub fn get(&self, id: AnimationId) -> &AnimationDefinition {
        &self.animations[id.0]
    }

    /// Gets a definition by name
    pub fn get_by_name(&self, name: &str) -> Option<&AnimationDefinition> {
        self.resolve(name).map(|id| self.get(id))
    }

    /// Iterates definitions in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &AnimationDefinition> {
        self.animations.iter()
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}

/// On-disk layout of an animation table
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct TableFile {
    frame_size: FrameSize,
    animations: Vec<AnimationDefinition>,
}

#[cfg(feature = "serde")]
impl AnimationTable {
    /// Reads and validates a JSON animation table
    pub fn read_json<R: Read>(reader: R) -> Result<Self> {
        let file: TableFile = serde_json::from_reader(reader)?;
        Self::new(file.frame_size, file.animations)
    }

    /// Writes the table as pretty-printed JSON
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        let file = TableFile {
            frame_size: self.frame_size,
            animations: self.animations.clone(),
        };
        serde_json::to_writer_pretty(writer, &file)?;
        Ok(())
    }
}
