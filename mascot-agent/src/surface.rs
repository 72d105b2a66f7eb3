//! Visual surface abstraction and a recording implementation
//!
//! A [`Surface`] is whatever actually shows the agent: a window, a web page
//! bridge, or the raster canvas in [`crate::raster`]. The agent only talks to
//! it through these primitives.

use crate::bubble::BubbleId;
use crate::motion::Transition;
use mascot_core::{Frame, LogicalPosition, RenderOffset, SourceRegion};
use std::collections::BTreeMap;

/// Primitives the agent needs from its visual surface
pub trait Surface {
    /// Attaches the agent's root box. Attaching an attached root is a no-op.
    fn attach_root(&mut self);

    /// Detaches the root box together with every bubble inside it
    fn detach_root(&mut self);

    /// Whether the root box is currently attached
    fn is_attached(&self) -> bool;

    /// Shows `region` of the sprite sheet at `offset` inside the root box
    fn render_sprite(&mut self, region: SourceRegion, offset: RenderOffset);

    /// Starts driving the root box's position with `transition`
    fn begin_transition(&mut self, transition: &Transition);

    /// Writes the root box's resting position
    fn set_position(&mut self, position: LogicalPosition);

    /// Creates an invisible bubble holding `text`
    fn create_bubble(&mut self, id: BubbleId, text: &str);

    /// Fades a bubble to `opacity` over `fade_ms`
    fn fade_bubble(&mut self, id: BubbleId, opacity: f32, fade_ms: u64);

    /// Removes a bubble; unknown ids are ignored
    fn remove_bubble(&mut self, id: BubbleId);

    /// Informs the surface of a new viewport size
    fn set_viewport(&mut self, _width: u32, _height: u32) {}
}

/// Frame renderer: points the surface at the frame's sprite region and offset
pub fn render_frame<S: Surface + ?Sized>(surface: &mut S, frame: &Frame) {
    surface.render_sprite(frame.region, frame.offset);
}

/// Everything a [`RecordingSurface`] was asked to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Attached,
    Detached,
    Sprite {
        region: SourceRegion,
        offset: RenderOffset,
    },
    TransitionStarted(Transition),
    Position(LogicalPosition),
    BubbleCreated {
        id: BubbleId,
        text: String,
    },
    BubbleFaded {
        id: BubbleId,
        opacity: f32,
        fade_ms: u64,
    },
    BubbleRemoved(BubbleId),
    Viewport {
        width: u32,
        height: u32,
    },
}

/// A bubble as currently held by a [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBubble {
    pub text: String,
    pub opacity: f32,
}

/// Headless surface that keeps the current visual state and a log of calls
#[derive(Debug, Default)]
pub struct RecordingSurface {
    attached: bool,
    sprite: Option<(SourceRegion, RenderOffset)>,
    position: Option<LogicalPosition>,
    bubbles: BTreeMap<BubbleId, RecordedBubble>,
    events: Vec<SurfaceEvent>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls received so far
    pub fn events(&self) -> &[SurfaceEvent] {
        &self.events
    }

    /// Forgets the call log, keeping the visual state
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Sprite region and offset currently shown
    pub fn sprite(&self) -> Option<(SourceRegion, RenderOffset)> {
        self.sprite
    }

    /// Last resting position written
    pub fn position(&self) -> Option<LogicalPosition> {
        self.position
    }

    /// Bubbles currently present
    pub fn bubbles(&self) -> &BTreeMap<BubbleId, RecordedBubble> {
        &self.bubbles
    }

    /// Transitions started so far, oldest first
    pub fn transitions(&self) -> Vec<Transition> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::TransitionStarted(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    /// Sprite regions rendered so far, oldest first
    pub fn rendered_regions(&self) -> Vec<SourceRegion> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::Sprite { region, .. } => Some(*region),
                _ => None,
            })
            .collect()
    }

    /// Number of times the root was actually attached
    pub fn attach_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SurfaceEvent::Attached))
            .count()
    }
}

impl Surface for RecordingSurface {
    fn attach_root(&mut self) {
        if !self.attached {
            self.attached = true;
            self.events.push(SurfaceEvent::Attached);
        }
    }

    fn detach_root(&mut self) {
        if self.attached {
            self.attached = false;
            self.bubbles.clear();
            self.events.push(SurfaceEvent::Detached);
        }
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn render_sprite(&mut self, region: SourceRegion, offset: RenderOffset) {
        self.sprite = Some((region, offset));
        self.events.push(SurfaceEvent::Sprite { region, offset });
    }

    fn begin_transition(&mut self, transition: &Transition) {
        self.events.push(SurfaceEvent::TransitionStarted(*transition));
    }

    fn set_position(&mut self, position: LogicalPosition) {
        self.position = Some(position);
        self.events.push(SurfaceEvent::Position(position));
    }

    fn create_bubble(&mut self, id: BubbleId, text: &str) {
        self.bubbles.insert(
            id,
            RecordedBubble {
                text: text.to_string(),
                opacity: 0.0,
            },
        );
        self.events.push(SurfaceEvent::BubbleCreated {
            id,
            text: text.to_string(),
        });
    }

    fn fade_bubble(&mut self, id: BubbleId, opacity: f32, fade_ms: u64) {
        if let Some(bubble) = self.bubbles.get_mut(&id) {
            bubble.opacity = opacity;
            self.events.push(SurfaceEvent::BubbleFaded {
                id,
                opacity,
                fade_ms,
            });
        }
    }

    fn remove_bubble(&mut self, id: BubbleId) {
        if self.bubbles.remove(&id).is_some() {
            self.events.push(SurfaceEvent::BubbleRemoved(id));
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.events.push(SurfaceEvent::Viewport { width, height });
    }
}
