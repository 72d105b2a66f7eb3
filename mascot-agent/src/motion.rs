//! Position controller: eased moves over a committed logical position
//!
//! The committed [`LogicalPosition`] is only written when a transition
//! completes (or when the viewport forces a reclamp). Every transition carries
//! a generation number; starting a new one supersedes the previous, and a
//! completion whose generation is no longer current is ignored.

use crate::{Easing, MoveOrigin};
use mascot_core::LogicalPosition;

/// A two-keyframe eased move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// Start keyframe
    pub from: LogicalPosition,
    /// End keyframe
    pub to: LogicalPosition,
    /// Logical time the transition started at
    pub start_ms: u64,
    pub duration_ms: u64,
    pub easing: Easing,
    /// Identifies the transition; increases with every move
    pub generation: u64,
}

impl Transition {
    /// Linear progress at `now_ms`, in `[0, 1]`
    pub fn progress(&self, now_ms: u64) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.start_ms) as f64;
        (elapsed / self.duration_ms as f64).clamp(0.0, 1.0)
    }

    /// Eased position at `now_ms`
    pub fn sample(&self, now_ms: u64) -> LogicalPosition {
        let t = self.easing.apply(self.progress(now_ms));
        self.from.lerp(self.to, t)
    }

    /// Logical time the transition finishes at
    pub fn end_ms(&self) -> u64 {
        self.start_ms.saturating_add(self.duration_ms)
    }
}

/// Owns the agent's committed position and the transition driving it
#[derive(Debug)]
pub struct PositionController {
    committed: LogicalPosition,
    in_flight: Option<Transition>,
    generation: u64,
    origin: MoveOrigin,
    easing: Easing,
}

impl PositionController {
    /// Creates a controller resting at `initial`
    pub fn new(initial: LogicalPosition, origin: MoveOrigin, easing: Easing) -> Self {
        Self {
            committed: initial,
            in_flight: None,
            generation: 0,
            origin,
            easing,
        }
    }

    /// Last committed position
    pub fn committed(&self) -> LogicalPosition {
        self.committed
    }

    /// Position currently drawn: the in-flight sample, or the committed one
    pub fn rendered(&self, now_ms: u64) -> LogicalPosition {
        match &self.in_flight {
            Some(transition) => transition.sample(now_ms),
            None => self.committed,
        }
    }

    /// The transition currently driving the rendered position
    pub fn in_flight(&self) -> Option<&Transition> {
        self.in_flight.as_ref()
    }

    /// Starts a transition to `target`, superseding any in-flight one
    pub fn begin(&mut self, target: LogicalPosition, duration_ms: u64, now_ms: u64) -> Transition {
        let from = match self.origin {
            MoveOrigin::Rendered => self.rendered(now_ms),
            MoveOrigin::Committed => self.committed,
        };

        self.generation += 1;
        let transition = Transition {
            from,
            to: target,
            start_ms: now_ms,
            duration_ms,
            easing: self.easing,
            generation: self.generation,
        };

        if let Some(previous) = self.in_flight.replace(transition) {
            tracing::debug!(
                superseded = previous.generation,
                generation = transition.generation,
                "Transition superseded"
            );
        }

        transition
    }

    /// Commits the target of transition `generation` if it is still current.
    ///
    /// Returns the new committed position, or `None` for a stale completion.
    pub fn complete(&mut self, generation: u64) -> Option<LogicalPosition> {
        match self.in_flight {
            Some(transition) if transition.generation == generation => {
                self.in_flight = None;
                self.committed = transition.to;
                Some(transition.to)
            }
            _ => {
                tracing::debug!(generation, "Ignoring stale transition completion");
                None
            }
        }
    }

    /// Clamps the rendered position into `viewport` and commits it directly.
    ///
    /// Any in-flight transition is superseded.
    pub fn reclamp(
        &mut self,
        viewport: (u32, u32),
        agent: (u32, u32),
        now_ms: u64,
    ) -> LogicalPosition {
        let clamped = self.rendered(now_ms).clamp_within(viewport, agent);
        if self.in_flight.take().is_some() {
            self.generation += 1;
        }
        self.committed = clamped;
        clamped
    }
}
