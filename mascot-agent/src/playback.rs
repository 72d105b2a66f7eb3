//! Playback engine: frame sequencing with queueing and preemption
//!
//! The engine is a small state machine. It is either [`PlaybackState::Idle`]
//! or playing exactly one animation, whose next frame is a single pending
//! timer in the agent's scheduler. Requests arriving mid-playback are queued
//! or preempt the active animation depending on the requested animation's
//! [`InterruptionPolicy`].

use crate::agent::AgentEvent;
use crate::scheduler::{Scheduler, TimerId};
use crate::surface::{render_frame, Surface};
use mascot_core::{AnimationId, AnimationTable, InterruptionPolicy};
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

/// How a `play` request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every frame was shown
    Completed,
    /// Another animation took over before the last frame finished
    Preempted,
    /// The agent was hidden while the animation was playing
    Cancelled,
    /// The agent was hidden while the animation was still queued
    Discarded,
    /// The animation name is not in the table
    NotFound,
}

/// Completion signal returned by `play`.
///
/// Resolves exactly once; clones observe the same outcome.
#[derive(Debug, Clone, Default)]
pub struct Completion(Rc<Cell<Option<PlaybackOutcome>>>);

impl Completion {
    fn pending() -> Self {
        Self::default()
    }

    fn resolved(outcome: PlaybackOutcome) -> Self {
        let completion = Self::pending();
        completion.resolve(outcome);
        completion
    }

    fn resolve(&self, outcome: PlaybackOutcome) {
        if self.0.get().is_none() {
            self.0.set(Some(outcome));
        }
    }

    /// Outcome, once resolved
    pub fn outcome(&self) -> Option<PlaybackOutcome> {
        self.0.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.0.get().is_some()
    }
}

/// The animation currently occupying the frame timer
#[derive(Debug)]
pub struct ActivePlayback {
    pub animation: AnimationId,
    pub frame_index: usize,
    timer: TimerId,
    completion: Completion,
}

/// Playback state of one agent
#[derive(Debug, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing(ActivePlayback),
}

/// A queued request waiting for the active animation to finish
#[derive(Debug)]
struct PendingStart {
    animation: AnimationId,
    completion: Completion,
}

/// Drives frame advance for one agent
#[derive(Debug, Default)]
pub struct PlaybackEngine {
    state: PlaybackState,
    pending: VecDeque<PendingStart>,
}

impl PlaybackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests playback of `name`.
    ///
    /// Unknown names are logged and resolve immediately with
    /// [`PlaybackOutcome::NotFound`] without touching the current playback.
    pub fn play<S: Surface + ?Sized>(
        &mut self,
        name: &str,
        table: &AnimationTable,
        scheduler: &mut Scheduler<AgentEvent>,
        surface: &mut S,
    ) -> Completion {
        let Some(animation) = table.resolve(name) else {
            tracing::warn!(animation = name, "Animation not found");
            return Completion::resolved(PlaybackOutcome::NotFound);
        };

        let completion = Completion::pending();

        if let PlaybackState::Playing(active) = &self.state {
            match table.get(animation).policy {
                InterruptionPolicy::Queue => {
                    tracing::debug!(animation = name, queued = self.pending.len() + 1, "Queued");
                    self.pending.push_back(PendingStart {
                        animation,
                        completion: completion.clone(),
                    });
                    return completion;
                }
                InterruptionPolicy::Preempt => {
                    tracing::debug!(
                        animation = name,
                        preempted = %table.get(active.animation).name,
                        "Preempting"
                    );
                    self.interrupt(scheduler, PlaybackOutcome::Preempted);
                }
            }
        }

        self.start(animation, completion.clone(), table, scheduler, surface);
        completion
    }

    /// Handles a fired frame timer
    pub fn on_frame_elapsed<S: Surface + ?Sized>(
        &mut self,
        timer: TimerId,
        table: &AnimationTable,
        scheduler: &mut Scheduler<AgentEvent>,
        surface: &mut S,
    ) {
        let PlaybackState::Playing(active) = &mut self.state else {
            return;
        };
        if active.timer != timer {
            return;
        }

        let definition = table.get(active.animation);
        active.frame_index += 1;

        if let Some(frame) = definition.frames.get(active.frame_index) {
            render_frame(surface, frame);
            active.timer = scheduler.schedule(frame.duration_ms, AgentEvent::FrameElapsed);
            return;
        }

        let finished = std::mem::take(&mut self.state);
        if let Some(next) = self.pending.pop_front() {
            self.start(next.animation, next.completion, table, scheduler, surface);
        }
        if let PlaybackState::Playing(finished) = finished {
            tracing::debug!(animation = %definition.name, "Animation completed");
            finished.completion.resolve(PlaybackOutcome::Completed);
        }
    }

    /// Cancels the active animation and discards everything queued
    pub fn stop(&mut self, scheduler: &mut Scheduler<AgentEvent>) {
        self.interrupt(scheduler, PlaybackOutcome::Cancelled);
        for pending in self.pending.drain(..) {
            pending.completion.resolve(PlaybackOutcome::Discarded);
        }
    }

    /// Active animation and the index of the frame on screen
    pub fn active(&self) -> Option<(AnimationId, usize)> {
        match &self.state {
            PlaybackState::Playing(active) => Some((active.animation, active.frame_index)),
            PlaybackState::Idle => None,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Number of queued requests
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn interrupt(&mut self, scheduler: &mut Scheduler<AgentEvent>, outcome: PlaybackOutcome) {
        if let PlaybackState::Playing(active) = std::mem::take(&mut self.state) {
            scheduler.cancel(active.timer);
            active.completion.resolve(outcome);
        }
    }

    fn start<S: Surface + ?Sized>(
        &mut self,
        animation: AnimationId,
        completion: Completion,
        table: &AnimationTable,
        scheduler: &mut Scheduler<AgentEvent>,
        surface: &mut S,
    ) {
        let definition = table.get(animation);
        let first = &definition.frames[0];

        tracing::debug!(
            animation = %definition.name,
            frames = definition.frames.len(),
            "Animation started"
        );
        render_frame(surface, first);
        let timer = scheduler.schedule(first.duration_ms, AgentEvent::FrameElapsed);

        self.state = PlaybackState::Playing(ActivePlayback {
            animation,
            frame_index: 0,
            timer,
            completion,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;
    use mascot_core::{
        AnimationDefinition, Frame, FrameSize, RenderOffset, SourceRegion,
    };

    struct Harness {
        engine: PlaybackEngine,
        table: AnimationTable,
        scheduler: Scheduler<AgentEvent>,
        surface: RecordingSurface,
    }

    fn frame(x: u32, duration_ms: u64) -> Frame {
        Frame::new(duration_ms, SourceRegion::new(x, 0, 10, 10), RenderOffset::default())
    }

    impl Harness {
        fn new() -> Self {
            let table = AnimationTable::new(
                FrameSize::new(10, 10),
                vec![
                    AnimationDefinition::new("Idle", vec![frame(0, 400)], InterruptionPolicy::Preempt),
                    AnimationDefinition::new(
                        "Wave",
                        vec![frame(10, 100), frame(20, 200), frame(30, 300)],
                        InterruptionPolicy::Queue,
                    ),
                    AnimationDefinition::new("Nod", vec![frame(40, 50)], InterruptionPolicy::Queue),
                    AnimationDefinition::new(
                        "Alert",
                        vec![frame(50, 70), frame(60, 70)],
                        InterruptionPolicy::Preempt,
                    ),
                ],
            )
            .unwrap();

            Self {
                engine: PlaybackEngine::new(),
                table,
                scheduler: Scheduler::new(),
                surface: RecordingSurface::new(),
            }
        }

        fn play(&mut self, name: &str) -> Completion {
            self.engine
                .play(name, &self.table, &mut self.scheduler, &mut self.surface)
        }

        fn advance_to(&mut self, until_ms: u64) {
            while let Some((timer, event)) = self.scheduler.pop_due(until_ms) {
                if let AgentEvent::FrameElapsed = event {
                    self.engine.on_frame_elapsed(
                        timer,
                        &self.table,
                        &mut self.scheduler,
                        &mut self.surface,
                    );
                }
            }
            self.scheduler.set_now(until_ms);
        }

        fn active_name(&self) -> Option<&str> {
            self.engine
                .active()
                .map(|(id, _)| self.table.get(id).name.as_str())
        }

        fn xs(&self) -> Vec<u32> {
            self.surface.rendered_regions().iter().map(|r| r.x).collect()
        }
    }

    #[test]
    fn test_frames_render_in_order_with_declared_spacing() {
        let mut h = Harness::new();
        let done = h.play("Wave");
        assert_eq!(h.xs(), vec![10]);

        h.advance_to(99);
        assert_eq!(h.xs(), vec![10]);
        h.advance_to(100);
        assert_eq!(h.xs(), vec![10, 20]);
        h.advance_to(299);
        assert_eq!(h.xs(), vec![10, 20]);
        h.advance_to(300);
        assert_eq!(h.xs(), vec![10, 20, 30]);
        assert_eq!(h.engine.active().map(|(_, i)| i), Some(2));
        assert!(!done.is_resolved());

        h.advance_to(600);
        assert_eq!(h.xs(), vec![10, 20, 30]);
        assert_eq!(done.outcome(), Some(PlaybackOutcome::Completed));
        assert!(h.engine.active().is_none());
        assert!(h.scheduler.is_empty());
    }

    #[test]
    fn test_queue_runs_fifo_after_active_completes() {
        let mut h = Harness::new();
        let wave = h.play("Wave");
        let nod = h.play("Nod");
        let wave_again = h.play("Wave");

        assert_eq!(h.engine.pending_len(), 2);
        assert_eq!(h.active_name(), Some("Wave"));

        h.advance_to(600);
        assert_eq!(wave.outcome(), Some(PlaybackOutcome::Completed));
        assert_eq!(h.active_name(), Some("Nod"));
        assert!(!nod.is_resolved());

        h.advance_to(650);
        assert_eq!(nod.outcome(), Some(PlaybackOutcome::Completed));
        assert_eq!(h.active_name(), Some("Wave"));

        h.advance_to(1250);
        assert_eq!(wave_again.outcome(), Some(PlaybackOutcome::Completed));
        assert_eq!(h.xs(), vec![10, 20, 30, 40, 10, 20, 30]);
    }

    #[test]
    fn test_preempt_cancels_active_in_same_tick() {
        let mut h = Harness::new();
        let wave = h.play("Wave");
        h.advance_to(150);

        let alert = h.play("Alert");
        assert_eq!(wave.outcome(), Some(PlaybackOutcome::Preempted));
        assert_eq!(h.active_name(), Some("Alert"));
        assert_eq!(h.xs(), vec![10, 20, 50]);
        // Only the new frame timer is pending
        assert_eq!(h.scheduler.len(), 1);

        h.advance_to(290);
        assert_eq!(alert.outcome(), Some(PlaybackOutcome::Completed));
        assert_eq!(h.xs(), vec![10, 20, 50, 60]);
    }

    #[test]
    fn test_preempt_keeps_queue() {
        let mut h = Harness::new();
        h.play("Wave");
        let nod = h.play("Nod");
        h.play("Idle");

        assert_eq!(h.active_name(), Some("Idle"));
        assert_eq!(h.engine.pending_len(), 1);

        h.advance_to(400);
        assert_eq!(h.active_name(), Some("Nod"));
        h.advance_to(450);
        assert_eq!(nod.outcome(), Some(PlaybackOutcome::Completed));
    }

    #[test]
    fn test_queue_policy_starts_immediately_when_idle() {
        let mut h = Harness::new();
        h.play("Nod");
        assert_eq!(h.active_name(), Some("Nod"));
        assert_eq!(h.engine.pending_len(), 0);
    }

    #[test]
    fn test_unknown_animation_is_noop() {
        let mut h = Harness::new();
        h.play("Wave");
        h.advance_to(100);

        let missing = h.play("InvalidAnimation");
        assert_eq!(missing.outcome(), Some(PlaybackOutcome::NotFound));
        assert_eq!(h.active_name(), Some("Wave"));
        assert_eq!(h.engine.active().map(|(_, i)| i), Some(1));
        assert_eq!(h.xs(), vec![10, 20]);
    }

    #[test]
    fn test_single_active_animation() {
        let mut h = Harness::new();
        for (i, name) in ["Wave", "Alert", "Nod", "Idle", "Wave", "Alert"].iter().enumerate() {
            h.play(name);
            h.advance_to(i as u64 * 35);
            // One frame timer at most, never two
            assert!(h.scheduler.len() <= 1);
        }
    }

    #[test]
    fn test_stop_cancels_and_discards() {
        let mut h = Harness::new();
        let wave = h.play("Wave");
        let nod = h.play("Nod");

        h.engine.stop(&mut h.scheduler);
        assert_eq!(wave.outcome(), Some(PlaybackOutcome::Cancelled));
        assert_eq!(nod.outcome(), Some(PlaybackOutcome::Discarded));
        assert!(h.engine.active().is_none());
        assert!(h.scheduler.is_empty());
    }
}
