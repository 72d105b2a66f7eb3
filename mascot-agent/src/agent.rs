//! The composed agent: playback, movement, bubbles and visibility over one surface

use crate::bubble::{BubbleId, BubbleManager, BubbleStage};
use crate::motion::{PositionController, Transition};
use crate::playback::{Completion, PlaybackEngine};
use crate::scheduler::{Scheduler, TimerId};
use crate::surface::Surface;
use crate::AgentConfig;
use mascot_core::{AnimationDefinition, AnimationTable, LogicalPosition};

/// Events the agent schedules on its own clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentEvent {
    /// The frame on screen has been shown for its full duration
    FrameElapsed,
    /// A position transition ran to its end
    TransitionFinished { generation: u64 },
    /// A bubble lifecycle step is due
    Bubble(BubbleId, BubbleStage),
}

/// One animated character on one surface.
///
/// Nothing here returns an error once the agent exists: bad animation names
/// are logged and ignored. Time only moves through [`Agent::advance_to`] and
/// [`Agent::advance_by`]; work that is due immediately (the first frame of an
/// animation, a zero-duration move) happens inside the call that caused it.
pub struct Agent<S: Surface> {
    table: AnimationTable,
    config: AgentConfig,
    scheduler: Scheduler<AgentEvent>,
    playback: PlaybackEngine,
    position: PositionController,
    bubbles: BubbleManager,
    viewport: Option<(u32, u32)>,
    surface: S,
}

impl<S: Surface> Agent<S> {
    /// Creates a hidden agent resting at the configured initial position
    pub fn new(table: AnimationTable, config: AgentConfig, mut surface: S) -> Self {
        let frame_size = table.frame_size();
        let viewport = config.viewport;
        let initial = match viewport {
            Some(vp) => config
                .initial_position
                .clamp_within(vp, (frame_size.width, frame_size.height)),
            None => config.initial_position,
        };

        if let Some((width, height)) = viewport {
            surface.set_viewport(width, height);
        }
        surface.set_position(initial);

        Self {
            position: PositionController::new(initial, config.move_origin, config.easing),
            bubbles: BubbleManager::new(config.bubble_fade_ms),
            scheduler: Scheduler::new(),
            playback: PlaybackEngine::new(),
            viewport,
            table,
            config,
            surface,
        }
    }

    /// Attaches the agent and starts the idle animation
    pub fn show(&mut self) -> Completion {
        if !self.surface.is_attached() {
            self.surface.attach_root();
            tracing::info!("Agent shown");
        }
        let idle = self.config.idle_animation.clone();
        self.play(&idle)
    }

    /// Detaches the agent, dropping its bubbles and any pending playback
    pub fn hide(&mut self) {
        self.playback.stop(&mut self.scheduler);
        self.bubbles.clear(&mut self.surface);
        if self.surface.is_attached() {
            self.surface.detach_root();
            tracing::info!("Agent hidden");
        }
    }

    pub fn is_visible(&self) -> bool {
        self.surface.is_attached()
    }

    /// Plays an animation by name; see [`PlaybackEngine::play`]
    pub fn play(&mut self, name: &str) -> Completion {
        let completion =
            self.playback
                .play(name, &self.table, &mut self.scheduler, &mut self.surface);
        self.run_due();
        completion
    }

    /// Moves to `(right, bottom)` over the configured default duration
    pub fn move_to(&mut self, right: f64, bottom: f64) {
        self.move_to_with_duration(right, bottom, self.config.move_duration_ms);
    }

    /// Moves to `(right, bottom)` over `duration_ms`.
    ///
    /// A zero duration commits before returning.
    pub fn move_to_with_duration(&mut self, right: f64, bottom: f64, duration_ms: u64) {
        let now = self.scheduler.now();
        let transition =
            self.position
                .begin(LogicalPosition::new(right, bottom), duration_ms, now);

        tracing::debug!(
            from = %transition.from,
            to = %transition.to,
            duration_ms,
            "Transition started"
        );
        self.surface.begin_transition(&transition);
        self.scheduler.schedule(
            duration_ms,
            AgentEvent::TransitionFinished {
                generation: transition.generation,
            },
        );
        self.run_due();
    }

    /// Shows a bubble for the configured default duration
    pub fn speak(&mut self, text: &str) -> BubbleId {
        self.speak_with_duration(text, self.config.speak_duration_ms)
    }

    /// Shows a bubble that starts fading out after `duration_ms`
    pub fn speak_with_duration(&mut self, text: &str, duration_ms: u64) -> BubbleId {
        let id = self
            .bubbles
            .speak(text, duration_ms, &mut self.scheduler, &mut self.surface);
        self.run_due();
        id
    }

    /// Records a new viewport size and clamps the agent back inside it
    pub fn resize_viewport(&mut self, width: u32, height: u32) {
        let frame_size = self.table.frame_size();
        self.viewport = Some((width, height));
        self.surface.set_viewport(width, height);

        let clamped = self.position.reclamp(
            (width, height),
            (frame_size.width, frame_size.height),
            self.scheduler.now(),
        );
        tracing::debug!(width, height, position = %clamped, "Viewport resized");
        self.surface.set_position(clamped);
    }

    /// Runs everything due up to `now_ms` and moves the clock there
    pub fn advance_to(&mut self, now_ms: u64) {
        if now_ms < self.scheduler.now() {
            tracing::warn!(
                now_ms,
                current = self.scheduler.now(),
                "Ignoring attempt to move the clock backwards"
            );
            return;
        }
        self.run_until(now_ms);
    }

    /// Advances the clock by `delta_ms`
    pub fn advance_by(&mut self, delta_ms: u64) {
        let target = self.scheduler.now().saturating_add(delta_ms);
        self.run_until(target);
    }

    /// Advances to the next scheduled event, returning its time
    pub fn advance_to_next_event(&mut self) -> Option<u64> {
        let due = self.scheduler.next_due()?;
        self.run_until(due);
        Some(due)
    }

    /// Current logical time in milliseconds
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    /// Time of the next scheduled event
    pub fn next_event_at(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    /// Last committed position
    pub fn committed_position(&self) -> LogicalPosition {
        self.position.committed()
    }

    /// Position currently drawn, including any transition in flight
    pub fn rendered_position(&self) -> LogicalPosition {
        self.position.rendered(self.scheduler.now())
    }

    /// Transition currently driving the position
    pub fn transition(&self) -> Option<&Transition> {
        self.position.in_flight()
    }

    /// Animation occupying the frame timer and the frame index on screen
    pub fn active_animation(&self) -> Option<(&AnimationDefinition, usize)> {
        self.playback
            .active()
            .map(|(id, index)| (self.table.get(id), index))
    }

    /// Number of queued animation requests
    pub fn pending_len(&self) -> usize {
        self.playback.pending_len()
    }

    /// Number of bubbles still alive
    pub fn bubble_count(&self) -> usize {
        self.bubbles.len()
    }

    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.viewport
    }

    pub fn table(&self) -> &AnimationTable {
        &self.table
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Consumes the agent, returning its surface
    pub fn into_surface(self) -> S {
        self.surface
    }

    fn run_due(&mut self) {
        let now = self.scheduler.now();
        self.run_until(now);
    }

    fn run_until(&mut self, until_ms: u64) {
        while let Some((timer, event)) = self.scheduler.pop_due(until_ms) {
            self.dispatch(timer, event);
        }
        self.scheduler.set_now(until_ms);
    }

    fn dispatch(&mut self, timer: TimerId, event: AgentEvent) {
        match event {
            AgentEvent::FrameElapsed => self.playback.on_frame_elapsed(
                timer,
                &self.table,
                &mut self.scheduler,
                &mut self.surface,
            ),
            AgentEvent::TransitionFinished { generation } => {
                if let Some(committed) = self.position.complete(generation) {
                    tracing::debug!(position = %committed, "Position committed");
                    self.surface.set_position(committed);
                }
            }
            AgentEvent::Bubble(id, stage) => self.bubbles.on_stage(id, stage, &mut self.surface),
        }
    }
}
