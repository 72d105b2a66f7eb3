//! Speech bubbles: appear, stay, fade out, disappear

use crate::agent::AgentEvent;
use crate::scheduler::Scheduler;
use crate::surface::Surface;
use std::collections::BTreeMap;
use std::fmt;

/// Identifies one bubble of one agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BubbleId(u64);

impl BubbleId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for BubbleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bubble#{}", self.0)
    }
}

/// Lifecycle phase of a live bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubblePhase {
    Appearing,
    Visible,
    Fading,
}

/// Scheduled step of a bubble's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleStage {
    FadeIn,
    Shown,
    FadeOut,
    Remove,
}

/// Creates bubbles and walks each one through its fade lifecycle
#[derive(Debug)]
pub struct BubbleManager {
    next_id: u64,
    fade_ms: u64,
    live: BTreeMap<BubbleId, BubblePhase>,
}

impl BubbleManager {
    pub fn new(fade_ms: u64) -> Self {
        Self {
            next_id: 1,
            fade_ms,
            live: BTreeMap::new(),
        }
    }

    /// Creates a bubble and schedules its whole lifecycle.
    ///
    /// The fade out starts `duration_ms` after creation and the bubble is
    /// removed once that fade has run.
    pub fn speak<S: Surface + ?Sized>(
        &mut self,
        text: &str,
        duration_ms: u64,
        scheduler: &mut Scheduler<AgentEvent>,
        surface: &mut S,
    ) -> BubbleId {
        let id = BubbleId(self.next_id);
        self.next_id += 1;

        surface.create_bubble(id, text);
        self.live.insert(id, BubblePhase::Appearing);

        scheduler.schedule(0, AgentEvent::Bubble(id, BubbleStage::FadeIn));
        scheduler.schedule(self.fade_ms, AgentEvent::Bubble(id, BubbleStage::Shown));
        scheduler.schedule(duration_ms, AgentEvent::Bubble(id, BubbleStage::FadeOut));
        scheduler.schedule(
            duration_ms.saturating_add(self.fade_ms),
            AgentEvent::Bubble(id, BubbleStage::Remove),
        );

        tracing::debug!(%id, duration_ms, "Bubble created");
        id
    }

    /// Applies one lifecycle step; steps for bubbles already gone are dropped
    pub fn on_stage<S: Surface + ?Sized>(&mut self, id: BubbleId, stage: BubbleStage, surface: &mut S) {
        let Some(phase) = self.live.get_mut(&id) else {
            return;
        };

        match stage {
            BubbleStage::FadeIn => surface.fade_bubble(id, 1.0, self.fade_ms),
            BubbleStage::Shown => {
                if *phase == BubblePhase::Appearing {
                    *phase = BubblePhase::Visible;
                }
            }
            BubbleStage::FadeOut => {
                *phase = BubblePhase::Fading;
                surface.fade_bubble(id, 0.0, self.fade_ms);
            }
            BubbleStage::Remove => {
                self.live.remove(&id);
                surface.remove_bubble(id);
                tracing::debug!(%id, "Bubble removed");
            }
        }
    }

    /// Removes every live bubble from the surface and forgets it
    pub fn clear<S: Surface>(&mut self, surface: &mut S) {
        for id in std::mem::take(&mut self.live).into_keys() {
            surface.remove_bubble(id);
            tracing::debug!(%id, "Bubble cleared");
        }
    }

    /// Phase of a live bubble
    pub fn phase(&self, id: BubbleId) -> Option<BubblePhase> {
        self.live.get(&id).copied()
    }

    /// Number of live bubbles
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    fn run(
        manager: &mut BubbleManager,
        scheduler: &mut Scheduler<AgentEvent>,
        surface: &mut RecordingSurface,
        until_ms: u64,
    ) {
        while let Some((_, event)) = scheduler.pop_due(until_ms) {
            if let AgentEvent::Bubble(id, stage) = event {
                manager.on_stage(id, stage, surface);
            }
        }
        scheduler.set_now(until_ms);
    }

    #[test]
    fn test_bubble_lifecycle() {
        let mut manager = BubbleManager::new(300);
        let mut scheduler = Scheduler::new();
        let mut surface = RecordingSurface::new();
        surface.attach_root();

        let id = manager.speak("Hello!", 3000, &mut scheduler, &mut surface);
        assert_eq!(surface.bubbles()[&id].text, "Hello!");
        assert_eq!(surface.bubbles()[&id].opacity, 0.0);

        run(&mut manager, &mut scheduler, &mut surface, 0);
        assert_eq!(surface.bubbles()[&id].opacity, 1.0);
        assert_eq!(manager.phase(id), Some(BubblePhase::Appearing));

        run(&mut manager, &mut scheduler, &mut surface, 300);
        assert_eq!(manager.phase(id), Some(BubblePhase::Visible));

        run(&mut manager, &mut scheduler, &mut surface, 3000);
        assert_eq!(manager.phase(id), Some(BubblePhase::Fading));
        assert_eq!(surface.bubbles()[&id].opacity, 0.0);

        run(&mut manager, &mut scheduler, &mut surface, 3299);
        assert!(surface.bubbles().contains_key(&id));

        run(&mut manager, &mut scheduler, &mut surface, 3300);
        assert!(surface.bubbles().is_empty());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_bubbles_overlap_independently() {
        let mut manager = BubbleManager::new(300);
        let mut scheduler = Scheduler::new();
        let mut surface = RecordingSurface::new();

        let first = manager.speak("one", 1000, &mut scheduler, &mut surface);
        run(&mut manager, &mut scheduler, &mut surface, 1100);
        let second = manager.speak("two", 1000, &mut scheduler, &mut surface);

        assert_eq!(manager.phase(first), Some(BubblePhase::Fading));
        assert_eq!(manager.phase(second), Some(BubblePhase::Appearing));
        assert_eq!(surface.bubbles().len(), 2);

        run(&mut manager, &mut scheduler, &mut surface, 1300);
        assert_eq!(manager.phase(first), None);
        assert!(surface.bubbles().contains_key(&second));
    }

    #[test]
    fn test_stages_after_clear_are_dropped() {
        let mut manager = BubbleManager::new(300);
        let mut scheduler = Scheduler::new();
        let mut surface = RecordingSurface::new();
        surface.attach_root();

        manager.speak("bye", 500, &mut scheduler, &mut surface);
        surface.detach_root();
        manager.clear(&mut surface);
        surface.clear_events();

        run(&mut manager, &mut scheduler, &mut surface, 10_000);
        assert!(surface.events().is_empty());
    }

    #[test]
    fn test_clear_removes_bubbles_from_surface() {
        let mut manager = BubbleManager::new(300);
        let mut scheduler = Scheduler::new();
        let mut surface = RecordingSurface::new();

        manager.speak("a", 500, &mut scheduler, &mut surface);
        manager.speak("b", 500, &mut scheduler, &mut surface);
        assert_eq!(surface.bubbles().len(), 2);

        manager.clear(&mut surface);
        assert!(manager.is_empty());
        assert!(surface.bubbles().is_empty());
    }
}
