use fastrand::Rng;
use hop_core::hop::{HopPhase, HopTimer};
use std::collections::BTreeMap;

use crate::scene::{EntityId, Scene};

/// All hop timers in the level, one per entity, updated uniformly each frame.
#[derive(Debug, Default)]
pub struct HopRoster {
    timers: BTreeMap<EntityId, HopTimer>,
}

impl HopRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the timer previously attached to `entity`, if any.
    pub fn insert(&mut self, entity: EntityId, timer: HopTimer) -> Option<HopTimer> {
        self.timers.insert(entity, timer)
    }

    pub fn get(&self, entity: EntityId) -> Option<&HopTimer> {
        self.timers.get(&entity)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.timers.keys().copied()
    }

    pub fn count_in(&self, phase: HopPhase) -> usize {
        self.timers.values().filter(|t| t.phase() == phase).count()
    }

    /// Tick every timer against its entity. A timer whose entity is gone
    /// from the scene is dropped from the roster with a single warning.
    pub fn update(&mut self, dt: f32, scene: &mut Scene, rng: &mut Rng) {
        self.timers.retain(|&entity, timer| {
            let Some(position) = scene.position_mut(entity) else {
                log::warn!("Hopper {} is not in the scene, dropping it", entity.index());
                return false;
            };
            timer.tick(dt, position, rng);
            true
        });
    }
}
