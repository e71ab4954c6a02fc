/*!
Consumer side of a hit: how a defender turns a [`HitEvent`] into health and poise loss.

The detectors never touch vitals; a combat layer subscribes to hit events and applies
them here.

Notes
- Unguarded damage is reduced by armor: `damage * (1 - defense / (defense + 100))`.
- A raised guard replaces armor with the shield's block data:
  `damage * (1 - damage_reduction / 100)`.
- Health and poise are clamped into `[0, max]`; poise only changes on positive poise damage.
*/

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bridge::{AttackContext, HitEvent};
use crate::constants::{HEAVY_REACTION_POISE, LIGHT_REACTION_POISE};
use crate::data::BlockData;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionLevel {
    Light,
    Middle,
    Heavy,
}

/// Poise damage thresholds separating reaction levels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionThresholds {
    /// Above this, at least a middle reaction.
    pub light: f32,
    /// Above this, a heavy reaction.
    pub heavy: f32,
}

impl Default for ReactionThresholds {
    fn default() -> Self {
        Self {
            light: LIGHT_REACTION_POISE,
            heavy: HEAVY_REACTION_POISE,
        }
    }
}

impl ReactionThresholds {
    pub fn select(&self, poise_damage: f32) -> ReactionLevel {
        if poise_damage > self.heavy {
            ReactionLevel::Heavy
        } else if poise_damage > self.light {
            ReactionLevel::Middle
        } else {
            ReactionLevel::Light
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: f32,
    pub max_health: f32,
    pub poise: f32,
    pub max_poise: f32,
    /// Armor rating for unguarded hits.
    pub defense: f32,
}

impl Vitals {
    /// Full health and poise.
    pub fn new(max_health: f32, max_poise: f32, defense: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            poise: max_poise,
            max_poise,
            defense,
        }
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    #[inline]
    pub fn is_poise_broken(&self) -> bool {
        self.poise <= 0.0
    }
}

#[inline]
pub fn armored_damage(damage: f32, defense: f32) -> f32 {
    let reduction = defense / (defense + 100.0);
    damage * (1.0 - reduction)
}

#[inline]
pub fn blocked_damage(damage: f32, block: &BlockData) -> f32 {
    damage * (1.0 - block.damage_reduction / 100.0)
}

/// What one hit did to a defender.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageOutcome {
    pub health_lost: f32,
    pub poise_lost: f32,
    pub blocked: bool,
    pub reaction: ReactionLevel,
    pub died: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DefenseProfile {
    pub vitals: Vitals,
    pub thresholds: ReactionThresholds,
    guard: Option<BlockData>,
}

impl DefenseProfile {
    pub fn new(vitals: Vitals) -> Self {
        Self {
            vitals,
            thresholds: ReactionThresholds::default(),
            guard: None,
        }
    }

    pub fn with_thresholds(mut self, thresholds: ReactionThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn raise_guard(&mut self, block: BlockData) {
        self.guard = Some(block);
    }

    pub fn lower_guard(&mut self) {
        self.guard = None;
    }

    #[inline]
    pub fn is_blocking(&self) -> bool {
        self.guard.is_some()
    }

    pub fn apply_hit(&mut self, event: &HitEvent) -> DamageOutcome {
        self.apply(&event.attack)
    }

    pub fn apply(&mut self, attack: &AttackContext) -> DamageOutcome {
        let damage = match &self.guard {
            Some(block) => blocked_damage(attack.final_damage, block),
            None => armored_damage(attack.final_damage, self.vitals.defense),
        };

        let was_alive = !self.vitals.is_dead();
        let old_health = self.vitals.health;
        self.vitals.health = (old_health - damage).clamp(0.0, self.vitals.max_health);

        let old_poise = self.vitals.poise;
        if attack.poise_damage > 0.0 {
            self.vitals.poise = (old_poise - attack.poise_damage).clamp(0.0, self.vitals.max_poise);
        }

        let outcome = DamageOutcome {
            health_lost: old_health - self.vitals.health,
            poise_lost: old_poise - self.vitals.poise,
            blocked: self.is_blocking(),
            reaction: self.thresholds.select(attack.poise_damage),
            died: was_alive && self.vitals.is_dead(),
        };
        debug!(
            damage = attack.final_damage,
            health = self.vitals.health,
            poise = self.vitals.poise,
            blocked = outcome.blocked,
            reaction = ?outcome.reaction,
            "damage resolved"
        );
        outcome
    }
}
