/*!
The shared hit-detection strategy interface and arming state machine.

```text
        prepare ok                 window start
Idle ─────────────▶ Prepared ─────────────────▶ Tracing
 ▲  ◀── prepare err ──┘ ▲                          │
 │                      └──── re-entrant start ────┤
 └──────────── window end / disarm / geometry failure
```

- `prepare` resolves the attack, loads its socket groups, clears hit records and binds
  the detector to window events. A failed prepare leaves the detector Idle.
- Window events are ignored while Idle (not bound).
- Disarm is safe at any time and idempotent. It drops every hit subscription, so a
  subscriber binds again for each attack it wants to hear about.

Both strategies share [`ArmingCore`] for the state, the hit observers and the resolved
attack; they differ in how they turn motion into candidate hits.
*/

use tracing::{debug, info};

use crate::actor::ActorId;
use crate::bridge::{AttackContext, HitEvent, Observers};
use crate::ccd::CcdDetector;
use crate::config::{DetectionMode, HitDetectionSettings};
use crate::data::{AttackDataSource, AttackKey, ResolvedAttack};
use crate::debug_draw::DebugDraw;
use crate::error::Result;
use crate::trace::TraceDetector;
use crate::types::HitResult;
use crate::world::{OwnerInfo, SocketResolver, WorldQuery};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArmingState {
    #[default]
    Idle,
    Prepared,
    Tracing,
}

/// Everything a detector needs for one tick.
pub struct TickContext<'a> {
    /// Game time (seconds).
    pub now: f32,
    /// Time since the previous tick (seconds).
    pub delta: f32,
    pub world: &'a dyn WorldQuery,
    pub sockets: &'a dyn SocketResolver,
    pub debug: Option<&'a mut dyn DebugDraw>,
}

impl<'a> TickContext<'a> {
    pub fn new(
        now: f32,
        delta: f32,
        world: &'a dyn WorldQuery,
        sockets: &'a dyn SocketResolver,
    ) -> Self {
        Self {
            now,
            delta,
            world,
            sockets,
            debug: None,
        }
    }

    pub fn with_debug(mut self, sink: &'a mut dyn DebugDraw) -> Self {
        self.debug = Some(sink);
        self
    }
}

pub trait HitDetectionStrategy {
    fn mode(&self) -> DetectionMode;

    fn state(&self) -> ArmingState;

    /// Select attack data for `key` and combo step `combo_index`.
    ///
    /// `Err` means the attack cannot be traced and the caller should abort it.
    fn prepare(&mut self, key: &AttackKey, combo_index: i32) -> Result<()>;

    /// `advisory_duration` is informational; the window ends on [`Self::on_hit_window_end`].
    fn on_hit_window_start(&mut self, advisory_duration: f32, sockets: &dyn SocketResolver);

    fn on_hit_window_end(&mut self);

    /// Stop everything, drop hit subscribers and return to Idle.
    fn disarm(&mut self);

    fn tick(&mut self, ctx: &mut TickContext<'_>);

    /// Forget every recorded hit of the current window.
    fn reset_hit_actors(&mut self);

    fn hit_observers(&mut self) -> &mut Observers<HitEvent>;

    /// Payload resolved by the last successful prepare.
    fn attack_context(&self) -> Option<AttackContext>;

    fn debug_draw_enabled(&self) -> bool;

    fn set_debug_draw(&mut self, enabled: bool);

    fn toggle_debug_draw(&mut self) {
        let enabled = !self.debug_draw_enabled();
        self.set_debug_draw(enabled);
    }

    /// Number of world queries issued in the current (or last) tracing session.
    fn sweep_query_count(&self) -> u64;
}

/// Builds the strategy selected by `settings.mode` after validating `settings`.
pub fn build_detector(
    source: Box<dyn AttackDataSource>,
    owner: OwnerInfo,
    settings: HitDetectionSettings,
) -> Result<Box<dyn HitDetectionStrategy>> {
    settings.validate()?;
    Ok(match settings.mode {
        DetectionMode::Trace => Box::new(TraceDetector::new(source, owner, settings)),
        DetectionMode::Ccd => Box::new(CcdDetector::new(source, owner, settings)),
    })
}

/// Arming state, resolved attack and hit observers shared by both strategies.
#[derive(Debug)]
pub struct ArmingCore {
    pub state: ArmingState,
    pub owner: OwnerInfo,
    pub attack: Option<ResolvedAttack>,
    pub observers: Observers<HitEvent>,
    pub debug_draw: bool,
    ignored: Vec<ActorId>,
}

impl ArmingCore {
    pub fn new(owner: OwnerInfo, debug_draw: bool) -> Self {
        let ignored = owner.ignored_actors();
        Self {
            state: ArmingState::Idle,
            owner,
            attack: None,
            observers: Observers::default(),
            debug_draw,
            ignored,
        }
    }

    /// Owner, wielder and extra ignored actors.
    #[inline]
    pub fn ignored(&self) -> &[ActorId] {
        &self.ignored
    }

    #[inline]
    pub fn is_tracing(&self) -> bool {
        self.state == ArmingState::Tracing
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.state != ArmingState::Idle
    }

    #[inline]
    pub fn context(&self) -> Option<AttackContext> {
        self.attack.as_ref().map(|a| a.context)
    }

    #[inline]
    pub fn allows_multi_hit(&self) -> bool {
        self.attack.as_ref().is_some_and(|a| a.stats.multi_hit)
    }

    /// Bundle a validated hit with the current attack and notify subscribers.
    pub fn emit(&mut self, hit: HitResult) {
        let event = HitEvent {
            target: hit.actor,
            hit,
            attack: self.context().unwrap_or_default(),
        };
        info!(
            target_actor = %event.target,
            damage = event.attack.final_damage,
            poise = event.attack.poise_damage,
            "hit"
        );
        self.observers.broadcast(&event);
    }

    /// Drops every hit subscriber.
    pub fn release_observers(&mut self) {
        if !self.observers.is_empty() {
            debug!(
                owner = %self.owner.actor,
                count = self.observers.len(),
                "hit observers released"
            );
            self.observers.clear();
        }
    }

    pub fn log_prepared(&self, key: &AttackKey, combo_index: i32, groups: usize) {
        debug!(
            owner = %self.owner.actor,
            attack = %key,
            combo = combo_index,
            groups,
            "hit detection prepared"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorKind;
    use crate::data::{AttackStats, CreatureData, DamageMotionType};
    use crate::types::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn core() -> ArmingCore {
        ArmingCore::new(
            OwnerInfo::weapon(
                ActorId::new(1, ActorKind::Weapon),
                ActorId::new(1, ActorKind::Character),
            ),
            false,
        )
    }

    #[test]
    fn new_core_is_idle_and_unbound() {
        let c = core();
        assert_eq!(c.state, ArmingState::Idle);
        assert!(!c.is_bound());
        assert_eq!(c.context(), None);
        assert!(!c.allows_multi_hit());
        assert_eq!(c.ignored().len(), 2);
    }

    #[test]
    fn emit_carries_the_resolved_attack() {
        let mut c = core();
        c.attack = Some(ResolvedAttack {
            stats: AttackStats {
                multi_hit: true,
                ..Default::default()
            },
            context: AttackContext {
                final_damage: 42.0,
                poise_damage: 7.0,
                damage_motion_type: DamageMotionType::Strike,
            },
        });
        assert!(c.allows_multi_hit());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        c.observers.subscribe(move |e: &HitEvent| sink.borrow_mut().push(*e));

        let target = ActorId::new(5, ActorKind::Creature);
        c.emit(HitResult {
            actor: target,
            location: Vec3::zeros(),
            impact_point: Vec3::zeros(),
            impact_normal: Vec3::x(),
            distance: 0.0,
            from_sweep: true,
            start_penetrating: false,
        });

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].target, target);
        assert_eq!(seen[0].attack.final_damage, 42.0);
    }

    #[test]
    fn release_drops_every_subscriber() {
        let mut c = core();
        c.observers.subscribe(|_| {});
        c.observers.subscribe(|_| {});
        c.release_observers();
        assert!(c.observers.is_empty());
        c.release_observers();
        assert!(c.observers.is_empty());
    }

    #[test]
    fn build_rejects_invalid_settings() {
        let wolf = || CreatureData {
            name: "wolf".into(),
            base_damage: 10.0,
            hit_sockets: Vec::new(),
            attacks: Default::default(),
        };
        let owner = OwnerInfo::creature(ActorId::new(3, ActorKind::Creature));
        let settings = HitDetectionSettings {
            hit_cooldown: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            build_detector(Box::new(wolf()), owner.clone(), settings),
            Err(crate::error::HitDetectionError::InvalidSettings(_))
        ));

        let settings = HitDetectionSettings {
            adaptive: Vec::new(),
            ..Default::default()
        };
        assert!(build_detector(Box::new(wolf()), owner.clone(), settings).is_err());

        let detector = build_detector(Box::new(wolf()), owner, HitDetectionSettings::default());
        assert_eq!(detector.unwrap().mode(), DetectionMode::Trace);
    }
}
