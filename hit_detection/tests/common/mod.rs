//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use hit_detection::data::{AttackSocketConfig, HitSocketInfo, NamedAttackData, TaggedAttackData};
use hit_detection::*;

pub fn wolf() -> ActorId {
    ActorId::new(1, ActorKind::Creature)
}

pub fn knight() -> ActorId {
    ActorId::new(1, ActorKind::Character)
}

pub fn sword() -> ActorId {
    ActorId::new(1, ActorKind::Weapon)
}

pub fn dummy(n: u64) -> ActorId {
    ActorId::new(100 + n, ActorKind::Character)
}

/// A world where every sweep touches the same scripted set of actors.
#[derive(Default)]
pub struct ScriptedWorld {
    pub touching: RefCell<Vec<ActorId>>,
    pub sweeps: Cell<usize>,
}

impl ScriptedWorld {
    pub fn touching(actors: &[ActorId]) -> Self {
        Self {
            touching: RefCell::new(actors.to_vec()),
            sweeps: Cell::new(0),
        }
    }

    pub fn set_touching(&self, actors: &[ActorId]) {
        *self.touching.borrow_mut() = actors.to_vec();
    }

    fn hit(actor: ActorId, at: Vec3) -> HitResult {
        HitResult {
            actor,
            location: at,
            impact_point: at,
            impact_normal: Vec3::x(),
            distance: 0.0,
            from_sweep: true,
            start_penetrating: false,
        }
    }
}

impl WorldQuery for ScriptedWorld {
    fn sweep_capsule(&self, start: &Vec3, _: &Vec3, _: f32, ignored: &[ActorId]) -> Vec<HitResult> {
        self.sweeps.set(self.sweeps.get() + 1);
        self.touching
            .borrow()
            .iter()
            .filter(|a| !ignored.contains(a))
            .map(|a| Self::hit(*a, *start))
            .collect()
    }

    fn cast_capsule(&self, capsule: &CapsuleSegment, _: &Vec3, ignored: &[ActorId]) -> Option<HitResult> {
        self.touching
            .borrow()
            .iter()
            .find(|a| !ignored.contains(a))
            .map(|a| Self::hit(*a, capsule.center()))
    }

    fn overlap_capsule(&self, _: &CapsuleSegment, ignored: &[ActorId]) -> Vec<Overlap> {
        self.touching
            .borrow()
            .iter()
            .filter(|a| !ignored.contains(a))
            .map(|a| Overlap {
                actor: *a,
                actor_location: Vec3::new(50.0, 0.0, 0.0),
            })
            .collect()
    }
}

/// Wolf with a three-point jaw and a "bite" attack sweeping it.
pub fn wolf_data(multi_hit: bool) -> CreatureData {
    let mut attacks = BTreeMap::new();
    attacks.insert(
        "bite".to_owned(),
        NamedAttackData {
            combo: vec![
                AttackStats {
                    damage_type: DamageMotionType::Slash,
                    damage_multiplier: 1.5,
                    poise_damage: 30.0,
                    sockets: vec![AttackSocketConfig {
                        socket_name: "jaw".into(),
                        trace_radius: 10.0,
                    }],
                    multi_hit,
                    ..Default::default()
                },
                AttackStats {
                    damage_type: DamageMotionType::Strike,
                    damage_multiplier: 2.0,
                    sockets: vec![AttackSocketConfig {
                        socket_name: "jaw".into(),
                        trace_radius: 15.0,
                    }],
                    multi_hit,
                    ..Default::default()
                },
            ],
        },
    );
    CreatureData {
        name: "wolf".into(),
        base_damage: 40.0,
        hit_sockets: vec![HitSocketInfo {
            name: "jaw".into(),
            count: 3,
        }],
        attacks,
    }
}

pub fn longsword(sockets: i32, radius: f32) -> WeaponData {
    WeaponData {
        name: "longsword".into(),
        hit_sockets: vec![HitSocketInfo {
            name: "blade".into(),
            count: sockets,
        }],
        base_damage: 100.0,
        strength_scaling: 50.0,
        dexterity_scaling: 0.0,
        attacks: vec![TaggedAttackData {
            tags: TagSet::new(["Attack.Light"]),
            combo: vec![AttackStats {
                damage_type: DamageMotionType::Slash,
                poise_damage: 25.0,
                sockets: vec![AttackSocketConfig {
                    socket_name: "blade".into(),
                    trace_radius: radius,
                }],
                ..Default::default()
            }],
        }],
        block: Default::default(),
    }
}

/// Sweeps every tick of `step` seconds with one interpolation step.
pub fn every_tick(step: f32, cooldown: f32) -> HitDetectionSettings {
    HitDetectionSettings {
        hit_cooldown: cooldown,
        adaptive: vec![AdaptiveTraceEntry::new(step, 1, 0.0)],
        ..Default::default()
    }
}

/// Jaw sockets of a rig at the origin, opening along +Z.
pub fn jaw_rig() -> SocketRig {
    SocketRig::default().with_chain("jaw", 3, Vec3::zeros(), Vec3::new(0.0, 0.0, 100.0))
}

pub fn record_hits(detector: &mut dyn HitDetectionStrategy) -> Rc<RefCell<Vec<HitEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    detector
        .hit_observers()
        .subscribe(move |e: &HitEvent| sink.borrow_mut().push(*e));
    seen
}

pub fn hits_on(seen: &Rc<RefCell<Vec<HitEvent>>>, actor: ActorId) -> usize {
    seen.borrow().iter().filter(|e| e.target == actor).count()
}
