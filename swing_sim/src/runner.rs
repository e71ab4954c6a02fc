//! Drives one detector through a series of swings against the arena and resolves every
//! reported hit on the defender it struck.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use hit_detection::data::BlockData;
use hit_detection::{
    ActorId, AttackDataSource, AttackKey, ComboTracker, DebugShapeRecorder, DefenseProfile,
    HitDetectionSettings, HitDetectionSetter, HitEvent, HitWindowNotify, OwnerInfo,
    RapierQueryWorld, ReactionLevel, TickContext, build_detector,
};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::scene::{SceneDef, yaw};

/// What to swing, and how often.
pub struct SwingPlan {
    pub source: Box<dyn AttackDataSource>,
    pub owner: OwnerInfo,
    pub key: AttackKey,
    pub combo_len: usize,
    pub swings: usize,
}

#[derive(Clone, Debug)]
pub struct TargetReport {
    pub name: String,
    pub actor: ActorId,
    pub hits: usize,
    pub health: f32,
    pub max_health: f32,
    pub poise: f32,
    pub last_reaction: Option<ReactionLevel>,
}

#[derive(Clone, Debug, Default)]
pub struct SimReport {
    pub swings: usize,
    pub hits: usize,
    pub queries: u64,
    pub debug_shapes: usize,
    pub targets: Vec<TargetReport>,
}

struct Defender {
    name: String,
    profile: DefenseProfile,
    hits: usize,
    last_reaction: Option<ReactionLevel>,
}

pub fn run(scene: &SceneDef, plan: SwingPlan, settings: HitDetectionSettings) -> Result<SimReport> {
    let chains: Vec<(String, usize)> = plan
        .source
        .hit_sockets()
        .iter()
        .map(|info| (info.name.clone(), info.count.max(0) as usize))
        .collect();
    let mut rig = scene.rig(chains.iter().map(|(name, count)| (name.as_str(), *count)));

    let world = RapierQueryWorld::build(scene.targets.iter().map(|t| t.to_def()), scene.dt);
    let mut defenders: HashMap<ActorId, Defender> = scene
        .targets
        .iter()
        .map(|t| {
            let mut profile = t.defense();
            if t.blocking {
                profile.raise_guard(BlockData::default());
            }
            (
                t.actor(),
                Defender {
                    name: t.name.clone(),
                    profile,
                    hits: 0,
                    last_reaction: None,
                },
            )
        })
        .collect();

    let mode = settings.mode;
    let mut detector = build_detector(plan.source, plan.owner, settings)?;
    info!(?mode, targets = world.target_count(), swings = plan.swings, "simulation started");

    let pending: Rc<RefCell<Vec<HitEvent>>> = Rc::default();
    let mut setter = HitDetectionSetter::new();

    let mut recorder = DebugShapeRecorder::default();
    let mut combo = ComboTracker::new(plan.combo_len);
    let notify = HitWindowNotify::new(scene.swing.window);
    let frames = (scene.swing.window / scene.dt).ceil().max(1.0) as usize;

    let mut report = SimReport::default();
    let mut now = 0.0;
    for swing in 0..plan.swings {
        rig.transform.rotation = yaw(scene.swing_yaw(swing, 0.0));
        let sink = Rc::clone(&pending);
        setter.prepare(detector.as_mut(), &plan.key, combo.index(), move |event| {
            sink.borrow_mut().push(*event)
        })?;
        notify.begin(&mut combo, detector.as_mut(), &rig);

        for frame in 1..=frames {
            now += scene.dt;
            rig.transform.rotation = yaw(scene.swing_yaw(swing, frame as f32 / frames as f32));
            let mut ctx = TickContext::new(now, scene.dt, &world, &rig);
            if detector.debug_draw_enabled() {
                ctx = ctx.with_debug(&mut recorder);
            }
            detector.tick(&mut ctx);

            for event in pending.borrow_mut().drain(..) {
                report.hits += 1;
                let Some(defender) = defenders.get_mut(&event.target) else {
                    warn!(target_actor = %event.target, "hit on an actor outside the arena");
                    continue;
                };
                let outcome = defender.profile.apply_hit(&event);
                defender.hits += 1;
                defender.last_reaction = Some(outcome.reaction);
                info!(
                    swing,
                    defender = %defender.name,
                    damage = outcome.health_lost,
                    poise = outcome.poise_lost,
                    blocked = outcome.blocked,
                    reaction = ?outcome.reaction,
                    died = outcome.died,
                    "hit resolved"
                );
            }
        }

        let queries = detector.sweep_query_count();
        notify.end(detector.as_mut());
        setter.unbind(detector.as_mut());
        report.queries += queries;
        debug!(swing, queries, "swing finished");
        now += scene.swing.recovery;
        report.swings += 1;
    }
    report.debug_shapes = recorder.shapes.len();
    report.targets = scene
        .targets
        .iter()
        .filter_map(|t| {
            let d = defenders.remove(&t.actor())?;
            Some(TargetReport {
                name: d.name,
                actor: t.actor(),
                hits: d.hits,
                health: d.profile.vitals.health,
                max_health: d.profile.vitals.max_health,
                poise: d.profile.vitals.poise,
                last_reaction: d.last_reaction,
            })
        })
        .collect();
    Ok(report)
}
