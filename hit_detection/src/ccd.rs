/*!
Continuous-collision strategy.

Instead of sweeping socket chains, one capsule is fitted to the weapon and moved with
it. Each tick while tracing:
- the capsule is cast from its previous pose to its current pose, which catches targets
  passed through between two ticks
- the capsule is overlapped at its current pose, and only targets that were not already
  overlapping on the previous tick produce a candidate (begin-overlap)

Candidates from an overlap carry synthesized geometry: location and impact point at the
capsule center, normal towards the target, zero distance, `start_penetrating` set.

The cast translates the previous capsule along the motion of its center and does not
follow rotation between the two poses.

Hit records are an append-only [`CcdHitLog`] with the configured cooldown; the weapon
and its wielder are never hit.
*/

use tracing::{debug, info, warn};

use crate::actor::ActorId;
use crate::bridge::{AttackContext, HitEvent, Observers};
use crate::config::{CcdSettings, DetectionMode, HitDetectionSettings};
use crate::constants::{
    CCD_DEBUG_GHOSTS, PIERCE_HALF_HEIGHT_SCALE, PIERCE_RADIUS_SCALE, SLASH_HALF_HEIGHT_SCALE,
    STRIKE_RADIUS_SCALE,
};
use crate::data::{AttackDataSource, AttackKey, DamageMotionType};
use crate::debug_draw::{DebugDraw, Rgba};
use crate::error::Result;
use crate::strategy::{ArmingCore, ArmingState, HitDetectionStrategy, TickContext};
use crate::types::{CapsuleSegment, HitResult, Overlap, Vec3, safe_normal};
use crate::validator::CcdHitLog;
use crate::world::{OwnerInfo, SocketResolver};

/// Motion below this (squared) does not cast.
const MIN_CAST_DISTANCE_SQ: f32 = 1.0e-8;

/// Radius and half-height multipliers of the capsule for one damage motion type.
pub fn motion_capsule_scale(motion: DamageMotionType) -> (f32, f32) {
    match motion {
        DamageMotionType::Slash => (1.0, SLASH_HALF_HEIGHT_SCALE),
        DamageMotionType::Pierce => (PIERCE_RADIUS_SCALE, PIERCE_HALF_HEIGHT_SCALE),
        DamageMotionType::Strike => (STRIKE_RADIUS_SCALE, 1.0),
        DamageMotionType::None => (1.0, 1.0),
    }
}

/// Fits the detection capsule to the weapon every tick.
#[derive(Clone, Debug, PartialEq)]
pub struct CapsuleFit {
    /// First and last point of the first socket group, when it has at least two.
    endpoints: Option<(String, String)>,
    radius: f32,
    /// Used without endpoints, along the owner's local +Z.
    default_half_height: f32,
    radius_scale: f32,
    half_height_scale: f32,
}

impl CapsuleFit {
    pub fn new(source: &dyn AttackDataSource, settings: &CcdSettings) -> Self {
        let endpoints = source.hit_sockets().first().and_then(|info| {
            (info.count >= 2).then(|| {
                (
                    format!("{}_0", info.name),
                    format!("{}_{}", info.name, info.count - 1),
                )
            })
        });
        if endpoints.is_none() {
            debug!(
                half_height = settings.half_height,
                "no socket group to fit the CCD capsule, using default size"
            );
        }
        Self {
            endpoints,
            radius: settings.radius,
            default_half_height: settings.half_height,
            radius_scale: 1.0,
            half_height_scale: 1.0,
        }
    }

    pub fn set_scale(&mut self, radius_scale: f32, half_height_scale: f32) {
        self.radius_scale = radius_scale;
        self.half_height_scale = half_height_scale;
    }

    #[inline]
    pub fn is_socket_fitted(&self) -> bool {
        self.endpoints.is_some()
    }

    /// Current world-space capsule, or the name of what failed to resolve.
    pub fn resolve(&self, sockets: &dyn SocketResolver) -> std::result::Result<CapsuleSegment, String> {
        let (center, axis, half_height) = match &self.endpoints {
            Some((first, last)) => {
                let a = sockets
                    .socket_location(first)
                    .ok_or_else(|| first.clone())?;
                let b = sockets.socket_location(last).ok_or_else(|| last.clone())?;
                ((a + b) * 0.5, safe_normal(&(a - b)), (a - b).norm() * 0.5)
            }
            None => {
                let transform = sockets
                    .owner_transform()
                    .ok_or_else(|| "owner transform".to_owned())?;
                let local_center = Vec3::new(0.0, 0.0, self.default_half_height);
                (
                    transform.transform_point(&local_center),
                    transform.rotation * Vec3::z(),
                    self.default_half_height,
                )
            }
        };
        let half = axis * (half_height * self.half_height_scale);
        Ok(CapsuleSegment {
            a: center + half,
            b: center - half,
            radius: self.radius * self.radius_scale,
        })
    }
}

fn overlap_hit(overlap: &Overlap, capsule: &CapsuleSegment) -> HitResult {
    let center = capsule.center();
    HitResult {
        actor: overlap.actor,
        location: center,
        impact_point: center,
        impact_normal: safe_normal(&(overlap.actor_location - center)),
        distance: 0.0,
        from_sweep: false,
        start_penetrating: true,
    }
}

pub struct CcdDetector {
    source: Box<dyn AttackDataSource>,
    settings: HitDetectionSettings,
    core: ArmingCore,
    capsule: CapsuleFit,
    log: CcdHitLog,
    previous: Option<CapsuleSegment>,
    overlapping: Vec<ActorId>,
    query_count: u64,
}

impl CcdDetector {
    /// `settings` are used as given; [`build_detector`](crate::strategy::build_detector) validates them first.
    pub fn new(
        source: Box<dyn AttackDataSource>,
        owner: OwnerInfo,
        settings: HitDetectionSettings,
    ) -> Self {
        let capsule = CapsuleFit::new(source.as_ref(), &settings.ccd);
        let log = CcdHitLog::new(settings.hit_cooldown);
        let core = ArmingCore::new(owner, settings.debug.draw);
        Self {
            source,
            settings,
            core,
            capsule,
            log,
            previous: None,
            overlapping: Vec::new(),
            query_count: 0,
        }
    }

    pub fn capsule_fit(&self) -> &CapsuleFit {
        &self.capsule
    }

    pub fn hit_log(&self) -> &CcdHitLog {
        &self.log
    }

    /// Capsule pose of the last tick (or window start).
    pub fn last_capsule(&self) -> Option<CapsuleSegment> {
        self.previous
    }

    fn validate(&mut self, actor: ActorId, now: f32) -> bool {
        if self.core.owner.owns(actor) {
            return false;
        }
        self.log.validate(actor, now)
    }

    fn stop_trace(&mut self) {
        if self.core.state == ArmingState::Tracing {
            self.core.state = ArmingState::Prepared;
            info!(
                owner = %self.core.owner.actor,
                queries = self.query_count,
                "ccd detection stopped"
            );
        }
    }

    fn geometry_failure(&mut self, what: &str) {
        warn!(
            owner = %self.core.owner.actor,
            what,
            "ccd capsule can no longer be placed, aborting hit detection"
        );
        self.disarm();
    }

    fn draw_trajectory(
        sink: &mut dyn DebugDraw,
        previous: Option<&CapsuleSegment>,
        current: &CapsuleSegment,
        color: Rgba,
        duration: f32,
    ) {
        sink.capsule(current.a, current.b, current.radius, color, duration);
        let Some(previous) = previous else {
            return;
        };
        for i in 1..=CCD_DEBUG_GHOSTS {
            let alpha = i as f32 / CCD_DEBUG_GHOSTS as f32;
            sink.capsule(
                previous.a.lerp(&current.a, alpha),
                previous.b.lerp(&current.b, alpha),
                current.radius,
                color.with_alpha(50),
                duration,
            );
        }
        sink.line(previous.center(), current.center(), Rgba::YELLOW, duration);
    }
}

impl HitDetectionStrategy for CcdDetector {
    fn mode(&self) -> DetectionMode {
        DetectionMode::Ccd
    }

    fn state(&self) -> ArmingState {
        self.core.state
    }

    fn prepare(&mut self, key: &AttackKey, combo_index: i32) -> Result<()> {
        self.stop_trace();

        let resolved = match self.source.resolve_attack(key, combo_index) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(attack = %key, combo = combo_index, error = %err, "failed to load attack config");
                self.core.attack = None;
                self.core.state = ArmingState::Idle;
                return Err(err);
            }
        };

        if self.settings.ccd.scale_by_motion {
            let (radius_scale, half_height_scale) = motion_capsule_scale(resolved.stats.damage_type);
            self.capsule.set_scale(radius_scale, half_height_scale);
        }
        self.core.attack = Some(resolved);
        self.log.clear();
        self.core.state = ArmingState::Prepared;
        self.core.log_prepared(key, combo_index, 1);
        Ok(())
    }

    fn on_hit_window_start(&mut self, advisory_duration: f32, sockets: &dyn SocketResolver) {
        if !self.core.is_bound() {
            debug!("hit window start ignored, detector is not prepared");
            return;
        }
        if self.core.is_tracing() {
            debug!("already detecting, stopping previous session");
            self.stop_trace();
        }

        match self.capsule.resolve(sockets) {
            Ok(capsule) => self.previous = Some(capsule),
            Err(what) => {
                self.geometry_failure(&what);
                return;
            }
        }
        self.overlapping.clear();
        self.query_count = 0;
        self.core.state = ArmingState::Tracing;
        debug!(
            owner = %self.core.owner.actor,
            advisory_duration,
            "ccd detection started"
        );
    }

    fn on_hit_window_end(&mut self) {
        debug!("hit window end");
        self.disarm();
    }

    fn disarm(&mut self) {
        self.core.release_observers();
        if self.core.state == ArmingState::Idle && self.previous.is_none() && self.log.records().is_empty() {
            return;
        }
        self.stop_trace();
        self.log.clear();
        self.previous = None;
        self.overlapping.clear();
        self.core.state = ArmingState::Idle;
        debug!(owner = %self.core.owner.actor, "ccd detection disarmed");
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        if !self.core.is_tracing() {
            return;
        }
        let current = match self.capsule.resolve(ctx.sockets) {
            Ok(capsule) => capsule,
            Err(what) => {
                self.geometry_failure(&what);
                return;
            }
        };

        // Targets still inside the capsule must not stop the cast at its start.
        let mut cast_ignored = self.core.ignored().to_vec();
        cast_ignored.extend(self.overlapping.iter().copied());
        let swept = self.previous.and_then(|previous| {
            let motion = current.center() - previous.center();
            if motion.norm_squared() <= MIN_CAST_DISTANCE_SQ {
                return None;
            }
            self.query_count += 1;
            ctx.world.cast_capsule(&previous, &motion, &cast_ignored)
        });

        let overlaps = ctx.world.overlap_capsule(&current, self.core.ignored());
        self.query_count += 1;

        let mut candidates: Vec<HitResult> = swept.into_iter().collect();
        for overlap in &overlaps {
            let began = !self.overlapping.contains(&overlap.actor);
            let already_swept = swept.is_some_and(|hit| hit.actor == overlap.actor);
            if began && !already_swept {
                candidates.push(overlap_hit(overlap, &current));
            }
        }
        self.overlapping = overlaps.iter().map(|o| o.actor).collect();

        for hit in candidates {
            if self.validate(hit.actor, ctx.now) {
                self.core.emit(hit);
            }
        }

        if self.core.debug_draw {
            if let Some(sink) = ctx.debug.as_deref_mut() {
                Self::draw_trajectory(
                    sink,
                    self.previous.as_ref(),
                    &current,
                    self.settings.debug.color,
                    self.settings.debug.duration,
                );
            }
        }
        self.previous = Some(current);
    }

    fn reset_hit_actors(&mut self) {
        self.log.clear();
        debug!("reset hit records");
    }

    fn hit_observers(&mut self) -> &mut Observers<HitEvent> {
        &mut self.core.observers
    }

    fn attack_context(&self) -> Option<AttackContext> {
        self.core.context()
    }

    fn debug_draw_enabled(&self) -> bool {
        self.core.debug_draw
    }

    fn set_debug_draw(&mut self, enabled: bool) {
        self.core.debug_draw = enabled;
    }

    fn sweep_query_count(&self) -> u64 {
        self.query_count
    }
}
