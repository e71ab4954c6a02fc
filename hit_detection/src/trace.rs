/*!
Socket-chain sweep strategy.

Per tick, for every active socket group in attack order:
1. Estimate swing speed from the group's first point and select the adaptive entry.
2. Remember the first point for the next speed estimate and accrue `delta`.
3. When the accumulator reaches the group's cadence: refresh the group's positions,
   sweep previous -> current, copy current into previous and reset the accumulator.

Candidates from a sweep go through the [`HitValidator`] and validated hits are emitted
immediately, so a target can only be reported once per window unless the attack allows
multi-hit.

A point that stops resolving while tracing ends the session (Tracing -> Idle).
*/

use tracing::{debug, info, warn};

use crate::adaptive::{select_entry, swing_speed};
use crate::bridge::{AttackContext, HitEvent, Observers};
use crate::config::{DetectionMode, HitDetectionSettings};
use crate::data::{AttackDataSource, AttackKey};
use crate::error::Result;
use crate::socket_group::{SocketGroupConfig, SocketGroupRegistry};
use crate::strategy::{ArmingCore, ArmingState, HitDetectionStrategy, TickContext};
use crate::sweep::{DebugTarget, SweepEngine};
use crate::validator::HitValidator;
use crate::world::{OwnerInfo, SocketResolver};

pub struct TraceDetector {
    source: Box<dyn AttackDataSource>,
    settings: HitDetectionSettings,
    core: ArmingCore,
    registry: SocketGroupRegistry,
    active: Vec<SocketGroupConfig>,
    validator: HitValidator,
    engine: SweepEngine,
}

impl TraceDetector {
    /// `settings` are used as given; [`build_detector`](crate::strategy::build_detector) validates them first.
    pub fn new(
        source: Box<dyn AttackDataSource>,
        owner: OwnerInfo,
        settings: HitDetectionSettings,
    ) -> Self {
        let registry = SocketGroupRegistry::build_from_metadata(source.hit_sockets());
        let validator = HitValidator::new(owner.actor, settings.hit_cooldown);
        let core = ArmingCore::new(owner, settings.debug.draw);
        Self {
            source,
            settings,
            core,
            registry,
            active: Vec::new(),
            validator,
            engine: SweepEngine::new(),
        }
    }

    /// Groups of the prepared attack.
    pub fn active_groups(&self) -> &[SocketGroupConfig] {
        &self.active
    }

    pub fn registry(&self) -> &SocketGroupRegistry {
        &self.registry
    }

    pub fn validator(&self) -> &HitValidator {
        &self.validator
    }

    /// Leave Tracing, keeping the binding.
    fn stop_trace(&mut self) {
        if self.core.state == ArmingState::Tracing {
            self.core.state = ArmingState::Prepared;
            info!(
                owner = %self.core.owner.actor,
                queries = self.engine.query_count(),
                "trace stopped"
            );
        }
    }

    fn geometry_failure(&mut self, point: &str) {
        warn!(
            owner = %self.core.owner.actor,
            point,
            "socket point no longer resolves, aborting hit detection"
        );
        self.disarm();
    }

    /// Resolves every point of every active group. Returns the first unresolvable point.
    fn refresh_all(&mut self, sockets: &dyn SocketResolver) -> std::result::Result<(), String> {
        for group in self.active.iter_mut() {
            group.refresh_current_positions(sockets)?;
        }
        Ok(())
    }

    fn tick_group(&mut self, index: usize, ctx: &mut TickContext<'_>) -> std::result::Result<(), String> {
        let group = &mut self.active[index];

        let tip = match group.tip_point() {
            Some(name) => Some(
                ctx.sockets
                    .socket_location(name)
                    .ok_or_else(|| name.to_owned())?,
            ),
            None => None,
        };
        let speed = tip.map_or(0.0, |tip| {
            swing_speed(&group.tip_previous_location, &tip, ctx.delta)
        });
        if let Some(entry) = select_entry(&self.settings.adaptive, speed) {
            group.apply_adaptive(&entry);
        }
        if let Some(tip) = tip {
            group.tip_previous_location = tip;
        }

        group.sweep_accumulator += ctx.delta;
        if group.sweep_accumulator < group.current_cadence_seconds {
            return Ok(());
        }

        group.refresh_current_positions(ctx.sockets)?;

        let debug = match ctx.debug.as_deref_mut() {
            Some(sink) if self.core.debug_draw => Some(DebugTarget {
                sink,
                settings: &self.settings.debug,
            }),
            _ => None,
        };
        let candidates =
            self.engine
                .sweep_group(&self.active[index], ctx.world, self.core.ignored(), debug);

        let group = &mut self.active[index];
        group.previous_positions.clone_from(&group.current_positions);
        group.sweep_accumulator = 0.0;

        let allow_multi_hit = self.core.allows_multi_hit();
        for hit in candidates {
            if self
                .validator
                .validate(Some(hit.actor), allow_multi_hit, ctx.now)
            {
                self.core.emit(hit);
            }
        }
        Ok(())
    }
}

impl HitDetectionStrategy for TraceDetector {
    fn mode(&self) -> DetectionMode {
        DetectionMode::Trace
    }

    fn state(&self) -> ArmingState {
        self.core.state
    }

    fn prepare(&mut self, key: &AttackKey, combo_index: i32) -> Result<()> {
        self.stop_trace();

        let resolved = match self.source.resolve_attack(key, combo_index) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(attack = %key, combo = combo_index, error = %err, "failed to load trace config");
                self.active.clear();
                self.core.attack = None;
                self.core.state = ArmingState::Idle;
                return Err(err);
            }
        };

        self.active = self.registry.resolve_for_attack(&resolved.stats);
        if self.active.is_empty() {
            warn!(attack = %key, "attack uses no known socket groups, nothing will be traced");
        }
        self.core.attack = Some(resolved);
        self.validator.clear();
        self.core.state = ArmingState::Prepared;
        self.core.log_prepared(key, combo_index, self.active.len());
        Ok(())
    }

    fn on_hit_window_start(&mut self, advisory_duration: f32, sockets: &dyn SocketResolver) {
        if !self.core.is_bound() {
            debug!("hit window start ignored, detector is not prepared");
            return;
        }
        if self.core.is_tracing() {
            debug!("already tracing, stopping previous trace");
            self.stop_trace();
        }

        if let Err(point) = self.refresh_all(sockets) {
            self.geometry_failure(&point);
            return;
        }
        for group in self.active.iter_mut() {
            group.reset_baseline();
        }
        self.engine.reset_counter();
        self.core.state = ArmingState::Tracing;
        debug!(
            owner = %self.core.owner.actor,
            advisory_duration,
            groups = self.active.len(),
            "trace started"
        );
    }

    fn on_hit_window_end(&mut self) {
        debug!("hit window end");
        self.disarm();
    }

    fn disarm(&mut self) {
        self.core.release_observers();
        if self.core.state == ArmingState::Idle && self.active.is_empty() && self.validator.is_empty()
        {
            return;
        }
        self.stop_trace();
        self.active.clear();
        self.validator.clear();
        self.core.state = ArmingState::Idle;
        debug!(owner = %self.core.owner.actor, "hit detection disarmed");
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        if !self.core.is_tracing() {
            return;
        }
        for index in 0..self.active.len() {
            if let Err(point) = self.tick_group(index, ctx) {
                self.geometry_failure(&point);
                return;
            }
        }
    }

    fn reset_hit_actors(&mut self) {
        self.validator.clear();
        debug!("reset hit actors");
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
        self.engine.query_count()
    }
}
