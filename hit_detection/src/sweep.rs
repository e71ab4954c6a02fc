/*!
Sweep geometry engine.

Covers the motion of a socket chain between two sweeps with capsule queries:

For each adjacent point pair `(i, i + 1)` and each `step` in `0..=steps`:
- `alpha = step / steps`
- both endpoints are lerped between their previous and current positions by `alpha`
- one capsule of the group's radius spans the interpolated endpoints

So a chain of `n` points swept with `s` steps issues `(n - 1) * (s + 1)` queries. Step 0
re-covers the previous pose and the last step covers the current pose, which keeps thin
targets from slipping between two poses of a fast swing.

Dispatch is per damage motion type. Pierce and Strike route through their own entry
points and currently share the chain sweep with Slash. `None` never sweeps.
*/

use tracing::{debug, trace};

use crate::actor::ActorId;
use crate::config::DebugSettings;
use crate::data::DamageMotionType;
use crate::debug_draw::DebugDraw;
use crate::socket_group::SocketGroupConfig;
use crate::types::{HitResult, Vec3};
use crate::world::WorldQuery;

/// Debug sink plus how to draw into it.
pub struct DebugTarget<'a> {
    pub sink: &'a mut dyn DebugDraw,
    pub settings: &'a DebugSettings,
}

/// Issues the capsule queries for one group sweep and counts them.
#[derive(Clone, Debug, Default)]
pub struct SweepEngine {
    query_count: u64,
}

impl SweepEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queries issued since the last reset.
    #[inline]
    pub fn query_count(&self) -> u64 {
        self.query_count
    }

    #[inline]
    pub fn reset_counter(&mut self) {
        self.query_count = 0;
    }

    /// Sweep one group between its previous and current positions.
    ///
    /// Returns every candidate hit in query order; the same actor may appear many times.
    pub fn sweep_group(
        &mut self,
        group: &SocketGroupConfig,
        world: &dyn WorldQuery,
        ignored: &[ActorId],
        debug: Option<DebugTarget<'_>>,
    ) -> Vec<HitResult> {
        match group.damage_motion_type {
            DamageMotionType::Slash => self.sweep_slash(group, world, ignored, debug),
            DamageMotionType::Pierce => self.sweep_pierce(group, world, ignored, debug),
            DamageMotionType::Strike => self.sweep_strike(group, world, ignored, debug),
            DamageMotionType::None => {
                debug!(group = %group.group_name, "no damage motion type, sweep skipped");
                Vec::new()
            }
        }
    }

    fn sweep_slash(
        &mut self,
        group: &SocketGroupConfig,
        world: &dyn WorldQuery,
        ignored: &[ActorId],
        debug: Option<DebugTarget<'_>>,
    ) -> Vec<HitResult> {
        self.sweep_chain(group, world, ignored, debug)
    }

    fn sweep_pierce(
        &mut self,
        group: &SocketGroupConfig,
        world: &dyn WorldQuery,
        ignored: &[ActorId],
        debug: Option<DebugTarget<'_>>,
    ) -> Vec<HitResult> {
        self.sweep_chain(group, world, ignored, debug)
    }

    fn sweep_strike(
        &mut self,
        group: &SocketGroupConfig,
        world: &dyn WorldQuery,
        ignored: &[ActorId],
        debug: Option<DebugTarget<'_>>,
    ) -> Vec<HitResult> {
        self.sweep_chain(group, world, ignored, debug)
    }

    fn sweep_chain(
        &mut self,
        group: &SocketGroupConfig,
        world: &dyn WorldQuery,
        ignored: &[ActorId],
        mut debug: Option<DebugTarget<'_>>,
    ) -> Vec<HitResult> {
        if !group.is_sweepable() {
            debug!(
                group = %group.group_name,
                points = group.current_positions.len(),
                "not enough socket positions to sweep (need >= 2)"
            );
            return Vec::new();
        }

        let current = &group.current_positions;
        let previous = &group.previous_positions;
        if previous.len() != current.len() {
            debug!(group = %group.group_name, "previous positions out of sync, sweep skipped");
            return Vec::new();
        }

        let mut hits = Vec::new();
        for i in 0..current.len() - 1 {
            let segment = SegmentMotion {
                start_prev: previous[i],
                start_curr: current[i],
                end_prev: previous[i + 1],
                end_curr: current[i + 1],
            };
            if let Some(debug) = debug.as_mut() {
                segment.draw_outline(debug, group.trace_radius);
            }
            hits.extend(self.sweep_interpolated(
                &segment,
                group.trace_radius,
                group.current_interpolation_steps,
                world,
                ignored,
                debug.as_mut(),
            ));
        }
        trace!(group = %group.group_name, candidates = hits.len(), "group swept");
        hits
    }

    fn sweep_interpolated(
        &mut self,
        segment: &SegmentMotion,
        radius: f32,
        steps: u32,
        world: &dyn WorldQuery,
        ignored: &[ActorId],
        mut debug: Option<&mut DebugTarget<'_>>,
    ) -> Vec<HitResult> {
        let steps = steps.max(1);
        let mut hits = Vec::new();
        for step in 0..=steps {
            let alpha = step as f32 / steps as f32;
            let (start, end) = segment.at(alpha);

            hits.extend(world.sweep_capsule(&start, &end, radius, ignored));
            self.query_count += 1;

            if let Some(debug) = debug.as_deref_mut() {
                debug.sink.capsule(
                    start,
                    end,
                    radius,
                    debug.settings.color,
                    debug.settings.duration,
                );
            }
        }
        hits
    }
}

/// One chain segment at the previous and at the current sweep.
#[derive(Clone, Copy, Debug)]
struct SegmentMotion {
    start_prev: Vec3,
    start_curr: Vec3,
    end_prev: Vec3,
    end_curr: Vec3,
}

impl SegmentMotion {
    #[inline]
    fn at(&self, alpha: f32) -> (Vec3, Vec3) {
        (
            self.start_prev.lerp(&self.start_curr, alpha),
            self.end_prev.lerp(&self.end_curr, alpha),
        )
    }

    /// Trapezoid between both poses, with spheres at the corners.
    fn draw_outline(&self, debug: &mut DebugTarget<'_>, radius: f32) {
        let color = debug.settings.color.with_alpha(96);
        let duration = debug.settings.duration;
        debug.sink.line(self.start_prev, self.end_prev, color, duration);
        debug.sink.line(self.start_curr, self.end_curr, color, duration);
        debug.sink.line(self.start_prev, self.start_curr, color, duration);
        debug.sink.line(self.end_prev, self.end_curr, color, duration);
        for corner in [self.start_prev, self.start_curr, self.end_prev, self.end_curr] {
            debug.sink.sphere(corner, radius, color, duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorKind;
    use crate::debug_draw::{DebugShape, DebugShapeRecorder};
    use crate::types::{CapsuleSegment, Overlap};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingWorld {
        sweeps: RefCell<Vec<(Vec3, Vec3, f32)>>,
        reply: Vec<HitResult>,
    }

    impl WorldQuery for RecordingWorld {
        fn sweep_capsule(&self, start: &Vec3, end: &Vec3, radius: f32, _: &[ActorId]) -> Vec<HitResult> {
            self.sweeps.borrow_mut().push((*start, *end, radius));
            self.reply.clone()
        }

        fn cast_capsule(&self, _: &CapsuleSegment, _: &Vec3, _: &[ActorId]) -> Option<HitResult> {
            None
        }

        fn overlap_capsule(&self, _: &CapsuleSegment, _: &[ActorId]) -> Vec<Overlap> {
            Vec::new()
        }
    }

    fn blade(motion: DamageMotionType, steps: u32) -> SocketGroupConfig {
        let mut group = SocketGroupConfig::new("blade", 3);
        group.damage_motion_type = motion;
        group.trace_radius = 10.0;
        group.current_interpolation_steps = steps;
        group.previous_positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 50.0),
            Vec3::new(0.0, 0.0, 100.0),
        ];
        group.current_positions = vec![
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 50.0),
            Vec3::new(10.0, 0.0, 100.0),
        ];
        group
    }

    #[test]
    fn three_points_one_step_issue_four_queries() {
        let world = RecordingWorld::default();
        let mut engine = SweepEngine::new();
        engine.sweep_group(&blade(DamageMotionType::Slash, 1), &world, &[], None);

        let sweeps = world.sweeps.borrow();
        assert_eq!(sweeps.len(), 4);
        assert_eq!(engine.query_count(), 4);
        // Pair 0-1 at the previous pose, then at the current pose.
        assert_eq!(sweeps[0], (Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 50.0), 10.0));
        assert_eq!(sweeps[1], (Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 50.0), 10.0));
        assert_eq!(sweeps[2].0, Vec3::new(0.0, 0.0, 50.0));
        assert_eq!(sweeps[3].1, Vec3::new(10.0, 0.0, 100.0));
    }

    #[test]
    fn interpolation_steps_subdivide_motion() {
        let world = RecordingWorld::default();
        let mut engine = SweepEngine::new();
        engine.sweep_group(&blade(DamageMotionType::Slash, 4), &world, &[], None);

        let sweeps = world.sweeps.borrow();
        assert_eq!(sweeps.len(), 2 * 5);
        assert_eq!(sweeps[2].0, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn zero_steps_behave_as_one() {
        let world = RecordingWorld::default();
        let mut engine = SweepEngine::new();
        engine.sweep_group(&blade(DamageMotionType::Slash, 0), &world, &[], None);
        assert_eq!(world.sweeps.borrow().len(), 4);
    }

    #[test]
    fn every_motion_type_with_geometry_sweeps_except_none() {
        for motion in [DamageMotionType::Pierce, DamageMotionType::Strike] {
            let world = RecordingWorld::default();
            SweepEngine::new().sweep_group(&blade(motion, 1), &world, &[], None);
            assert_eq!(world.sweeps.borrow().len(), 4);
        }
        let world = RecordingWorld::default();
        let hits = SweepEngine::new().sweep_group(&blade(DamageMotionType::None, 1), &world, &[], None);
        assert!(hits.is_empty());
        assert!(world.sweeps.borrow().is_empty());
    }

    #[test]
    fn short_chain_is_skipped() {
        let world = RecordingWorld::default();
        let mut group = blade(DamageMotionType::Slash, 1);
        group.current_positions.truncate(1);
        group.previous_positions.truncate(1);
        let hits = SweepEngine::new().sweep_group(&group, &world, &[], None);
        assert!(hits.is_empty());
        assert!(world.sweeps.borrow().is_empty());
    }

    #[test]
    fn candidates_accumulate_across_pairs_and_steps() {
        let target = ActorId::new(3, ActorKind::Character);
        let world = RecordingWorld {
            reply: vec![HitResult {
                actor: target,
                location: Vec3::zeros(),
                impact_point: Vec3::zeros(),
                impact_normal: Vec3::z(),
                distance: 0.0,
                from_sweep: true,
                start_penetrating: false,
            }],
            ..Default::default()
        };
        let hits = SweepEngine::new().sweep_group(&blade(DamageMotionType::Slash, 1), &world, &[], None);
        assert_eq!(hits.len(), 4);
        assert!(hits.iter().all(|h| h.actor == target));
    }

    #[test]
    fn debug_draws_each_query_capsule() {
        let world = RecordingWorld::default();
        let mut rec = DebugShapeRecorder::default();
        let settings = DebugSettings::default();
        SweepEngine::new().sweep_group(
            &blade(DamageMotionType::Slash, 2),
            &world,
            &[],
            Some(DebugTarget {
                sink: &mut rec,
                settings: &settings,
            }),
        );
        assert_eq!(rec.capsule_count(), 2 * 3);
        assert_eq!(rec.line_count(), 2 * 4);
        assert!(rec.shapes.iter().any(|s| matches!(s, DebugShape::Sphere { .. })));
    }
}
