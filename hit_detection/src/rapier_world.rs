//! Rapier-backed world-query capability.
//!
//! Builds an in-memory Rapier scene from target collider definitions and answers the
//! capsule queries of [`WorldQuery`] against it.
//!
//! Design
//! - Query-only: there are no dynamics. Targets are moved explicitly with
//!   [`RapierQueryWorld::move_target`], which refits the broad-phase for that target.
//! - Actor identity: every collider carries its owner's packed [`ActorId`] in
//!   `Collider::user_data`. Colliders whose user data does not decode are never reported.
//! - Deterministic: targets are inserted in `actor` order and results are sorted.

use std::collections::HashMap;

use rapier3d::na::{Point3, Translation3};
use rapier3d::parry::query::{self, ShapeCastOptions};
use rapier3d::parry::shape::{Ball, Capsule, Shape};
use rapier3d::prelude::{
    BroadPhaseBvh, Collider, ColliderBuilder, ColliderHandle, ColliderSet, IntegrationParameters,
    NarrowPhase, QueryFilter, QueryPipeline, RigidBodySet,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actor::ActorId;
use crate::types::{CapsuleSegment, HitResult, Iso, Overlap, Quat, Vec3, safe_normal};
use crate::world::WorldQuery;

/// Collider shapes a target can have.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetShape {
    Ball { radius: f32 },
    /// Y-aligned capsule.
    CapsuleY { radius: f32, half_height: f32 },
    Cuboid { half_extents: [f32; 3] },
}

/// A hittable collider owned by `actor`.
#[derive(Clone, Debug)]
pub struct TargetDef {
    pub actor: ActorId,
    pub translation: Vec3,
    pub rotation: Quat,
    pub shape: TargetShape,
}

pub struct RapierQueryWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    by_actor: HashMap<ActorId, Vec<ColliderHandle>>,
    dt: f32,
}

impl RapierQueryWorld {
    pub fn build(targets: impl IntoIterator<Item = TargetDef>, dt: f32) -> Self {
        let mut targets: Vec<TargetDef> = targets.into_iter().collect();
        targets.sort_by_key(|t| t.actor);

        let mut colliders = ColliderSet::new();
        let mut by_actor: HashMap<ActorId, Vec<ColliderHandle>> = HashMap::new();
        let mut modified_colliders = Vec::with_capacity(targets.len());

        for def in targets {
            let mut collider = collider_from_target(&def);
            collider.set_position(Iso::from_parts(
                Translation3::from(def.translation),
                def.rotation,
            ));
            let handle = colliders.insert(collider);
            by_actor.entry(def.actor).or_default().push(handle);
            modified_colliders.push(handle);
        }

        let mut world = Self {
            bodies: RigidBodySet::new(),
            colliders,
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::default(),
            by_actor,
            dt,
        };
        world.update_broad_phase(&modified_colliders);
        debug!(colliders = world.colliders.len(), "query world built");
        world
    }

    /// Moves every collider of `actor`. Returns `false` for unknown actors.
    pub fn move_target(&mut self, actor: ActorId, translation: Vec3, rotation: Quat) -> bool {
        let Some(handles) = self.by_actor.get(&actor).cloned() else {
            return false;
        };
        let iso = Iso::from_parts(Translation3::from(translation), rotation);
        for handle in &handles {
            if let Some(collider) = self.colliders.get_mut(*handle) {
                collider.set_position(iso);
            }
        }
        self.update_broad_phase(&handles);
        true
    }

    /// World-space position of the first collider of `actor`.
    pub fn target_location(&self, actor: ActorId) -> Option<Vec3> {
        let handle = self.by_actor.get(&actor)?.first()?;
        let collider = self.colliders.get(*handle)?;
        Some(collider.position().translation.vector)
    }

    pub fn target_count(&self) -> usize {
        self.by_actor.len()
    }

    fn update_broad_phase(&mut self, modified: &[ColliderHandle]) {
        let mut events = Vec::new();
        self.broad_phase.update(
            &IntegrationParameters {
                dt: self.dt,
                ..IntegrationParameters::default()
            },
            &self.colliders,
            &self.bodies,
            modified,
            &[],
            &mut events,
        );
    }

    fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    /// Colliders intersecting `shape`, one entry per actor, in actor order.
    fn intersecting_actors(
        &self,
        shape: &dyn Shape,
        ignored: &[ActorId],
    ) -> Vec<(ActorId, ColliderHandle)> {
        let predicate = |_: ColliderHandle, c: &Collider| accepts(c, ignored);
        let filter = QueryFilter::default().predicate(&predicate);
        let pipeline = self.query_pipeline(filter);

        let mut found: Vec<(ActorId, ColliderHandle)> = Vec::new();
        for (handle, collider) in pipeline.intersect_shape(Iso::identity(), shape) {
            let Some(actor) = ActorId::from_bits(collider.user_data) else {
                continue;
            };
            if !found.iter().any(|(a, _)| *a == actor) {
                found.push((actor, handle));
            }
        }
        found.sort_by_key(|(a, _)| *a);
        found
    }
}

fn accepts(collider: &Collider, ignored: &[ActorId]) -> bool {
    ActorId::from_bits(collider.user_data).is_some_and(|actor| !ignored.contains(&actor))
}

fn collider_from_target(def: &TargetDef) -> Collider {
    let builder = match def.shape {
        TargetShape::Ball { radius } => ColliderBuilder::ball(radius),
        TargetShape::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(half_height, radius),
        TargetShape::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents[0], half_extents[1], half_extents[2])
        }
    };
    builder.user_data(def.actor.to_bits()).build()
}

#[inline]
fn capsule_shape(segment: &CapsuleSegment) -> Capsule {
    Capsule::new(
        Point3::from(segment.a),
        Point3::from(segment.b),
        segment.radius,
    )
}

/// Closest points between a query shape at `pose` and a collider.
fn contact_with(
    pose: &Iso,
    shape: &dyn Shape,
    collider: &Collider,
    prediction: f32,
) -> Option<(Vec3, Vec3, f32)> {
    match query::contact(pose, shape, collider.position(), collider.shape(), prediction) {
        Ok(Some(c)) => Some((c.point2.coords, c.normal2.into_inner(), c.dist)),
        _ => None,
    }
}

impl WorldQuery for RapierQueryWorld {
    fn sweep_capsule(
        &self,
        start: &Vec3,
        end: &Vec3,
        radius: f32,
        ignored: &[ActorId],
    ) -> Vec<HitResult> {
        let segment = CapsuleSegment {
            a: *start,
            b: *end,
            radius,
        };
        let swept = capsule_shape(&segment);
        let start_ball = Ball::new(radius);
        let start_pose = Iso::translation(start.x, start.y, start.z);
        let travel = end - start;
        let travel_len_sq = travel.norm_squared();

        let mut hits = Vec::new();
        for (actor, handle) in self.intersecting_actors(&swept, ignored) {
            let Some(collider) = self.colliders.get(handle) else {
                continue;
            };
            let collider_center = collider.position().translation.vector;
            let (impact_point, impact_normal, _) =
                contact_with(&Iso::identity(), &swept, collider, radius).unwrap_or((
                    collider_center,
                    safe_normal(&(segment.center() - collider_center)),
                    0.0,
                ));

            // Where along the sweep the sphere reaches the impact.
            let t = if travel_len_sq > 0.0 {
                ((impact_point - start).dot(&travel) / travel_len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let start_penetrating = query::intersection_test(
                &start_pose,
                &start_ball,
                collider.position(),
                collider.shape(),
            )
            .unwrap_or(false);

            hits.push(HitResult {
                actor,
                location: start + travel * t,
                impact_point,
                impact_normal,
                distance: travel_len_sq.sqrt() * t,
                from_sweep: true,
                start_penetrating,
            });
        }
        hits
    }

    fn cast_capsule(
        &self,
        capsule: &CapsuleSegment,
        motion: &Vec3,
        ignored: &[ActorId],
    ) -> Option<HitResult> {
        let shape = capsule_shape(capsule);
        let predicate = |_: ColliderHandle, c: &Collider| accepts(c, ignored);
        let filter = QueryFilter::default().predicate(&predicate);
        let pipeline = self.query_pipeline(filter);

        let mut options = ShapeCastOptions::with_max_time_of_impact(1.0);
        options.stop_at_penetration = true;
        let (handle, hit) = pipeline.cast_shape(&Iso::identity(), motion, &shape, options)?;

        let collider = self.colliders.get(handle)?;
        let actor = ActorId::from_bits(collider.user_data)?;
        let toi = hit.time_of_impact;
        let offset = motion * toi;
        let pose = Iso::translation(offset.x, offset.y, offset.z);
        let collider_center = collider.position().translation.vector;
        let moved_center = capsule.center() + offset;

        let (impact_point, impact_normal, _) =
            contact_with(&pose, &shape, collider, capsule.radius).unwrap_or((
                collider_center,
                safe_normal(&(moved_center - collider_center)),
                0.0,
            ));

        Some(HitResult {
            actor,
            location: moved_center,
            impact_point,
            impact_normal,
            distance: motion.norm() * toi,
            from_sweep: true,
            start_penetrating: toi <= f32::EPSILON,
        })
    }

    fn overlap_capsule(&self, capsule: &CapsuleSegment, ignored: &[ActorId]) -> Vec<Overlap> {
        let shape = capsule_shape(capsule);
        self.intersecting_actors(&shape, ignored)
            .into_iter()
            .filter_map(|(actor, handle)| {
                let collider = self.colliders.get(handle)?;
                Some(Overlap {
                    actor,
                    actor_location: collider.position().translation.vector,
                })
            })
            .collect()
    }
}
