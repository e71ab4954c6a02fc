/*!
Core hit-detection types and math aliases shared by the rest of the crate.

This module intentionally contains no algorithms. It defines the data exchanged between:
- the world-query capability (sweeps, casts, overlaps against target colliders)
- the sweep geometry engine and the CCD detector (which produce candidate hits)
- the validator and the damage bridge (which consume them)
*/

use nalgebra as na;

use crate::actor::ActorId;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// A rigid transform (isometry) in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::new(0.0, 0.0, 0.0),
        rotation: Quat::new_unchecked(na::Quaternion::new(1.0, 0.0, 0.0, 0.0)),
    };

    #[inline]
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Convert to nalgebra `Isometry3` for use with rapier/parry queries.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(
            na::Translation3::new(self.translation.x, self.translation.y, self.translation.z),
            self.rotation,
        )
    }

    /// Transform a local-space point into world space.
    #[inline]
    pub fn transform_point(&self, local: &Vec3) -> Vec3 {
        self.rotation * local + self.translation
    }
}

/// A capsule placed in the world, expressed by its two segment endpoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleSegment {
    pub a: Vec3,
    pub b: Vec3,
    pub radius: f32,
}

impl CapsuleSegment {
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.a + self.b) * 0.5
    }

    #[inline]
    pub fn half_height(&self) -> f32 {
        (self.b - self.a).norm() * 0.5
    }
}

/// One collision result reported by the world for a single actor.
///
/// Both strategies produce these: the sweep strategy from capsule sweeps, the CCD strategy
/// from its swept cast or from a plain overlap (in which case the geometry is synthesized,
/// see `from_sweep`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitResult {
    /// Actor owning the collider that was hit.
    pub actor: ActorId,
    /// Position of the query shape at the time of the hit.
    pub location: Vec3,
    /// World-space contact point on the hit collider.
    pub impact_point: Vec3,
    /// World-space contact normal, pointing from the hit collider towards the query shape.
    pub impact_normal: Vec3,
    /// Separation between the query shape and the collider (negative while penetrating).
    pub distance: f32,
    /// True when the data comes from an actual sweep/cast, false when synthesized from an overlap.
    pub from_sweep: bool,
    /// True when the query shape already overlapped the collider at the start of the query.
    pub start_penetrating: bool,
}

/// An actor found overlapping a query shape, without contact geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlap {
    pub actor: ActorId,
    /// World-space location of the overlapped actor's collider.
    pub actor_location: Vec3,
}

/// Safe normalize: returns zero for degenerate vectors.
#[inline]
pub fn safe_normal(v: &Vec3) -> Vec3 {
    let len_sq = v.norm_squared();
    if len_sq > 1.0e-12 {
        v / len_sq.sqrt()
    } else {
        Vec3::zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_is_a_no_op() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Transform::IDENTITY.transform_point(&p), p);
        assert_eq!(Transform::default(), Transform::IDENTITY);
    }

    #[test]
    fn transform_point_rotates_then_translates() {
        let t = Transform::new(
            Vec3::new(10.0, 0.0, 0.0),
            Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2),
        );
        let p = t.transform_point(&Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(10.0, 1.0, 0.0)).norm() < 1.0e-5);
    }

    #[test]
    fn segment_center_and_half_height() {
        let seg = CapsuleSegment {
            a: Vec3::new(0.0, 0.0, 0.0),
            b: Vec3::new(0.0, 0.0, 100.0),
            radius: 10.0,
        };
        assert_eq!(seg.center(), Vec3::new(0.0, 0.0, 50.0));
        assert_eq!(seg.half_height(), 50.0);
    }

    #[test]
    fn safe_normal_of_zero_is_zero() {
        assert_eq!(safe_normal(&Vec3::zeros()), Vec3::zeros());
        assert_eq!(safe_normal(&Vec3::new(0.0, 3.0, 0.0)), Vec3::new(0.0, 1.0, 0.0));
    }
}
