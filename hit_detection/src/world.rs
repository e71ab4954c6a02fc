/*!
Capabilities the hit-detection core consumes from its host.

- [`WorldQuery`]: synchronous shape queries against target colliders.
- [`SocketResolver`]: world-space location of a named mesh point.
- [`OwnerInfo`]: who is attacking, and who must never be hit by the attack.

`RapierQueryWorld` and `SocketRig` are the concrete implementations shipped with the crate;
tests script their own.
*/

use crate::actor::ActorId;
use crate::types::{CapsuleSegment, HitResult, Overlap, Transform, Vec3};

pub trait WorldQuery {
    /// Sweep a capsule of `radius` from `start` to `end` and report every actor it touches,
    /// one result per actor, skipping `ignored`.
    fn sweep_capsule(
        &self,
        start: &Vec3,
        end: &Vec3,
        radius: f32,
        ignored: &[ActorId],
    ) -> Vec<HitResult>;

    /// Cast `capsule` along `motion` and report the first actor it would touch, skipping
    /// `ignored`. A target already touching the capsule at the start is reported with
    /// `start_penetrating` set.
    fn cast_capsule(
        &self,
        capsule: &CapsuleSegment,
        motion: &Vec3,
        ignored: &[ActorId],
    ) -> Option<HitResult>;

    /// Every actor overlapping `capsule`, skipping `ignored`.
    fn overlap_capsule(&self, capsule: &CapsuleSegment, ignored: &[ActorId]) -> Vec<Overlap>;
}

pub trait SocketResolver {
    /// `None` when the point no longer exists.
    fn socket_location(&self, name: &str) -> Option<Vec3>;

    /// World transform of the mesh the sockets belong to, when known.
    fn owner_transform(&self) -> Option<Transform> {
        None
    }
}

impl<F> SocketResolver for F
where
    F: Fn(&str) -> Option<Vec3>,
{
    fn socket_location(&self, name: &str) -> Option<Vec3> {
        self(name)
    }
}

/// Attack ownership.
///
/// For a wielded weapon, `actor` is the weapon and `character` its wielder. For a creature
/// attacking with its own body, `actor` is the creature and `character` is `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerInfo {
    pub actor: ActorId,
    pub character: Option<ActorId>,
    /// Extra actors the attack never hits (e.g. allies, mounts).
    pub extra_ignored: Vec<ActorId>,
}

impl OwnerInfo {
    pub fn weapon(weapon: ActorId, wielder: ActorId) -> Self {
        Self {
            actor: weapon,
            character: Some(wielder),
            extra_ignored: Vec::new(),
        }
    }

    pub fn creature(creature: ActorId) -> Self {
        Self {
            actor: creature,
            character: None,
            extra_ignored: Vec::new(),
        }
    }

    pub fn with_ignored(mut self, actor: ActorId) -> Self {
        self.extra_ignored.push(actor);
        self
    }

    /// Owner, wielder and extra ignored actors.
    pub fn ignored_actors(&self) -> Vec<ActorId> {
        let mut ignored = Vec::with_capacity(2 + self.extra_ignored.len());
        ignored.push(self.actor);
        ignored.extend(self.character);
        ignored.extend(self.extra_ignored.iter().copied());
        ignored
    }

    /// True for the owner and its wielder.
    #[inline]
    pub fn owns(&self, actor: ActorId) -> bool {
        self.actor == actor || self.character == Some(actor)
    }
}
