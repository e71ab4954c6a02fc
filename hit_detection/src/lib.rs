/*!
Melee hit detection.

Two interchangeable strategies behind [`HitDetectionStrategy`]:
- trace: adaptive, interpolated capsule sweeps along socket chains (`trace`)
- ccd: one capsule fitted to the weapon, cast between poses and overlapped (`ccd`)

Both are driven by the same arm/tick/disarm cycle and report validated hits through
an observer list. World access goes through the [`WorldQuery`] and [`SocketResolver`]
capabilities; [`RapierQueryWorld`] and [`SocketRig`] are the bundled implementations.
*/

pub mod actor;
pub mod adaptive;
pub mod bridge;
pub mod ccd;
pub mod config;
pub mod constants;
pub mod data;
pub mod debug_draw;
pub mod defense;
pub mod error;
pub mod notify;
pub mod rapier_world;
pub mod rig;
pub mod socket_group;
pub mod strategy;
pub mod sweep;
pub mod trace;
pub mod types;
pub mod validator;
pub mod world;

pub use actor::{ActorId, ActorKind};
pub use adaptive::{AdaptiveTraceEntry, default_adaptive_table, select_entry, swing_speed};
pub use bridge::{AttackContext, HitEvent, Observers, SubscriptionToken};
pub use ccd::CcdDetector;
pub use config::{CcdSettings, DebugSettings, DetectionMode, HitDetectionSettings};
pub use data::{
    AttackDataSource, AttackKey, AttackStats, CreatureData, DamageMotionType, OwnerAttributes,
    TagSet, WeaponData, WeaponProfile,
};
pub use debug_draw::{DebugDraw, DebugShapeRecorder, NullDebugDraw, Rgba};
pub use defense::{DefenseProfile, ReactionLevel, ReactionThresholds, Vitals};
pub use error::{HitDetectionError, Result};
pub use notify::{ComboListener, ComboTracker, HitDetectionSetter, HitWindowNotify};
pub use rapier_world::{RapierQueryWorld, TargetDef, TargetShape};
pub use rig::SocketRig;
pub use socket_group::{SocketGroupConfig, SocketGroupRegistry};
pub use strategy::{ArmingState, HitDetectionStrategy, TickContext, build_detector};
pub use trace::TraceDetector;
pub use types::{CapsuleSegment, HitResult, Iso, Overlap, Quat, Transform, Vec3};
pub use validator::{CcdHitLog, HitValidator};
pub use world::{OwnerInfo, SocketResolver, WorldQuery};
