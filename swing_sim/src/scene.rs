//! Arena description loaded from TOML: who attacks, how the swing moves, what stands
//! in the way.

use std::path::Path;

use hit_detection::{
    ActorId, ActorKind, DefenseProfile, Quat, ReactionThresholds, SocketRig, TargetDef,
    TargetShape, Transform, Vec3, Vitals,
};
use nalgebra as na;
use serde::Deserialize;

use crate::error::{Result, SimError};

#[derive(Clone, Debug, Deserialize)]
pub struct SceneDef {
    #[serde(default = "default_dt")]
    pub dt: f32,
    pub attacker: AttackerDef,
    pub swing: SwingDef,
    #[serde(default)]
    pub targets: Vec<TargetEntry>,
}

fn default_dt() -> f32 {
    1.0 / 60.0
}

/// The attacking actor and the local line its socket chains are laid along.
#[derive(Clone, Debug, Deserialize)]
pub struct AttackerDef {
    pub id: u64,
    #[serde(default)]
    pub position: [f32; 3],
    pub chain_from: [f32; 3],
    pub chain_to: [f32; 3],
}

/// A horizontal arc around the attacker, alternating direction every swing.
#[derive(Clone, Debug, Deserialize)]
pub struct SwingDef {
    pub start_yaw: f32,
    pub end_yaw: f32,
    /// Length of the hit window (seconds).
    pub window: f32,
    /// Time between two hit windows (seconds).
    #[serde(default)]
    pub recovery: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Character,
    Creature,
    Prop,
}

impl From<TargetKind> for ActorKind {
    fn from(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Character => ActorKind::Character,
            TargetKind::Creature => ActorKind::Creature,
            TargetKind::Prop => ActorKind::Prop,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TargetEntry {
    pub name: String,
    pub id: u64,
    pub kind: TargetKind,
    pub position: [f32; 3],
    #[serde(default)]
    pub yaw: f32,
    pub shape: TargetShape,
    #[serde(default = "default_health")]
    pub health: f32,
    #[serde(default = "default_poise")]
    pub poise: f32,
    #[serde(default)]
    pub defense: f32,
    #[serde(default)]
    pub blocking: bool,
    #[serde(default)]
    pub reactions: ReactionThresholds,
}

fn default_health() -> f32 {
    100.0
}

fn default_poise() -> f32 {
    50.0
}

impl TargetEntry {
    pub fn actor(&self) -> ActorId {
        ActorId::new(self.id, self.kind.into())
    }

    pub fn to_def(&self) -> TargetDef {
        TargetDef {
            actor: self.actor(),
            translation: Vec3::from(self.position),
            rotation: yaw(self.yaw),
            shape: self.shape,
        }
    }

    pub fn defense(&self) -> DefenseProfile {
        DefenseProfile::new(Vitals::new(self.health, self.poise, self.defense))
            .with_thresholds(self.reactions)
    }
}

/// Rotation about +Y by `degrees`.
pub fn yaw(degrees: f32) -> Quat {
    na::UnitQuaternion::from_axis_angle(&na::Vector3::y_axis(), degrees.to_radians())
}

impl SceneDef {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scene: Self = toml::from_str(content)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dt <= 0.0 {
            return Err(SimError::InvalidScene("dt must be positive".into()));
        }
        if self.swing.window <= 0.0 {
            return Err(SimError::InvalidScene("swing window must be positive".into()));
        }
        for (i, target) in self.targets.iter().enumerate() {
            if self.targets[..i].iter().any(|t| t.actor() == target.actor()) {
                return Err(SimError::InvalidScene(format!(
                    "target {} reuses actor {}",
                    target.name,
                    target.actor()
                )));
            }
        }
        Ok(())
    }

    /// Yaw of swing `index` at `alpha` through its window.
    pub fn swing_yaw(&self, index: usize, alpha: f32) -> f32 {
        let (from, to) = if index % 2 == 0 {
            (self.swing.start_yaw, self.swing.end_yaw)
        } else {
            (self.swing.end_yaw, self.swing.start_yaw)
        };
        from + (to - from) * alpha.clamp(0.0, 1.0)
    }

    /// Rig with every `(group, count)` chain laid along the attacker's chain line.
    pub fn rig<'a>(&self, chains: impl IntoIterator<Item = (&'a str, usize)>) -> SocketRig {
        let transform = Transform::new(
            Vec3::from(self.attacker.position),
            yaw(self.swing.start_yaw),
        );
        let from = Vec3::from(self.attacker.chain_from);
        let to = Vec3::from(self.attacker.chain_to);
        chains
            .into_iter()
            .fold(SocketRig::new(transform), |rig, (group, count)| {
                rig.with_chain(group, count, from, to)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARENA: &str = r#"
        dt = 0.02

        [attacker]
        id = 1
        chain_from = [20.0, 0.0, 0.0]
        chain_to = [120.0, 0.0, 0.0]

        [swing]
        start_yaw = -60.0
        end_yaw = 60.0
        window = 0.24

        [[targets]]
        name = "dummy"
        id = 10
        kind = "character"
        position = [80.0, 0.0, 0.0]
        shape = { kind = "capsule_y", radius = 30.0, half_height = 60.0 }
    "#;

    #[test]
    fn arena_parses_with_defaults() {
        let scene = SceneDef::from_toml_str(ARENA).unwrap();
        assert_eq!(scene.dt, 0.02);
        assert_eq!(scene.targets.len(), 1);
        let target = &scene.targets[0];
        assert_eq!(target.actor(), ActorId::new(10, ActorKind::Character));
        assert_eq!(target.health, 100.0);
        assert!(!target.blocking);
        assert_eq!(target.reactions, ReactionThresholds::default());
    }

    #[test]
    fn swings_alternate_direction() {
        let scene = SceneDef::from_toml_str(ARENA).unwrap();
        assert_eq!(scene.swing_yaw(0, 0.0), -60.0);
        assert_eq!(scene.swing_yaw(0, 1.0), 60.0);
        assert_eq!(scene.swing_yaw(1, 0.0), 60.0);
        assert_eq!(scene.swing_yaw(1, 0.5), 0.0);
    }

    #[test]
    fn duplicate_targets_are_rejected() {
        let doubled = format!(
            "{ARENA}\n{}",
            r#"
            [[targets]]
            name = "twin"
            id = 10
            kind = "character"
            position = [0.0, 0.0, 80.0]
            shape = { kind = "ball", radius = 10.0 }
            "#
        );
        assert!(matches!(
            SceneDef::from_toml_str(&doubled),
            Err(SimError::InvalidScene(_))
        ));
    }

    #[test]
    fn rig_lays_out_every_chain() {
        let scene = SceneDef::from_toml_str(ARENA).unwrap();
        let rig = scene.rig([("blade", 3), ("guard", 2)]);
        assert_eq!(rig.len(), 5);
        assert_eq!(rig.local_offset("blade_2"), Some(Vec3::new(120.0, 0.0, 0.0)));
    }
}
