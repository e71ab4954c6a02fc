/*!
Static attack data and the sources that resolve it.

Two data shapes exist:
- `WeaponData`: attacks are keyed by a tag set and matched by exact set equality.
  Damage scales with the wielder's strength/dexterity.
- `CreatureData`: attacks are keyed by name. Damage is the creature's base damage.

Both load from TOML and expose the same [`AttackDataSource`] capability, which is what
detectors are built from.

Inputs
- `combo_index` is clamped into `[0, combo_len - 1]`, so an out-of-range index plays the
  nearest combo step instead of failing.
*/

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bridge::AttackContext;
use crate::constants::DEFAULT_TRACE_RADIUS;
use crate::error::{HitDetectionError, Result};

/// Selects the sweep variant of a socket group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageMotionType {
    #[default]
    None,
    Slash,
    Strike,
    Pierce,
}

/// One named socket chain on a mesh. Points are named `"{name}_{index}"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitSocketInfo {
    pub name: String,
    /// Non-positive counts produce an empty, unusable chain.
    pub count: i32,
}

/// Socket group used by an attack, with the radius for that attack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackSocketConfig {
    pub socket_name: String,
    #[serde(default = "default_trace_radius")]
    pub trace_radius: f32,
}

fn default_trace_radius() -> f32 {
    DEFAULT_TRACE_RADIUS
}

/// Stats of one combo step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackStats {
    pub damage_type: DamageMotionType,
    pub damage_multiplier: f32,
    pub poise_damage: f32,
    pub stamina_cost: f32,
    pub sockets: Vec<AttackSocketConfig>,
    /// Allow repeated hits on one target, gated by the hit cooldown.
    pub multi_hit: bool,
}

impl Default for AttackStats {
    fn default() -> Self {
        Self {
            damage_type: DamageMotionType::None,
            damage_multiplier: 1.0,
            poise_damage: 10.0,
            stamina_cost: 10.0,
            sockets: Vec::new(),
            multi_hit: false,
        }
    }
}

/// Order-independent set of gameplay tags, e.g. `{"Attack.Light"}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tags.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{tag}")?;
        }
        write!(f, "}}")
    }
}

/// How the caller names the attack to arm.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttackKey {
    Name(String),
    Tags(TagSet),
}

impl AttackKey {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Tags(TagSet::new(tags))
    }
}

impl fmt::Display for AttackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackKey::Name(name) => write!(f, "{name}"),
            AttackKey::Tags(tags) => write!(f, "{tags}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaggedAttackData {
    pub tags: TagSet,
    pub combo: Vec<AttackStats>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockData {
    /// Percent of incoming damage removed while blocking, 0..=100.
    pub damage_reduction: f32,
    pub stamina_cost: f32,
}

impl Default for BlockData {
    fn default() -> Self {
        Self {
            damage_reduction: 50.0,
            stamina_cost: 10.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponData {
    pub name: String,
    #[serde(default)]
    pub hit_sockets: Vec<HitSocketInfo>,
    #[serde(default = "default_base_damage")]
    pub base_damage: f32,
    /// Percent, 0..=100.
    #[serde(default = "default_scaling")]
    pub strength_scaling: f32,
    /// Percent, 0..=100.
    #[serde(default = "default_scaling")]
    pub dexterity_scaling: f32,
    #[serde(default)]
    pub attacks: Vec<TaggedAttackData>,
    #[serde(default)]
    pub block: BlockData,
}

fn default_base_damage() -> f32 {
    100.0
}

fn default_scaling() -> f32 {
    60.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedAttackData {
    pub combo: Vec<AttackStats>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatureData {
    pub name: String,
    #[serde(default = "default_base_damage")]
    pub base_damage: f32,
    #[serde(default)]
    pub hit_sockets: Vec<HitSocketInfo>,
    #[serde(default)]
    pub attacks: BTreeMap<String, NamedAttackData>,
}

macro_rules! impl_toml_loading {
    ($ty:ty) => {
        impl $ty {
            pub fn from_toml_str(content: &str) -> Result<Self> {
                Ok(toml::from_str(content)?)
            }

            pub fn load_from_file(path: &Path) -> Result<Self> {
                let content = std::fs::read_to_string(path)?;
                Self::from_toml_str(&content)
            }
        }
    };
}

impl_toml_loading!(WeaponData);
impl_toml_loading!(CreatureData);

impl WeaponData {
    /// Exact tag-set match; the first matching entry wins.
    pub fn attack_by_tags(&self, tags: &TagSet) -> Option<&TaggedAttackData> {
        self.attacks.iter().find(|a| &a.tags == tags)
    }
}

/// Wielder attributes feeding weapon damage scaling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnerAttributes {
    pub strength: f32,
    pub dexterity: f32,
}

/// The attack selected for one combo step, with its final payload.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedAttack {
    pub stats: AttackStats,
    pub context: AttackContext,
}

/// Resolves attack keys into stats and socket usage.
pub trait AttackDataSource {
    /// Socket chains available to every attack of this source.
    fn hit_sockets(&self) -> &[HitSocketInfo];

    fn resolve_attack(&self, key: &AttackKey, combo_index: i32) -> Result<ResolvedAttack>;
}

fn pick_combo_step<'a>(
    key: &AttackKey,
    combo: &'a [AttackStats],
    combo_index: i32,
) -> Result<&'a AttackStats> {
    if combo.is_empty() {
        return Err(HitDetectionError::EmptyCombo(key.to_string()));
    }
    let last = combo.len() as i32 - 1;
    Ok(&combo[combo_index.clamp(0, last) as usize])
}

fn resolve_with_damage(stats: &AttackStats, damage: f32) -> ResolvedAttack {
    ResolvedAttack {
        stats: stats.clone(),
        context: AttackContext {
            final_damage: damage * stats.damage_multiplier,
            poise_damage: stats.poise_damage,
            damage_motion_type: stats.damage_type,
        },
    }
}

/// A weapon as wielded by a specific owner.
#[derive(Clone, Debug)]
pub struct WeaponProfile {
    data: WeaponData,
    attributes: OwnerAttributes,
    calculated_damage: f32,
}

impl WeaponProfile {
    pub fn new(data: WeaponData, attributes: OwnerAttributes) -> Self {
        let calculated_damage = calculate_weapon_damage(&data, &attributes);
        Self {
            data,
            attributes,
            calculated_damage,
        }
    }

    #[inline]
    pub fn data(&self) -> &WeaponData {
        &self.data
    }

    #[inline]
    pub fn calculated_damage(&self) -> f32 {
        self.calculated_damage
    }

    pub fn attributes(&self) -> OwnerAttributes {
        self.attributes
    }

    /// Recomputes calculated damage.
    pub fn set_owner_attributes(&mut self, attributes: OwnerAttributes) {
        self.attributes = attributes;
        self.calculated_damage = calculate_weapon_damage(&self.data, &attributes);
        tracing::debug!(
            weapon = %self.data.name,
            damage = self.calculated_damage,
            "weapon damage recalculated"
        );
    }
}

/// `base + strength * strength_scaling% + dexterity * dexterity_scaling%`.
pub fn calculate_weapon_damage(data: &WeaponData, attributes: &OwnerAttributes) -> f32 {
    let strength_bonus = attributes.strength * data.strength_scaling * 0.01;
    let dexterity_bonus = attributes.dexterity * data.dexterity_scaling * 0.01;
    data.base_damage + strength_bonus + dexterity_bonus
}

impl AttackDataSource for WeaponProfile {
    fn hit_sockets(&self) -> &[HitSocketInfo] {
        &self.data.hit_sockets
    }

    fn resolve_attack(&self, key: &AttackKey, combo_index: i32) -> Result<ResolvedAttack> {
        let AttackKey::Tags(tags) = key else {
            return Err(HitDetectionError::UnsupportedAttackKey(key.to_string()));
        };
        let attack = self
            .data
            .attack_by_tags(tags)
            .ok_or_else(|| HitDetectionError::AttackNotFound(key.to_string()))?;
        let stats = pick_combo_step(key, &attack.combo, combo_index)?;
        Ok(resolve_with_damage(stats, self.calculated_damage))
    }
}

impl AttackDataSource for CreatureData {
    fn hit_sockets(&self) -> &[HitSocketInfo] {
        &self.hit_sockets
    }

    fn resolve_attack(&self, key: &AttackKey, combo_index: i32) -> Result<ResolvedAttack> {
        let AttackKey::Name(name) = key else {
            return Err(HitDetectionError::UnsupportedAttackKey(key.to_string()));
        };
        let attack = self
            .attacks
            .get(name)
            .ok_or_else(|| HitDetectionError::AttackNotFound(name.clone()))?;
        let stats = pick_combo_step(key, &attack.combo, combo_index)?;
        Ok(resolve_with_damage(stats, self.base_damage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWORD: &str = r#"
        name = "longsword"
        base_damage = 100.0
        strength_scaling = 50.0
        dexterity_scaling = 20.0

        [[hit_sockets]]
        name = "blade"
        count = 3

        [[attacks]]
        tags = ["Attack.Light"]

        [[attacks.combo]]
        damage_type = "Slash"
        damage_multiplier = 1.0
        poise_damage = 15.0
        sockets = [{ socket_name = "blade", trace_radius = 8.0 }]

        [[attacks.combo]]
        damage_type = "Pierce"
        damage_multiplier = 1.5
        sockets = [{ socket_name = "blade" }]

        [[attacks]]
        tags = ["Attack.Heavy", "Attack.Charged"]

        [[attacks.combo]]
        damage_type = "Strike"
        damage_multiplier = 2.0
        multi_hit = true
    "#;

    const WOLF: &str = r#"
        name = "wolf"
        base_damage = 40.0

        [[hit_sockets]]
        name = "jaw"
        count = 2

        [attacks.bite]
        combo = [{ damage_type = "Pierce", damage_multiplier = 0.5, sockets = [{ socket_name = "jaw", trace_radius = 12.0 }] }]

        [attacks.howl]
        combo = []
    "#;

    fn sword() -> WeaponProfile {
        let data = WeaponData::from_toml_str(SWORD).unwrap();
        WeaponProfile::new(
            data,
            OwnerAttributes {
                strength: 20.0,
                dexterity: 10.0,
            },
        )
    }

    #[test]
    fn weapon_damage_scales_with_attributes() {
        let w = sword();
        // 100 + 20 * 50% + 10 * 20%
        assert!((w.calculated_damage() - 112.0).abs() < 1.0e-4);
    }

    #[test]
    fn attribute_change_recalculates_damage() {
        let mut w = sword();
        w.set_owner_attributes(OwnerAttributes::default());
        assert_eq!(w.calculated_damage(), 100.0);
    }

    #[test]
    fn weapon_resolves_by_exact_tag_set() {
        let w = sword();
        let r = w.resolve_attack(&AttackKey::tags(["Attack.Light"]), 0).unwrap();
        assert_eq!(r.context.final_damage, w.calculated_damage());
        assert_eq!(r.context.poise_damage, 15.0);
        assert_eq!(r.context.damage_motion_type, DamageMotionType::Slash);
        assert_eq!(r.stats.sockets[0].trace_radius, 8.0);

        // Order of tags does not matter, a subset does not match.
        let heavy = AttackKey::tags(["Attack.Charged", "Attack.Heavy"]);
        assert!(w.resolve_attack(&heavy, 0).unwrap().stats.multi_hit);
        let partial = AttackKey::tags(["Attack.Heavy"]);
        assert!(matches!(
            w.resolve_attack(&partial, 0),
            Err(HitDetectionError::AttackNotFound(_))
        ));
    }

    #[test]
    fn combo_index_is_clamped() {
        let w = sword();
        let key = AttackKey::tags(["Attack.Light"]);
        let last = w.resolve_attack(&key, 9).unwrap();
        assert_eq!(last.context.damage_motion_type, DamageMotionType::Pierce);
        assert_eq!(last.context.final_damage, w.calculated_damage() * 1.5);
        assert_eq!(last.stats.sockets[0].trace_radius, DEFAULT_TRACE_RADIUS);

        let first = w.resolve_attack(&key, -3).unwrap();
        assert_eq!(first.context.damage_motion_type, DamageMotionType::Slash);
    }

    #[test]
    fn weapon_rejects_named_keys() {
        let w = sword();
        assert!(matches!(
            w.resolve_attack(&AttackKey::name("bite"), 0),
            Err(HitDetectionError::UnsupportedAttackKey(_))
        ));
    }

    #[test]
    fn creature_resolves_by_name_with_base_damage() {
        let wolf = CreatureData::from_toml_str(WOLF).unwrap();
        let r = wolf.resolve_attack(&AttackKey::name("bite"), 0).unwrap();
        assert_eq!(r.context.final_damage, 20.0);
        assert_eq!(r.context.poise_damage, 10.0);
        assert_eq!(wolf.hit_sockets()[0].name, "jaw");
    }

    #[test]
    fn creature_missing_or_empty_attack_fails() {
        let wolf = CreatureData::from_toml_str(WOLF).unwrap();
        assert!(matches!(
            wolf.resolve_attack(&AttackKey::name("claw"), 0),
            Err(HitDetectionError::AttackNotFound(_))
        ));
        assert!(matches!(
            wolf.resolve_attack(&AttackKey::name("howl"), 0),
            Err(HitDetectionError::EmptyCombo(_))
        ));
        assert!(matches!(
            wolf.resolve_attack(&AttackKey::tags(["Attack.Light"]), 0),
            Err(HitDetectionError::UnsupportedAttackKey(_))
        ));
    }

    #[test]
    fn tag_set_display_is_sorted() {
        let tags = TagSet::new(["b", "a"]);
        assert_eq!(tags.to_string(), "{a, b}");
        assert!(tags.contains("a"));
    }
}
