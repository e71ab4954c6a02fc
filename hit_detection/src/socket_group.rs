/*!
Socket groups: named point chains on a mesh used as sweep endpoints.

The registry is built once from static socket metadata (`prebuilt`). When an attack is
armed, the groups it references are cloned out of the registry and parameterized with
the attack's radius and motion type. Those clones are the only mutable per-tick state of
the trace strategy.
*/

use tracing::{debug, warn};

use crate::adaptive::AdaptiveTraceEntry;
use crate::constants::DEFAULT_TRACE_RADIUS;
use crate::data::{AttackStats, DamageMotionType, HitSocketInfo};
use crate::types::Vec3;
use crate::world::SocketResolver;

/// One named chain of trace points and its per-tick sweep state.
#[derive(Clone, Debug, PartialEq)]
pub struct SocketGroupConfig {
    pub group_name: String,
    pub socket_count: usize,
    /// `"{group_name}_{index}"` for `index` in `0..socket_count`.
    pub point_names: Vec<String>,
    pub trace_radius: f32,
    pub damage_motion_type: DamageMotionType,
    pub previous_positions: Vec<Vec3>,
    pub current_positions: Vec<Vec3>,
    /// Previous-tick location of the first point, for swing speed.
    pub tip_previous_location: Vec3,
    pub sweep_accumulator: f32,
    pub current_cadence_seconds: f32,
    pub current_interpolation_steps: u32,
}

impl SocketGroupConfig {
    /// Template for one chain. Non-positive counts produce an empty chain.
    pub fn new(group_name: &str, socket_count: i32) -> Self {
        let socket_count = socket_count.max(0) as usize;
        let point_names = (0..socket_count)
            .map(|i| format!("{group_name}_{i}"))
            .collect();
        Self {
            group_name: group_name.to_owned(),
            socket_count,
            point_names,
            trace_radius: DEFAULT_TRACE_RADIUS,
            damage_motion_type: DamageMotionType::None,
            previous_positions: vec![Vec3::zeros(); socket_count],
            current_positions: vec![Vec3::zeros(); socket_count],
            tip_previous_location: Vec3::zeros(),
            sweep_accumulator: 0.0,
            current_cadence_seconds: 1.0,
            current_interpolation_steps: 1,
        }
    }

    /// Name of the swing-speed reference point, if the chain has any points.
    #[inline]
    pub fn tip_point(&self) -> Option<&str> {
        self.point_names.first().map(String::as_str)
    }

    /// Resolve every point of the chain into `current_positions`.
    ///
    /// On failure, returns the name of the first unresolvable point and leaves the
    /// positions partially updated; callers abort the trace in that case.
    pub fn refresh_current_positions(&mut self, sockets: &dyn SocketResolver) -> Result<(), String> {
        self.current_positions.resize(self.point_names.len(), Vec3::zeros());
        for (name, slot) in self.point_names.iter().zip(self.current_positions.iter_mut()) {
            *slot = sockets
                .socket_location(name)
                .ok_or_else(|| name.clone())?;
        }
        Ok(())
    }

    /// Baseline for a new hit window: previous = current, accumulator reset.
    pub fn reset_baseline(&mut self) {
        self.previous_positions.clone_from(&self.current_positions);
        if let Some(tip) = self.current_positions.first() {
            self.tip_previous_location = *tip;
        }
        self.sweep_accumulator = 0.0;
    }

    #[inline]
    pub fn apply_adaptive(&mut self, entry: &AdaptiveTraceEntry) {
        self.current_cadence_seconds = entry.cadence_seconds;
        self.current_interpolation_steps = entry.interpolation_steps;
    }

    /// At least two points are needed to form a segment.
    #[inline]
    pub fn is_sweepable(&self) -> bool {
        self.current_positions.len() >= 2
    }
}

/// Prebuilt socket-group templates of one weapon or creature.
#[derive(Clone, Debug, Default)]
pub struct SocketGroupRegistry {
    prebuilt: Vec<SocketGroupConfig>,
}

impl SocketGroupRegistry {
    /// Build templates from socket metadata. Later entries with a duplicate name replace
    /// earlier ones.
    pub fn build_from_metadata(entries: &[HitSocketInfo]) -> Self {
        let mut registry = Self::default();
        for info in entries {
            if info.count < 2 {
                warn!(
                    group = %info.name,
                    count = info.count,
                    "socket group has fewer than 2 points and cannot be swept"
                );
            }
            let template = SocketGroupConfig::new(&info.name, info.count);
            match registry
                .prebuilt
                .iter_mut()
                .find(|g| g.group_name == info.name)
            {
                Some(existing) => *existing = template,
                None => registry.prebuilt.push(template),
            }
        }
        debug!(groups = registry.prebuilt.len(), "socket groups built");
        registry
    }

    pub fn get(&self, name: &str) -> Option<&SocketGroupConfig> {
        self.prebuilt.iter().find(|g| g.group_name == name)
    }

    pub fn len(&self) -> usize {
        self.prebuilt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prebuilt.is_empty()
    }

    pub fn groups(&self) -> &[SocketGroupConfig] {
        &self.prebuilt
    }

    /// Active groups for an attack, in the attack's socket order.
    ///
    /// Unknown group names are dropped. A group referenced twice keeps its first slot and
    /// the last override.
    pub fn resolve_for_attack(&self, stats: &AttackStats) -> Vec<SocketGroupConfig> {
        let mut using: Vec<SocketGroupConfig> = Vec::with_capacity(stats.sockets.len());
        for usage in &stats.sockets {
            let Some(template) = self.get(&usage.socket_name) else {
                warn!(group = %usage.socket_name, "attack references unknown socket group");
                continue;
            };
            let mut group = template.clone();
            group.trace_radius = usage.trace_radius;
            group.damage_motion_type = stats.damage_type;

            match using.iter_mut().find(|g| g.group_name == group.group_name) {
                Some(existing) => *existing = group,
                None => using.push(group),
            }
        }
        using
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AttackSocketConfig;
    use std::collections::HashMap;

    fn infos() -> Vec<HitSocketInfo> {
        vec![
            HitSocketInfo {
                name: "blade".into(),
                count: 3,
            },
            HitSocketInfo {
                name: "pommel".into(),
                count: 2,
            },
            HitSocketInfo {
                name: "broken".into(),
                count: -1,
            },
        ]
    }

    fn usage(name: &str, radius: f32) -> AttackSocketConfig {
        AttackSocketConfig {
            socket_name: name.into(),
            trace_radius: radius,
        }
    }

    #[test]
    fn point_names_are_derived_from_group_name() {
        let reg = SocketGroupRegistry::build_from_metadata(&infos());
        let blade = reg.get("blade").unwrap();
        assert_eq!(blade.point_names, vec!["blade_0", "blade_1", "blade_2"]);
        assert_eq!(blade.previous_positions.len(), 3);
        assert_eq!(blade.current_positions.len(), 3);
        assert_eq!(blade.damage_motion_type, DamageMotionType::None);
        assert_eq!(blade.trace_radius, DEFAULT_TRACE_RADIUS);
    }

    #[test]
    fn negative_count_builds_an_empty_chain() {
        let reg = SocketGroupRegistry::build_from_metadata(&infos());
        let broken = reg.get("broken").unwrap();
        assert_eq!(broken.socket_count, 0);
        assert!(broken.point_names.is_empty());
        assert!(!broken.is_sweepable());
        assert_eq!(broken.tip_point(), None);
    }

    #[test]
    fn resolve_overrides_radius_and_motion_and_drops_unknown() {
        let reg = SocketGroupRegistry::build_from_metadata(&infos());
        let stats = AttackStats {
            damage_type: DamageMotionType::Slash,
            sockets: vec![usage("pommel", 4.0), usage("missing", 1.0), usage("blade", 12.0)],
            ..Default::default()
        };
        let using = reg.resolve_for_attack(&stats);
        assert_eq!(using.len(), 2);
        assert_eq!(using[0].group_name, "pommel");
        assert_eq!(using[0].trace_radius, 4.0);
        assert_eq!(using[1].group_name, "blade");
        assert_eq!(using[1].trace_radius, 12.0);
        assert!(using.iter().all(|g| g.damage_motion_type == DamageMotionType::Slash));
        // Templates are untouched.
        assert_eq!(reg.get("blade").unwrap().trace_radius, DEFAULT_TRACE_RADIUS);
    }

    #[test]
    fn duplicate_reference_keeps_last_override() {
        let reg = SocketGroupRegistry::build_from_metadata(&infos());
        let stats = AttackStats {
            sockets: vec![usage("blade", 5.0), usage("blade", 7.0)],
            ..Default::default()
        };
        let using = reg.resolve_for_attack(&stats);
        assert_eq!(using.len(), 1);
        assert_eq!(using[0].trace_radius, 7.0);
    }

    struct Fixed(HashMap<String, Vec3>);

    impl SocketResolver for Fixed {
        fn socket_location(&self, name: &str) -> Option<Vec3> {
            self.0.get(name).copied()
        }
    }

    #[test]
    fn refresh_reports_first_missing_point() {
        let mut group = SocketGroupConfig::new("blade", 2);
        let mut sockets = HashMap::new();
        sockets.insert("blade_0".to_owned(), Vec3::new(1.0, 0.0, 0.0));
        let resolver = Fixed(sockets);
        assert_eq!(
            group.refresh_current_positions(&resolver),
            Err("blade_1".to_owned())
        );

        let mut sockets = resolver.0;
        sockets.insert("blade_1".to_owned(), Vec3::new(2.0, 0.0, 0.0));
        let resolver = Fixed(sockets);
        assert!(group.refresh_current_positions(&resolver).is_ok());
        group.reset_baseline();
        assert_eq!(group.previous_positions, group.current_positions);
        assert_eq!(group.tip_previous_location, Vec3::new(1.0, 0.0, 0.0));
    }
}
