use std::collections::HashMap;

use crate::types::{Transform, Vec3};
use crate::world::SocketResolver;

/// Named socket offsets attached to one moving transform (a weapon or a creature's limb).
///
/// Sockets can be removed at runtime, which makes their resolution fail the way a mesh
/// swap or a destroyed weapon would.
#[derive(Clone, Debug, Default)]
pub struct SocketRig {
    pub transform: Transform,
    sockets: HashMap<String, Vec3>,
}

impl SocketRig {
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            sockets: HashMap::new(),
        }
    }

    /// Adds `count` sockets named `"{group}_{i}"`, evenly spaced from `from` to `to` in
    /// local space.
    pub fn with_chain(mut self, group: &str, count: usize, from: Vec3, to: Vec3) -> Self {
        for i in 0..count {
            let alpha = if count > 1 {
                i as f32 / (count - 1) as f32
            } else {
                0.0
            };
            self.sockets
                .insert(format!("{group}_{i}"), from.lerp(&to, alpha));
        }
        self
    }

    pub fn remove_socket(&mut self, name: &str) -> Option<Vec3> {
        self.sockets.remove(name)
    }

    pub fn local_offset(&self, name: &str) -> Option<Vec3> {
        self.sockets.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }
}

impl SocketResolver for SocketRig {
    fn socket_location(&self, name: &str) -> Option<Vec3> {
        self.sockets
            .get(name)
            .map(|local| self.transform.transform_point(local))
    }

    fn owner_transform(&self) -> Option<Transform> {
        Some(self.transform)
    }
}
