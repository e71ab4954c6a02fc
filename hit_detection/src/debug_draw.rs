//! Debug geometry sinks.
//!
//! Drawing is visual only: detectors call into a [`DebugDraw`] sink when debug drawing is
//! enabled and never read anything back from it.

use serde::{Deserialize, Serialize};

use crate::types::Vec3;

/// RGBA color, 8 bits per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const RED: Self = Self([255, 0, 0, 255]);
    pub const GREEN: Self = Self([0, 255, 0, 255]);
    pub const YELLOW: Self = Self([255, 255, 0, 255]);
    pub const CYAN: Self = Self([0, 255, 255, 255]);

    /// Same color with a different alpha.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, a])
    }
}

pub trait DebugDraw {
    /// Capsule spanning segment `a..b`.
    fn capsule(&mut self, a: Vec3, b: Vec3, radius: f32, color: Rgba, duration: f32);
    fn line(&mut self, from: Vec3, to: Vec3, color: Rgba, duration: f32);
    fn sphere(&mut self, center: Vec3, radius: f32, color: Rgba, duration: f32);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDebugDraw;

impl DebugDraw for NullDebugDraw {
    fn capsule(&mut self, _: Vec3, _: Vec3, _: f32, _: Rgba, _: f32) {}
    fn line(&mut self, _: Vec3, _: Vec3, _: Rgba, _: f32) {}
    fn sphere(&mut self, _: Vec3, _: f32, _: Rgba, _: f32) {}
}

#[derive(Clone, Debug, PartialEq)]
pub enum DebugShape {
    Capsule {
        a: Vec3,
        b: Vec3,
        radius: f32,
        color: Rgba,
        duration: f32,
    },
    Line {
        from: Vec3,
        to: Vec3,
        color: Rgba,
        duration: f32,
    },
    Sphere {
        center: Vec3,
        radius: f32,
        color: Rgba,
        duration: f32,
    },
}

/// Keeps every shape it is given, in order. Used by tests and the headless harness.
#[derive(Clone, Debug, Default)]
pub struct DebugShapeRecorder {
    pub shapes: Vec<DebugShape>,
}

impl DebugShapeRecorder {
    pub fn capsule_count(&self) -> usize {
        self.shapes
            .iter()
            .filter(|s| matches!(s, DebugShape::Capsule { .. }))
            .count()
    }

    pub fn line_count(&self) -> usize {
        self.shapes
            .iter()
            .filter(|s| matches!(s, DebugShape::Line { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }
}

impl DebugDraw for DebugShapeRecorder {
    fn capsule(&mut self, a: Vec3, b: Vec3, radius: f32, color: Rgba, duration: f32) {
        self.shapes.push(DebugShape::Capsule {
            a,
            b,
            radius,
            color,
            duration,
        });
    }

    fn line(&mut self, from: Vec3, to: Vec3, color: Rgba, duration: f32) {
        self.shapes.push(DebugShape::Line {
            from,
            to,
            color,
            duration,
        });
    }

    fn sphere(&mut self, center: Vec3, radius: f32, color: Rgba, duration: f32) {
        self.shapes.push(DebugShape::Sphere {
            center,
            radius,
            color,
            duration,
        });
    }
}
