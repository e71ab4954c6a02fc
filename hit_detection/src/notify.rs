/*!
Glue between animation-driven attack abilities and a hit detector.

- [`HitWindowNotify`] is the animation window: its begin advances the ability's combo,
  then opens the detector's hit window; its end closes it.
- [`HitDetectionSetter`] is what an ability holds to talk to a detector. Every prepare
  binds the ability's hit callback afresh; the detector drops it again when it disarms
  (window end included), so a callback never outlives the attack it was bound for.
*/

use tracing::debug;

use crate::bridge::{HitEvent, SubscriptionToken};
use crate::data::AttackKey;
use crate::error::Result;
use crate::strategy::HitDetectionStrategy;
use crate::world::SocketResolver;

/// Receives the "add combo" signal sent just before a hit window opens.
pub trait ComboListener {
    fn add_combo(&mut self);
}

/// Combo index an ability feeds to `prepare`, wrapping after the last step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComboTracker {
    index: i32,
    len: i32,
}

impl ComboTracker {
    pub fn new(len: usize) -> Self {
        Self {
            index: 0,
            len: len.max(1) as i32,
        }
    }

    #[inline]
    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

impl ComboListener for ComboTracker {
    fn add_combo(&mut self) {
        self.index = (self.index + 1) % self.len.max(1);
    }
}

/// One hit window of an attack animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitWindowNotify {
    /// Window length in seconds, forwarded as the advisory duration.
    pub total_duration: f32,
}

impl HitWindowNotify {
    pub fn new(total_duration: f32) -> Self {
        Self { total_duration }
    }

    pub fn begin(
        &self,
        combo: &mut dyn ComboListener,
        detector: &mut dyn HitDetectionStrategy,
        sockets: &dyn SocketResolver,
    ) {
        combo.add_combo();
        debug!(duration = self.total_duration, "hit window notify begin");
        detector.on_hit_window_start(self.total_duration, sockets);
    }

    pub fn end(&self, detector: &mut dyn HitDetectionStrategy) {
        debug!("hit window notify end");
        detector.on_hit_window_end();
    }
}

/// Holds at most one hit subscription on a detector.
#[derive(Debug, Default)]
pub struct HitDetectionSetter {
    token: Option<SubscriptionToken>,
}

impl HitDetectionSetter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.token.is_some()
    }

    /// Subscribes `on_hit`, replacing any subscription this setter already held.
    pub fn bind(
        &mut self,
        detector: &mut dyn HitDetectionStrategy,
        on_hit: impl FnMut(&HitEvent) + 'static,
    ) -> SubscriptionToken {
        self.unbind(detector);
        let token = detector.hit_observers().subscribe(on_hit);
        self.token = Some(token);
        debug!("hit observer bound");
        token
    }

    /// Returns false when nothing was bound, or when the detector already dropped the
    /// subscription on disarm.
    pub fn unbind(&mut self, detector: &mut dyn HitDetectionStrategy) -> bool {
        let Some(token) = self.token.take() else {
            return false;
        };
        let removed = detector.hit_observers().unsubscribe(token);
        debug!(removed, "hit observer unbound");
        removed
    }

    /// Prepares `detector` for the attack and binds `on_hit` to it.
    ///
    /// On failure nothing stays bound.
    pub fn prepare(
        &mut self,
        detector: &mut dyn HitDetectionStrategy,
        key: &AttackKey,
        combo_index: i32,
        on_hit: impl FnMut(&HitEvent) + 'static,
    ) -> Result<()> {
        debug!(attack = %key, combo = combo_index, "prepare hit detection");
        if let Err(err) = detector.prepare(key, combo_index) {
            self.unbind(detector);
            return Err(err);
        }
        self.bind(detector, on_hit);
        Ok(())
    }
}
