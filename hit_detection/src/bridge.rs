/*!
Damage resolution bridge.

A validated hit is bundled with the attack context resolved at prepare time into an
immutable [`HitEvent`] and handed synchronously to every subscriber. The bridge never
touches health or poise itself; consumers (see `defense`) own that.

Subscriptions are explicit: `subscribe` returns a token and the subscriber stays
registered until `unsubscribe` is called with it or the observer list is cleared.
*/

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::data::DamageMotionType;
use crate::types::HitResult;

/// Final attack payload for one armed window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackContext {
    pub final_damage: f32,
    pub poise_damage: f32,
    pub damage_motion_type: DamageMotionType,
}

impl Default for AttackContext {
    fn default() -> Self {
        Self {
            final_damage: 0.0,
            poise_damage: 0.0,
            damage_motion_type: DamageMotionType::None,
        }
    }
}

/// Emitted once per validated hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitEvent {
    pub target: ActorId,
    pub hit: HitResult,
    pub attack: AttackContext,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

type Callback<E> = Box<dyn FnMut(&E)>;

/// Ordered observer list. Callbacks run in subscription order.
pub struct Observers<E> {
    next_token: u64,
    entries: Vec<(SubscriptionToken, Callback<E>)>,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            next_token: 0,
            entries: Vec::new(),
        }
    }
}

impl<E> std::fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<E> Observers<E> {
    pub fn subscribe(&mut self, callback: impl FnMut(&E) + 'static) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.entries.push((token, Box::new(callback)));
        token
    }

    /// Returns `false` when the token was not registered (already removed or foreign).
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(t, _)| *t != token);
        self.entries.len() != before
    }

    pub fn broadcast(&mut self, event: &E) {
        for (_, callback) in self.entries.iter_mut() {
            callback(event);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
