//! Hit deduplication.
//!
//! [`HitValidator`] backs the trace strategy: one record per target, first hit always
//! accepted, repeats only in multi-hit mode and only after the cooldown.
//!
//! [`CcdHitLog`] backs the CCD strategy: an append-only list of `(actor, time)` records with
//! the same cooldown, and no notion of single-hit mode.

use std::collections::HashMap;

use crate::actor::ActorId;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitValidationRecord {
    pub target: ActorId,
    pub last_hit_time: f32,
    pub hit_count: u32,
}

#[derive(Clone, Debug)]
pub struct HitValidator {
    owner: ActorId,
    cooldown: f32,
    records: HashMap<ActorId, HitValidationRecord>,
}

impl HitValidator {
    pub fn new(owner: ActorId, cooldown: f32) -> Self {
        Self {
            owner,
            cooldown,
            records: HashMap::new(),
        }
    }

    /// Accept or reject a candidate hit at time `now` (seconds).
    pub fn validate(&mut self, target: Option<ActorId>, allow_multi_hit: bool, now: f32) -> bool {
        let Some(target) = target else {
            return false;
        };
        if target == self.owner {
            return false;
        }

        match self.records.get_mut(&target) {
            Some(record) => {
                if !allow_multi_hit || now - record.last_hit_time < self.cooldown {
                    return false;
                }
                record.last_hit_time = now;
                record.hit_count += 1;
                true
            }
            None => {
                self.records.insert(
                    target,
                    HitValidationRecord {
                        target,
                        last_hit_time: now,
                        hit_count: 1,
                    },
                );
                true
            }
        }
    }

    pub fn record(&self, target: ActorId) -> Option<&HitValidationRecord> {
        self.records.get(&target)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    #[inline]
    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CcdHitRecord {
    pub actor: ActorId,
    pub time: f32,
}

#[derive(Clone, Debug)]
pub struct CcdHitLog {
    cooldown: f32,
    records: Vec<CcdHitRecord>,
}

impl CcdHitLog {
    pub fn new(cooldown: f32) -> Self {
        Self {
            cooldown,
            records: Vec::new(),
        }
    }

    /// Accept `actor` unless its most recent record is younger than the cooldown.
    /// Accepted hits are appended.
    pub fn validate(&mut self, actor: ActorId, now: f32) -> bool {
        let recent = self
            .records
            .iter()
            .rev()
            .find(|r| r.actor == actor)
            .is_some_and(|r| now - r.time < self.cooldown);
        if recent {
            return false;
        }
        self.records.push(CcdHitRecord { actor, time: now });
        true
    }

    pub fn records(&self) -> &[CcdHitRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
