/// Globally-unique identity of anything a sweep can touch (characters, creatures, weapons, props).
///
/// # Why this exists
/// Rapier colliders carry a single `u128` of user data. Hit detection needs to map every
/// collider hit back to the actor that owns it, and actors of different kinds are numbered
/// independently by their owners. Packing `(id, kind)` into one `u128` keeps the mapping a
/// plain copy with no side table.
///
/// # Bit layout
/// This `u128` is a packed value with the following layout (least-significant bit = bit 0):
///
/// - bits 0..=63   : per-kind `id` (u64)
/// - bits 64..=71  : `ActorKind` tag (u8)
/// - bits 72..=127 : reserved (must be zero for now)
///
/// # Invariants
/// - Two different `(id, kind)` pairs must never produce the same `ActorId`.
/// - Reserved bits must remain zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u128);

/// Per-kind numeric identifier packed into an [`ActorId`].
pub type ActorNumber = u64;

/// Discriminator for the kind of actor referenced by an [`ActorId`].
///
/// The numeric values are part of the packed layout stored in collider user data.
/// Do not reorder or reuse values.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Character = 1,
    Creature = 2,
    Weapon = 3,
    Prop = 4,
}

impl ActorId {
    /// Packs an [`ActorKind`] and a per-kind number into a globally-unique [`ActorId`].
    #[inline]
    pub const fn new(id: ActorNumber, kind: ActorKind) -> Self {
        Self((id as u128) | ((kind as u128) << ActorNumber::BITS))
    }

    /// Reinterprets raw collider user data as an actor id.
    ///
    /// Returns `None` if the value does not conform to the packing contract
    /// (see [`validate_actor_bits`]).
    #[inline]
    pub fn from_bits(bits: u128) -> Option<Self> {
        validate_actor_bits(bits).ok().map(|_| Self(bits))
    }

    /// Raw packed value, suitable for `Collider::user_data`.
    #[inline]
    pub const fn to_bits(self) -> u128 {
        self.0
    }

    /// Extracts the per-kind number.
    #[inline]
    pub const fn number(self) -> ActorNumber {
        const ID_MASK: u128 = u64::MAX as u128;
        (self.0 & ID_MASK) as ActorNumber
    }

    /// Extracts the [`ActorKind`]. Ids built through [`ActorId::new`] or
    /// [`ActorId::from_bits`] always carry a known tag.
    #[inline]
    pub fn kind(self) -> Option<ActorKind> {
        try_unpack_kind(self.0)
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "{kind:?}#{}", self.number()),
            None => write!(f, "Unknown#{}", self.number()),
        }
    }
}

fn try_unpack_kind(bits: u128) -> Option<ActorKind> {
    const KIND_MASK: u128 = u8::MAX as u128;
    let tag = ((bits >> ActorNumber::BITS) & KIND_MASK) as u8;

    match tag {
        1u8 => Some(ActorKind::Character),
        2u8 => Some(ActorKind::Creature),
        3u8 => Some(ActorKind::Weapon),
        4u8 => Some(ActorKind::Prop),
        _ => None,
    }
}

/// Validates that a raw `u128` conforms to the current packing contract.
///
/// Checks:
/// - kind tag is recognized
/// - reserved bits (72..=127) are zero
pub fn validate_actor_bits(bits: u128) -> Result<(), &'static str> {
    const RESERVED_MASK: u128 = !0u128 << 72;
    if (bits & RESERVED_MASK) != 0 {
        return Err("ActorId reserved bits are non-zero");
    }
    if try_unpack_kind(bits).is_none() {
        return Err("ActorId has unknown kind tag");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_places_id_in_low_64_bits_and_kind_in_next_8_bits() {
        let id: ActorNumber = 0x0123_4567_89AB_CDEF;
        let actor = ActorId::new(id, ActorKind::Weapon);

        let expected = (id as u128) | ((ActorKind::Weapon as u128) << 64);
        assert_eq!(actor.to_bits(), expected);
        assert_eq!(actor.number(), id);
        assert_eq!(actor.kind(), Some(ActorKind::Weapon));
        assert_eq!(actor.to_bits() >> 72, 0);
    }

    #[test]
    fn same_number_different_kind_is_a_different_actor() {
        let character = ActorId::new(7, ActorKind::Character);
        let creature = ActorId::new(7, ActorKind::Creature);
        assert_ne!(character, creature);
    }

    #[test]
    fn from_bits_rejects_unknown_kind() {
        let bits: u128 = 123 | (250u128 << 64);
        assert_eq!(ActorId::from_bits(bits), None);
        assert_eq!(validate_actor_bits(bits), Err("ActorId has unknown kind tag"));
    }

    #[test]
    fn from_bits_rejects_reserved_bits() {
        let bits = ActorId::new(42, ActorKind::Prop).to_bits() | (1u128 << 72);
        assert_eq!(ActorId::from_bits(bits), None);
        assert_eq!(
            validate_actor_bits(bits),
            Err("ActorId reserved bits are non-zero")
        );
    }

    #[test]
    fn from_bits_accepts_packed_value() {
        let actor = ActorId::new(u64::MAX, ActorKind::Creature);
        assert_eq!(ActorId::from_bits(actor.to_bits()), Some(actor));
        assert_eq!(actor.to_string(), format!("Creature#{}", u64::MAX));
    }
}
