//! Identifiers, time values, and transforms shared by every gameplay module.

use core::fmt;
use core::ops::{Add, Sub};

use glam::Vec3;

/// Unique identifier for a world entity (character, container, pickup, spawned actor).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of an item instance.
///
/// Minted by the inventory that owns the instance: the high half carries the
/// owning entity and the low half a per-inventory serial, so two inventories can
/// never hand out the same id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u64);

impl ItemId {
    pub const fn new(owner: EntityId, serial: u32) -> Self {
        Self(((owner.0 as u64) << 32) | serial as u64)
    }

    /// Entity whose inventory minted this id.
    pub const fn minted_by(self) -> EntityId {
        EntityId((self.0 >> 32) as u32)
    }

    pub const fn serial(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item{}:{}", self.minted_by(), self.serial())
    }
}

/// World time, or a duration, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Self = Self(0);

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn as_secs_f32(self) -> f32 {
        self.0 as f32 / 1000.0
    }

    #[inline]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Millis {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Millis {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(rhs)
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Location plus facing direction of an entity in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    pub location: Vec3,
    pub forward: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        location: Vec3::ZERO,
        forward: Vec3::X,
    };

    pub fn new(location: Vec3, forward: Vec3) -> Self {
        let forward = forward.normalize_or_zero();
        Self {
            location,
            forward: if forward == Vec3::ZERO { Vec3::X } else { forward },
        }
    }

    /// Point `distance` units ahead of this transform.
    pub fn ahead(&self, distance: f32) -> Vec3 {
        self.location + self.forward * distance
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
