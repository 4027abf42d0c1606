use bitflags::bitflags;

bitflags! {
    /// Which replicated fields of an [`Item`](crate::item::Item) a patch carries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ItemFields: u8 {
        const QUANTITY = 1 << 0;
        const EQUIPPED = 1 << 1;
    }
}

/// Per-entity replicated value tracked by a [`ReplicationChannel`](super::ReplicationChannel).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldTag {
    View,
    Killer,
    Corpse,
    Weapon,
    Magazine,
    Burst,
    PendingReload,
    Health,
    LootSource,
    PickupItem,
}

/// Who receives a replicated field, relative to the entity's owning observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    OwnerOnly,
    SkipOwner,
}

impl FieldTag {
    pub const fn audience(self) -> Audience {
        match self {
            Self::Magazine | Self::Health | Self::LootSource => Audience::OwnerOnly,
            Self::View | Self::Burst | Self::PendingReload => Audience::SkipOwner,
            Self::Killer | Self::Corpse | Self::Weapon | Self::PickupItem => Audience::Everyone,
        }
    }

    /// Whether an observer controlling `player` receives this field of `entity`.
    pub fn reaches(self, entity: crate::types::EntityId, player: crate::types::EntityId) -> bool {
        match self.audience() {
            Audience::Everyone => true,
            Audience::OwnerOnly => entity == player,
            Audience::SkipOwner => entity != player,
        }
    }
}
