use crate::error::Rejection;
use crate::item::ItemKind;
use crate::timer::TimerPurpose;
use crate::types::Millis;

/// Static tuning of a weapon class, carried by its item definition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WeaponSpec {
    pub magazine_capacity: u32,
    /// Zero means semi-automatic: one shot per trigger press.
    pub time_between_shots: Millis,
    pub reload_duration: Millis,
    pub equip_duration: Millis,
    pub ammo_kind: ItemKind,
    pub damage: f32,
    pub range: f32,
}

impl Default for WeaponSpec {
    fn default() -> Self {
        Self {
            magazine_capacity: 30,
            time_between_shots: Millis(100),
            reload_duration: Millis(500),
            equip_duration: Millis(500),
            ammo_kind: ItemKind(0),
            damage: 20.0,
            range: 10_000.0,
        }
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum WeaponState {
    #[default]
    Idle,
    Firing,
    Reloading,
    Equipping,
}

/// Presentation cues a weapon asks the host to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeaponCue {
    /// Muzzle flash and sound of one shot.
    Fire,
    /// End of the firing loop.
    FireStop,
    Reload,
    ReloadStop,
    Equip,
    OutOfAmmo,
}

impl WeaponCue {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fire => "weapon.fire",
            Self::FireStop => "weapon.fire_stop",
            Self::Reload => "weapon.reload",
            Self::ReloadStop => "weapon.reload_stop",
            Self::Equip => "weapon.equip",
            Self::OutOfAmmo => "weapon.out_of_ammo",
        }
    }
}

/// Requests an owning client sends to the authority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeaponIntent {
    StartFire,
    StopFire,
    /// One locally simulated shot, for the authority to confirm.
    HandleFiring,
    StartReload,
}

/// Side effects produced by a weapon transition, applied by the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WeaponEffect {
    Cue(WeaponCue),
    /// One shot left the barrel. Only authoritative shots resolve damage.
    Shot { authoritative: bool },
    Schedule { purpose: TimerPurpose, delay: Millis },
    Cancel(TimerPurpose),
    Notify(Rejection),
    Forward(WeaponIntent),
    /// Move rounds from the owner's reserve into the magazine.
    TransferAmmo(u32),
    /// Put rounds from the magazine back into the owner's reserve.
    ReturnAmmo(u32),
}

/// Everything a weapon needs to know about its surroundings for one transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeaponContext {
    pub now: Millis,
    /// Running on the authoritative replica.
    pub authority: bool,
    /// The owning character is controlled on this replica.
    pub local: bool,
    pub owner_alive: bool,
    /// Reserve ammo of the weapon's ammo kind in the owner's inventory.
    pub reserve: u32,
    pub transfer_lead: Millis,
    pub min_transfer: Millis,
    pub shot_tolerance: Millis,
}
