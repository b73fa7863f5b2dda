//! Limbs and hit sources

use serde::{Deserialize, Serialize};

/// One of the two tracked stick-holding arms, as seen on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limb {
    Left,
    Right,
}

impl Limb {
    pub const ALL: [Limb; 2] = [Limb::Left, Limb::Right];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Limb::Left => 0,
            Limb::Right => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Limb::Left => "Left",
            Limb::Right => "Right",
        }
    }
}

/// Identity of the peripheral that reported a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitSource {
    Left,
    Right,
    Kick,
}

impl HitSource {
    /// Limb whose zone resolves this hit. `None` for the kick pedal.
    pub fn limb(self) -> Option<Limb> {
        match self {
            HitSource::Left => Some(Limb::Left),
            HitSource::Right => Some(Limb::Right),
            HitSource::Kick => None,
        }
    }

    /// Wire tag matched (case-insensitively) inside hit datagrams
    pub fn tag(self) -> &'static str {
        match self {
            HitSource::Left => "LEFT",
            HitSource::Right => "RIGHT",
            HitSource::Kick => "KICK",
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            HitSource::Left => 0,
            HitSource::Right => 1,
            HitSource::Kick => 2,
        }
    }
}
