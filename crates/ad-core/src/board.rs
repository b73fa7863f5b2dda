//! Published per-limb zones
//!
//! Single writer (the orchestrator), many readers (the hit listener).
//! Each zone is a single atomic byte, so readers never take a lock and
//! never observe a torn value. A reader may see a zone that changes a
//! moment later; both signals come from the same physical stroke.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::{Limb, Zone};

/// Lock-free board of the zone each limb currently points at
#[derive(Debug)]
pub struct ZoneBoard {
    zones: [AtomicU8; 2],
}

impl ZoneBoard {
    /// Both limbs start on SNARE
    pub fn new() -> Self {
        Self::with_initial(Zone::Snare)
    }

    pub fn with_initial(zone: Zone) -> Self {
        Self {
            zones: [AtomicU8::new(zone.as_u8()), AtomicU8::new(zone.as_u8())],
        }
    }

    #[inline]
    pub fn publish(&self, limb: Limb, zone: Zone) {
        self.zones[limb.index()].store(zone.as_u8(), Ordering::Release);
    }

    #[inline]
    pub fn zone(&self, limb: Limb) -> Zone {
        let raw = self.zones[limb.index()].load(Ordering::Acquire);
        // Only `publish` writes, and it only stores valid discriminants
        Zone::from_u8(raw).unwrap_or_default()
    }

    pub fn snapshot(&self) -> [Zone; 2] {
        [self.zone(Limb::Left), self.zone(Limb::Right)]
    }
}

impl Default for ZoneBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_snare() {
        let board = ZoneBoard::new();
        assert_eq!(board.snapshot(), [Zone::Snare, Zone::Snare]);
    }

    #[test]
    fn test_limbs_are_independent() {
        let board = ZoneBoard::new();
        board.publish(Limb::Left, Zone::Crash);
        assert_eq!(board.zone(Limb::Left), Zone::Crash);
        assert_eq!(board.zone(Limb::Right), Zone::Snare);

        board.publish(Limb::Right, Zone::FloorTom);
        assert_eq!(board.snapshot(), [Zone::Crash, Zone::FloorTom]);
    }
}
