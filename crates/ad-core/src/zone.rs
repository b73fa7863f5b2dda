//! Drum zones and the geometric zone map
//!
//! The play surface is the unit square of the (mirrored) camera frame,
//! `x` growing to the right and `y` growing downwards:
//!
//! ```text
//!  0.0 ─────────────── right_divider ──────── 1.0
//!   │        CRASH            │     RIDE       │   y < cymbal_height
//!   ├───────────┬─────────────┼────────────────┤
//!   │  HI-HAT   │    SNARE    │   FLOOR TOM    │
//!   └───────────┴─────────────┴────────────────┘
//!          left_divider
//! ```
//!
//! In the four-zone layout the whole top row is CRASH.
//! A coordinate equal to a threshold belongs to the region on its greater side.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// A region of the virtual play surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Zone {
    Snare = 0,
    HiHat = 1,
    Crash = 2,
    Ride = 3,
    FloorTom = 4,
}

impl Zone {
    pub const ALL: [Zone; 5] = [Zone::Snare, Zone::HiHat, Zone::Crash, Zone::Ride, Zone::FloorTom];

    pub fn label(self) -> &'static str {
        DrumVoice::from(self).label()
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Zone::Snare),
            1 => Some(Zone::HiHat),
            2 => Some(Zone::Crash),
            3 => Some(Zone::Ride),
            4 => Some(Zone::FloorTom),
            _ => None,
        }
    }
}

impl Default for Zone {
    fn default() -> Self {
        Zone::Snare
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the kit can sound: the five zones plus the kick pedal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DrumVoice {
    #[serde(rename = "SNARE")]
    Snare,
    #[serde(rename = "HI-HAT", alias = "HIHAT")]
    HiHat,
    #[serde(rename = "CRASH")]
    Crash,
    #[serde(rename = "RIDE")]
    Ride,
    #[serde(rename = "FLOOR TOM", alias = "FLOOR_TOM", alias = "TOM")]
    FloorTom,
    #[serde(rename = "KICK")]
    Kick,
}

impl DrumVoice {
    pub const ALL: [DrumVoice; 6] = [
        DrumVoice::Snare,
        DrumVoice::HiHat,
        DrumVoice::Crash,
        DrumVoice::Ride,
        DrumVoice::FloorTom,
        DrumVoice::Kick,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DrumVoice::Snare => "SNARE",
            DrumVoice::HiHat => "HI-HAT",
            DrumVoice::Crash => "CRASH",
            DrumVoice::Ride => "RIDE",
            DrumVoice::FloorTom => "FLOOR TOM",
            DrumVoice::Kick => "KICK",
        }
    }

    /// Default sample file name inside the kit directory
    pub fn default_file_name(self) -> &'static str {
        match self {
            DrumVoice::Snare => "snare.wav",
            DrumVoice::HiHat => "hihat.wav",
            DrumVoice::Crash => "crash.wav",
            DrumVoice::Ride => "ride.wav",
            DrumVoice::FloorTom => "tom.wav",
            DrumVoice::Kick => "kick.wav",
        }
    }
}

impl From<Zone> for DrumVoice {
    fn from(zone: Zone) -> Self {
        match zone {
            Zone::Snare => DrumVoice::Snare,
            Zone::HiHat => DrumVoice::HiHat,
            Zone::Crash => DrumVoice::Crash,
            Zone::Ride => DrumVoice::Ride,
            Zone::FloorTom => DrumVoice::FloorTom,
        }
    }
}

impl fmt::Display for DrumVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DrumVoice {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "SNARE" => Ok(DrumVoice::Snare),
            "HIHAT" => Ok(DrumVoice::HiHat),
            "CRASH" => Ok(DrumVoice::Crash),
            "RIDE" => Ok(DrumVoice::Ride),
            "FLOORTOM" | "TOM" => Ok(DrumVoice::FloorTom),
            "KICK" => Ok(DrumVoice::Kick),
            _ => Err(CoreError::UnknownLabel(s.to_string())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ZONE MAP
// ═══════════════════════════════════════════════════════════════════════════════

/// Zone vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneLayout {
    /// SNARE, HI-HAT, CRASH, FLOOR TOM
    FourZone,
    /// Adds RIDE to the right of the top row
    FiveZone,
}

impl Default for ZoneLayout {
    fn default() -> Self {
        Self::FiveZone
    }
}

impl ZoneLayout {
    pub fn zones(self) -> &'static [Zone] {
        match self {
            ZoneLayout::FourZone => &[Zone::Snare, Zone::HiHat, Zone::Crash, Zone::FloorTom],
            ZoneLayout::FiveZone => &Zone::ALL,
        }
    }
}

impl FromStr for ZoneLayout {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "4" | "four" | "four_zone" | "four-zone" => Ok(ZoneLayout::FourZone),
            "5" | "five" | "five_zone" | "five-zone" => Ok(ZoneLayout::FiveZone),
            other => Err(CoreError::InvalidConfig(format!("unknown zone layout '{}'", other))),
        }
    }
}

/// Zone thresholds, all in normalized frame coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneMapConfig {
    pub layout: ZoneLayout,
    /// Rows above this line are cymbals
    pub cymbal_height: f32,
    /// HI-HAT | SNARE split on the bottom row
    pub left_divider: f32,
    /// SNARE | FLOOR TOM split on the bottom row, CRASH | RIDE on the top row
    pub right_divider: f32,
}

impl Default for ZoneMapConfig {
    fn default() -> Self {
        Self {
            layout: ZoneLayout::FiveZone,
            cymbal_height: 0.4,
            left_divider: 0.35,
            right_divider: 0.65,
        }
    }
}

impl ZoneMapConfig {
    pub fn validate(&self) -> CoreResult<()> {
        for (name, value) in [
            ("cymbal_height", self.cymbal_height),
            ("left_divider", self.left_divider),
            ("right_divider", self.right_divider),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoreError::InvalidConfig(format!(
                    "zones.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.left_divider > self.right_divider {
            return Err(CoreError::InvalidConfig(format!(
                "zones.left_divider ({}) must not exceed zones.right_divider ({})",
                self.left_divider, self.right_divider
            )));
        }

        Ok(())
    }
}

/// Total partition of the unit square into zones
#[derive(Debug, Clone)]
pub struct ZoneMap {
    config: ZoneMapConfig,
}

impl ZoneMap {
    pub fn new(config: ZoneMapConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn layout(&self) -> ZoneLayout {
        self.config.layout
    }

    /// Classify a normalized point. Out-of-range inputs are clamped first;
    /// a NaN in either coordinate lands on FLOOR TOM.
    pub fn classify(&self, x: f32, y: f32) -> Zone {
        if x.is_nan() || y.is_nan() {
            return Zone::FloorTom;
        }
        let x = x.clamp(0.0, 1.0);
        let y = y.clamp(0.0, 1.0);
        let c = &self.config;

        if y < c.cymbal_height {
            match c.layout {
                ZoneLayout::FiveZone if x >= c.right_divider => Zone::Ride,
                _ => Zone::Crash,
            }
        } else if x < c.left_divider {
            Zone::HiHat
        } else if x < c.right_divider {
            Zone::Snare
        } else {
            Zone::FloorTom
        }
    }
}

impl Default for ZoneMap {
    fn default() -> Self {
        Self {
            config: ZoneMapConfig::default(),
        }
    }
}
