//! ad-engine: AirDrums runtime
//!
//! Wires the pieces into four concurrent units:
//!
//! ```text
//! ┌──────────────┐  FrameExchange  ┌──────────────┐  ZoneBoard  ┌──────────────┐
//! │ capture or   │ ──────────────▶ │ Orchestrator │ ──────────▶ │  HitRouter   │
//! │ WS ingress   │   (latest wins) │ pose + track │  (atomics)  │ (UDP thread) │
//! └──────────────┘                 └──────────────┘             └──────┬───────┘
//!                                                                      │ trigger
//!                                                               ┌──────▼───────┐
//!                                                               │  VoiceMixer  │
//!                                                               └──────────────┘
//! ```
//!
//! All units share one [`EngineContext`] and stop on its flag.

mod capture;
#[cfg(feature = "camera")]
mod camera;
mod context;
mod error;
mod orchestrator;
mod router;

pub use capture::*;
#[cfg(feature = "camera")]
pub use camera::*;
pub use context::*;
pub use error::*;
pub use orchestrator::*;
pub use router::*;
