//! ad-core: Shared types for AirDrums
//!
//! Everything the independent loops agree on lives here:
//!
//! ```text
//! ┌────────────────┐   publish    ┌───────────────┐   poll    ┌──────────────┐
//! │ frame producer │─────────────▶│ FrameExchange │──────────▶│ Orchestrator │
//! └────────────────┘              └───────────────┘           └──────┬───────┘
//!                                                                    │ zone
//!                                                                    ▼
//! ┌────────────────┐   read zone  ┌───────────────┐
//! │  HitListener   │◀─────────────│   ZoneBoard   │
//! └────────────────┘              └───────────────┘
//! ```

mod board;
mod error;
mod frame;
mod geometry;
mod limb;
mod zone;

pub use board::*;
pub use error::*;
pub use frame::*;
pub use geometry::*;
pub use limb::*;
pub use zone::*;
