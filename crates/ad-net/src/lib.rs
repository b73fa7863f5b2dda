//! ad-net: Network surfaces for AirDrums
//!
//! - UDP discovery beacon (`AIRDRUM_SERVER` broadcast, sensors find us by it)
//! - UDP hit listener (non-blocking drain, KICK > LEFT > RIGHT, debounce)
//! - WebSocket frame ingress (phone camera, one JPEG per binary message)

mod config;
mod debounce;
mod discovery;
mod error;
mod ingress;
mod listener;
mod protocol;

pub use config::*;
pub use debounce::*;
pub use discovery::*;
pub use error::*;
pub use ingress::*;
pub use listener::*;
pub use protocol::*;
