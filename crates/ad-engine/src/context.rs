//! Shared runtime state

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ad_core::{FrameExchange, ZoneBoard};

/// Everything the concurrent units share. Passed around as `Arc<EngineContext>`.
#[derive(Default)]
pub struct EngineContext {
    /// Shared with the WebSocket ingress, which only knows about frames
    pub frames: Arc<FrameExchange>,
    pub zones: ZoneBoard,
    stop: Arc<AtomicBool>,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// The stop flag itself, for loops that only know about a bare flag
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }
}
