//! Latest-wins frame exchange
//!
//! One producer (capture thread or network ingress) overwrites a single slot,
//! one consumer (the orchestrator) polls it. Nothing is ever queued: a frame
//! that is overwritten before the consumer looks at it is simply gone.
//!
//! Novelty is detected by comparing an explicit, monotonically increasing
//! version number, never by pointer identity.

use std::sync::Arc;

use image::RgbImage;
use parking_lot::Mutex;

/// A frame together with the version it was published under
#[derive(Debug, Clone)]
pub struct VersionedFrame {
    /// Starts at 1 for the first published frame
    pub version: u64,
    pub image: Arc<RgbImage>,
}

impl VersionedFrame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[derive(Default)]
struct FrameSlot {
    version: u64,
    image: Option<Arc<RgbImage>>,
}

/// Single-slot, overwrite-on-write frame buffer
#[derive(Default)]
pub struct FrameExchange {
    slot: Mutex<FrameSlot>,
}

impl FrameExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot contents unconditionally. Returns the new version.
    pub fn publish(&self, image: RgbImage) -> u64 {
        self.publish_shared(Arc::new(image))
    }

    /// Same as [`publish`](Self::publish) for an already shared image
    pub fn publish_shared(&self, image: Arc<RgbImage>) -> u64 {
        let (version, previous) = {
            let mut slot = self.slot.lock();
            slot.version += 1;
            (slot.version, slot.image.replace(image))
        };
        // Release the displaced frame outside the critical section
        drop(previous);
        version
    }

    /// Newest frame if it is newer than `last_seen`, without blocking on the producer
    pub fn poll(&self, last_seen: u64) -> Option<VersionedFrame> {
        let slot = self.slot.lock();
        if slot.version <= last_seen {
            return None;
        }
        slot.image.as_ref().map(|image| VersionedFrame {
            version: slot.version,
            image: Arc::clone(image),
        })
    }

    /// Newest frame regardless of whether it was seen before
    pub fn latest(&self) -> Option<VersionedFrame> {
        self.poll(0)
    }

    /// Version of the newest frame (0 = nothing published yet)
    pub fn version(&self) -> u64 {
        self.slot.lock().version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn image_tagged(tag: u8) -> RgbImage {
        RgbImage::from_pixel(4, 4, image::Rgb([tag, 0, 0]))
    }

    #[test]
    fn test_empty_exchange_yields_nothing() {
        let exchange = FrameExchange::new();
        assert!(exchange.poll(0).is_none());
        assert!(exchange.latest().is_none());
        assert_eq!(exchange.version(), 0);
    }

    #[test]
    fn test_poll_reports_novelty_once() {
        let exchange = FrameExchange::new();
        let v1 = exchange.publish(image_tagged(1));
        assert_eq!(v1, 1);

        let frame = exchange.poll(0).unwrap();
        assert_eq!(frame.version, 1);
        assert!(exchange.poll(frame.version).is_none());
    }

    #[test]
    fn test_overwrite_drops_stale_frame() {
        let exchange = FrameExchange::new();
        exchange.publish(image_tagged(1));
        let v2 = exchange.publish(image_tagged(2));

        let frame = exchange.poll(0).unwrap();
        assert_eq!(frame.version, v2);
        assert_eq!(frame.image.get_pixel(0, 0).0[0], 2);
    }

    #[test]
    fn test_consumer_never_goes_backwards() {
        let exchange = Arc::new(FrameExchange::new());
        let producer = {
            let exchange = Arc::clone(&exchange);
            thread::spawn(move || {
                for tag in 0..2000u32 {
                    exchange.publish(image_tagged((tag % 251) as u8));
                }
            })
        };

        let mut last_seen = 0;
        while !producer.is_finished() {
            if let Some(frame) = exchange.poll(last_seen) {
                assert!(frame.version > last_seen);
                last_seen = frame.version;
            }
        }
        producer.join().unwrap();

        // Once the final write happened, only the final version is observable
        let final_frame = exchange.latest().unwrap();
        assert_eq!(final_frame.version, 2000);
        assert!(final_frame.version >= last_seen);
    }
}
