//! Classify loop
//!
//! Polls the frame exchange, runs the pose detector on every new frame and
//! publishes each limb's zone. Runs as fast as frames and the detector
//! allow; when nothing new is there it sleeps for a short fixed interval.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ad_core::{Limb, ZoneMap};
use ad_tracking::{LimbTracker, PoseDetector, TrackOutcome, TrackerConfig};
use serde::{Deserialize, Serialize};

use crate::{EngineContext, EngineError, EngineResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Treat the camera picture like a mirror
    pub mirror: bool,
    /// Sleep when no new frame is available
    pub idle_sleep_us: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            mirror: true,
            idle_sleep_us: 1000,
        }
    }
}

/// Result of one classify tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No frame newer than the last one processed
    Idle,
    /// Detector found nobody, or failed on this frame
    NoPose,
    /// Per-limb result, indexed like [`Limb::ALL`]
    Classified([TrackOutcome; 2]),
}

pub struct Orchestrator<D: PoseDetector> {
    context: Arc<EngineContext>,
    detector: D,
    zones: ZoneMap,
    trackers: [LimbTracker; 2],
    mirror: bool,
    idle_sleep: Duration,
    last_version: u64,
    frame_size: Option<(u32, u32)>,
}

impl<D: PoseDetector> Orchestrator<D> {
    pub fn new(
        context: Arc<EngineContext>,
        detector: D,
        zones: ZoneMap,
        tracker: &TrackerConfig,
        config: &OrchestratorConfig,
    ) -> EngineResult<Self> {
        tracker.validate()?;

        Ok(Self {
            context,
            detector,
            zones,
            trackers: Limb::ALL.map(|limb| LimbTracker::new(limb, tracker)),
            mirror: config.mirror,
            idle_sleep: Duration::from_micros(config.idle_sleep_us),
            last_version: 0,
            frame_size: None,
        })
    }

    pub fn tracker(&self, limb: Limb) -> &LimbTracker {
        &self.trackers[limb.index()]
    }

    /// Process the newest frame, if there is one
    pub fn tick(&mut self) -> TickOutcome {
        let Some(frame) = self.context.frames.poll(self.last_version) else {
            return TickOutcome::Idle;
        };
        self.last_version = frame.version;

        // Filter state lives in pixels of the previous frame size
        let (width, height) = (frame.width(), frame.height());
        if self.frame_size.is_some_and(|size| size != (width, height)) {
            log::info!(
                "[Orchestrator] Frame size changed to {}x{}, resetting motion history",
                width,
                height
            );
            for tracker in &mut self.trackers {
                tracker.reset();
            }
        }
        self.frame_size = Some((width, height));

        let pose = match self.detector.detect(&frame.image) {
            Ok(Some(pose)) => pose,
            Ok(None) => return TickOutcome::NoPose,
            Err(e) => {
                log::warn!(
                    "[Orchestrator] {} failed on frame {}: {}",
                    self.detector.name(),
                    frame.version,
                    e
                );
                return TickOutcome::NoPose;
            }
        };

        let outcomes = Limb::ALL.map(|limb| {
            let arm = pose.arm(limb, self.mirror);
            let outcome = self.trackers[limb.index()].update(arm.as_ref(), width, height, &self.zones);
            if let TrackOutcome::Updated { zone, .. } = outcome {
                self.context.zones.publish(limb, zone);
            }
            outcome
        });

        TickOutcome::Classified(outcomes)
    }

    /// Tick until the context is stopped
    pub fn run(mut self) {
        log::info!(
            "[Orchestrator] Running ({} detector, {:?} layout, mirror {})",
            self.detector.name(),
            self.zones.layout(),
            if self.mirror { "on" } else { "off" }
        );

        while !self.context.is_stopped() {
            if self.tick() == TickOutcome::Idle {
                thread::sleep(self.idle_sleep);
            }
        }

        log::info!("[Orchestrator] Stopped");
    }
}

impl<D: PoseDetector + 'static> Orchestrator<D> {
    pub fn spawn(self) -> EngineResult<JoinHandle<()>> {
        thread::Builder::new()
            .name("orchestrator".into())
            .spawn(move || self.run())
            .map_err(|source| EngineError::Spawn {
                name: "orchestrator",
                source,
            })
    }
}
