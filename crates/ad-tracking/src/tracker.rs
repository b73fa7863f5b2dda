//! Per-limb tracker: landmarks in, zone out

use ad_core::{Limb, Point2, Zone, ZoneMap};
use serde::{Deserialize, Serialize};

use crate::{
    ArmSample, FilterState, Predictor, PredictorConfig, TrackingError, TrackingResult,
};

/// Tracker tuning, shared by both limbs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Stick length as a multiple of the forearm, measured from the elbow.
    ///
    /// 1.0 puts the tip on the wrist and 1.2 only reaches a fifth of a
    /// forearm past it. A stick held in the fist reaches about 1.2 forearm
    /// lengths beyond the wrist, which is 2.2 here.
    pub extension_factor: f32,
    /// Wrist visibility below this leaves the limb untouched
    pub confidence_threshold: f32,
    pub predictor: PredictorConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            extension_factor: 1.2,
            confidence_threshold: 0.3,
            predictor: PredictorConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> TrackingResult<()> {
        if !(self.extension_factor > 0.0 && self.extension_factor.is_finite()) {
            return Err(TrackingError::InvalidConfig(format!(
                "tracker.extension_factor must be positive, got {}",
                self.extension_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(TrackingError::InvalidConfig(format!(
                "tracker.confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        self.predictor.validate()
    }
}

/// What happened to a limb on one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackOutcome {
    /// Zone was recomputed from a confident wrist
    Updated { zone: Zone, tip: Point2 },
    /// Arm missing or not confident enough; previous zone kept
    Skipped,
}

/// Stick-tip tracker for one limb
#[derive(Debug, Clone)]
pub struct LimbTracker {
    limb: Limb,
    extension_factor: f32,
    confidence_threshold: f32,
    predictor: Predictor,
    zone: Zone,
    raw_tip: Option<Point2>,
    projected_tip: Option<Point2>,
    /// Whether the last tick produced a usable arm
    tracking: bool,
}

impl LimbTracker {
    pub fn new(limb: Limb, config: &TrackerConfig) -> Self {
        Self {
            limb,
            extension_factor: config.extension_factor,
            confidence_threshold: config.confidence_threshold,
            predictor: Predictor::from_config(&config.predictor),
            zone: Zone::default(),
            raw_tip: None,
            projected_tip: None,
            tracking: false,
        }
    }

    pub fn limb(&self) -> Limb {
        self.limb
    }

    /// Last zone this limb pointed at (SNARE until the first confident update)
    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn raw_tip(&self) -> Option<Point2> {
        self.raw_tip
    }

    /// Projected and clamped tip used for the last classification
    pub fn projected_tip(&self) -> Option<Point2> {
        self.projected_tip
    }

    pub fn filter_estimate(&self) -> Option<FilterState> {
        self.predictor.estimate()
    }

    /// Stick tip in pixels: `elbow + (wrist - elbow) * extension_factor`
    pub fn stick_tip(&self, arm: &ArmSample, width: f32, height: f32) -> Point2 {
        let elbow = Point2::new(arm.elbow.x * width, arm.elbow.y * height);
        let wrist = Point2::new(arm.wrist.x * width, arm.wrist.y * height);
        elbow + (wrist - elbow) * self.extension_factor
    }

    /// Advance the limb by one frame of size `width x height`.
    ///
    /// A missing arm, a zero-sized frame, a non-finite joint position or a
    /// wrist below the confidence threshold leaves every piece of state
    /// untouched, predictor included.
    pub fn update(
        &mut self,
        arm: Option<&ArmSample>,
        width: u32,
        height: u32,
        zones: &ZoneMap,
    ) -> TrackOutcome {
        let Some(arm) = arm.filter(|arm| self.is_usable(arm)) else {
            self.set_tracking(false);
            return TrackOutcome::Skipped;
        };
        if width == 0 || height == 0 {
            return TrackOutcome::Skipped;
        }
        self.set_tracking(true);

        let (w, h) = (width as f32, height as f32);
        let raw = self.stick_tip(arm, w, h);
        let tip = self.predictor.predict(raw, arm.wrist.x, w).clamp_to(w, h);
        let zone = zones.classify(tip.x / w, tip.y / h);

        if zone != self.zone {
            log::debug!("[Tracker] {} stick {} -> {}", self.limb.name(), self.zone, zone);
        }
        self.raw_tip = Some(raw);
        self.projected_tip = Some(tip);
        self.zone = zone;

        TrackOutcome::Updated { zone, tip }
    }

    fn is_usable(&self, arm: &ArmSample) -> bool {
        arm.has_finite_position() && arm.wrist.visibility >= self.confidence_threshold
    }

    fn set_tracking(&mut self, tracking: bool) {
        if tracking != self.tracking {
            if tracking {
                log::debug!("[Tracker] {} arm acquired", self.limb.name());
            } else {
                log::debug!("[Tracker] {} arm lost, holding {}", self.limb.name(), self.zone);
            }
            self.tracking = tracking;
        }
    }

    /// Forget motion history. The last zone is kept.
    pub fn reset(&mut self) {
        self.predictor.reset();
        self.raw_tip = None;
        self.projected_tip = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Landmark;
    use approx::assert_abs_diff_eq;

    fn arm(elbow: (f32, f32), wrist: (f32, f32), visibility: f32) -> ArmSample {
        ArmSample {
            elbow: Landmark::new(elbow.0, elbow.1, 0.9),
            wrist: Landmark::new(wrist.0, wrist.1, visibility),
        }
    }

    fn tracker(predictor: PredictorConfig) -> LimbTracker {
        LimbTracker::new(
            Limb::Left,
            &TrackerConfig {
                predictor,
                ..TrackerConfig::default()
            },
        )
    }

    #[test]
    fn test_stick_tip_extends_from_elbow() {
        let t = tracker(PredictorConfig::default());
        let tip = t.stick_tip(&arm((0.5, 0.5), (0.6, 0.7), 1.0), 100.0, 100.0);
        // elbow (50,50) + (10,20) * 1.2
        assert_abs_diff_eq!(tip.x, 62.0, epsilon = 1e-4);
        assert_abs_diff_eq!(tip.y, 74.0, epsilon = 1e-4);
    }

    #[test]
    fn test_confident_wrist_updates_zone() {
        let zones = ZoneMap::default();
        let mut t = tracker(PredictorConfig::default());
        // Tip lands around (0.16, 0.84): bottom-left
        let outcome = t.update(Some(&arm((0.1, 0.6), (0.15, 0.8), 0.9)), 640, 480, &zones);
        assert!(matches!(outcome, TrackOutcome::Updated { zone: Zone::HiHat, .. }));
        assert_eq!(t.zone(), Zone::HiHat);
    }

    #[test]
    fn test_low_confidence_keeps_state() {
        let zones = ZoneMap::default();
        let mut t = tracker(PredictorConfig::default());
        t.update(Some(&arm((0.8, 0.3), (0.85, 0.2), 0.9)), 640, 480, &zones);
        assert_eq!(t.zone(), Zone::Ride);
        let before = t.filter_estimate();

        for _ in 0..5 {
            let outcome = t.update(Some(&arm((0.1, 0.6), (0.15, 0.8), 0.2)), 640, 480, &zones);
            assert_eq!(outcome, TrackOutcome::Skipped);
        }
        assert_eq!(t.zone(), Zone::Ride);
        assert_eq!(t.filter_estimate(), before);
    }

    #[test]
    fn test_missing_arm_or_empty_frame_skips() {
        let zones = ZoneMap::default();
        let mut t = tracker(PredictorConfig::linear());
        assert_eq!(t.update(None, 640, 480, &zones), TrackOutcome::Skipped);
        let sample = arm((0.5, 0.5), (0.5, 0.6), 1.0);
        assert_eq!(t.update(Some(&sample), 0, 480, &zones), TrackOutcome::Skipped);
        assert!(t.raw_tip().is_none());
    }

    #[test]
    fn test_projected_tip_is_clamped_to_frame() {
        let zones = ZoneMap::default();
        let mut t = tracker(PredictorConfig::linear());
        // Forearm pointing far off the right edge
        let outcome = t.update(Some(&arm((0.9, 0.9), (1.3, 1.2), 1.0)), 200, 100, &zones);
        let TrackOutcome::Updated { tip, zone } = outcome else {
            panic!("expected an update");
        };
        assert_eq!(tip, Point2::new(200.0, 100.0));
        assert_eq!(zone, Zone::FloorTom);
    }

    #[test]
    fn test_non_finite_joint_does_not_poison_filter() {
        let zones = ZoneMap::default();
        let mut t = tracker(PredictorConfig::default());
        let hihat = arm((0.1, 0.6), (0.15, 0.8), 0.9);
        t.update(Some(&hihat), 640, 480, &zones);
        let before = t.filter_estimate();

        let mut broken = hihat;
        broken.elbow.x = f32::NAN;
        assert_eq!(t.update(Some(&broken), 640, 480, &zones), TrackOutcome::Skipped);
        let mut broken = hihat;
        broken.wrist.y = f32::INFINITY;
        assert_eq!(t.update(Some(&broken), 640, 480, &zones), TrackOutcome::Skipped);
        assert_eq!(t.filter_estimate(), before);

        for _ in 0..50 {
            let outcome = t.update(Some(&hihat), 640, 480, &zones);
            assert!(matches!(outcome, TrackOutcome::Updated { zone: Zone::HiHat, .. }));
        }
        let state = t.filter_estimate().unwrap();
        assert!(state.position.x.is_finite() && state.velocity.x.is_finite());
    }

    #[test]
    fn test_reset_keeps_zone_but_forgets_motion() {
        let zones = ZoneMap::default();
        let mut t = tracker(PredictorConfig::default());
        t.update(Some(&arm((0.1, 0.6), (0.15, 0.8), 0.9)), 640, 480, &zones);
        assert!(t.filter_estimate().is_some());

        t.reset();
        assert!(t.filter_estimate().is_none());
        assert!(t.raw_tip().is_none());
        assert_eq!(t.zone(), Zone::HiHat);
    }

    #[test]
    fn test_config_defaults_validate() {
        assert!(TrackerConfig::default().validate().is_ok());
        let bad = TrackerConfig {
            confidence_threshold: 1.5,
            ..TrackerConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
