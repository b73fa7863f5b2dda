//! Pose landmarks and the detector seam

use ad_core::Limb;
use image::RgbImage;

use crate::TrackingResult;

/// One detected keypoint in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    /// 0 = left edge, 1 = right edge
    pub x: f32,
    /// 0 = top edge, 1 = bottom edge
    pub y: f32,
    /// Detector confidence in `[0, 1]`
    pub visibility: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }

    /// Reflect across the vertical center line
    #[inline]
    pub fn mirrored(self) -> Self {
        Self {
            x: 1.0 - self.x,
            ..self
        }
    }

    /// Both coordinates are real numbers
    #[inline]
    pub fn has_finite_position(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Joints the tracker consumes. Sides are the player's anatomical sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
}

impl Joint {
    pub const ALL: [Joint; 4] = [
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
    ];

    #[inline]
    fn index(self) -> usize {
        match self {
            Joint::LeftElbow => 0,
            Joint::RightElbow => 1,
            Joint::LeftWrist => 2,
            Joint::RightWrist => 3,
        }
    }

    pub fn elbow(limb: Limb) -> Self {
        match limb {
            Limb::Left => Joint::LeftElbow,
            Limb::Right => Joint::RightElbow,
        }
    }

    pub fn wrist(limb: Limb) -> Self {
        match limb {
            Limb::Left => Joint::LeftWrist,
            Limb::Right => Joint::RightWrist,
        }
    }
}

/// Elbow and wrist of one arm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmSample {
    pub elbow: Landmark,
    pub wrist: Landmark,
}

impl ArmSample {
    pub fn mirrored(self) -> Self {
        Self {
            elbow: self.elbow.mirrored(),
            wrist: self.wrist.mirrored(),
        }
    }

    pub fn has_finite_position(&self) -> bool {
        self.elbow.has_finite_position() && self.wrist.has_finite_position()
    }
}

/// Result of one pose estimation. Missing joints stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseLandmarks {
    joints: [Option<Landmark>; 4],
}

impl PoseLandmarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, joint: Joint, landmark: Landmark) -> Self {
        self.set(joint, landmark);
        self
    }

    pub fn set(&mut self, joint: Joint, landmark: Landmark) {
        self.joints[joint.index()] = Some(landmark);
    }

    pub fn get(&self, joint: Joint) -> Option<Landmark> {
        self.joints[joint.index()]
    }

    /// Arm driving `limb`.
    ///
    /// Limbs follow the player's own hands. In mirror mode the image is read
    /// as if flipped horizontally, so the player's right hand lands on the
    /// right side of the kit just like in a mirror.
    pub fn arm(&self, limb: Limb, mirror: bool) -> Option<ArmSample> {
        let arm = ArmSample {
            elbow: self.get(Joint::elbow(limb))?,
            wrist: self.get(Joint::wrist(limb))?,
        };
        Some(if mirror { arm.mirrored() } else { arm })
    }
}

/// Pose estimator seam. Implementations own their model state.
pub trait PoseDetector: Send {
    /// Estimate one pose in `frame`. `Ok(None)` means no person was found.
    fn detect(&mut self, frame: &RgbImage) -> TrackingResult<Option<PoseLandmarks>>;

    fn name(&self) -> &str {
        "pose-detector"
    }
}

impl<D: PoseDetector + ?Sized> PoseDetector for Box<D> {
    fn detect(&mut self, frame: &RgbImage) -> TrackingResult<Option<PoseLandmarks>> {
        (**self).detect(frame)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose() -> PoseLandmarks {
        PoseLandmarks::new()
            .with(Joint::LeftElbow, Landmark::new(0.2, 0.6, 0.9))
            .with(Joint::LeftWrist, Landmark::new(0.25, 0.7, 0.8))
            .with(Joint::RightElbow, Landmark::new(0.8, 0.6, 0.9))
    }

    #[test]
    fn test_arm_requires_both_joints() {
        let pose = pose();
        assert!(pose.arm(Limb::Left, false).is_some());
        assert!(pose.arm(Limb::Right, false).is_none());
    }

    #[test]
    fn test_mirror_reflects_x_only() {
        let arm = pose().arm(Limb::Left, true).unwrap();
        assert!((arm.wrist.x - 0.75).abs() < 1e-6);
        assert!((arm.wrist.y - 0.7).abs() < 1e-6);
        assert!((arm.elbow.x - 0.8).abs() < 1e-6);
        assert_eq!(arm.wrist.visibility, 0.8);
    }

    #[test]
    fn test_non_finite_coordinates_are_flagged() {
        let good = pose().arm(Limb::Left, false).unwrap();
        assert!(good.has_finite_position());

        let mut bad = good;
        bad.elbow.x = f32::NAN;
        assert!(!bad.has_finite_position());

        let mut bad = good;
        bad.wrist.y = f32::INFINITY;
        assert!(!bad.has_finite_position());
    }
}
