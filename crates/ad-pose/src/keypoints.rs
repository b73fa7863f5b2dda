//! COCO-17 keypoint layout as emitted by MoveNet

use ad_tracking::{Joint, Landmark, PoseLandmarks};

use crate::{PoseError, PoseResult};

/// Number of keypoints in the COCO layout
pub const KEYPOINT_COUNT: usize = 17;

/// Values per keypoint: y, x, score
pub const KEYPOINT_STRIDE: usize = 3;

/// COCO index of each joint the tracker consumes
pub fn coco_index(joint: Joint) -> usize {
    match joint {
        Joint::LeftElbow => 7,
        Joint::RightElbow => 8,
        Joint::LeftWrist => 9,
        Joint::RightWrist => 10,
    }
}

/// Decode a flat `[1, 1, 17, 3]` keypoint tensor.
///
/// Returns `None` when the mean score over all keypoints is below
/// `min_pose_score` (nobody in frame). Joints with a non-finite position are
/// left out of the pose.
pub fn decode_keypoints(values: &[f32], min_pose_score: f32) -> PoseResult<Option<PoseLandmarks>> {
    let expected = KEYPOINT_COUNT * KEYPOINT_STRIDE;
    if values.len() < expected {
        return Err(PoseError::InvalidOutputShape {
            expected: format!("{} values", expected),
            got: format!("{} values", values.len()),
        });
    }

    let keypoint = |index: usize| {
        let base = index * KEYPOINT_STRIDE;
        Landmark::new(values[base + 1], values[base], values[base + 2])
    };

    let mean_score = (0..KEYPOINT_COUNT)
        .map(|i| keypoint(i).visibility)
        .sum::<f32>()
        / KEYPOINT_COUNT as f32;
    if !(mean_score >= min_pose_score) {
        return Ok(None);
    }

    let mut pose = PoseLandmarks::new();
    for joint in Joint::ALL {
        let landmark = keypoint(coco_index(joint));
        if landmark.has_finite_position() {
            pose.set(joint, landmark);
        }
    }
    Ok(Some(pose))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tensor_with(score: f32) -> Vec<f32> {
        let mut values = vec![0.0; KEYPOINT_COUNT * KEYPOINT_STRIDE];
        for i in 0..KEYPOINT_COUNT {
            values[i * 3] = 0.01 * i as f32;
            values[i * 3 + 1] = 0.5 + 0.01 * i as f32;
            values[i * 3 + 2] = score;
        }
        values
    }

    #[test]
    fn test_decodes_yx_order() {
        let pose = decode_keypoints(&tensor_with(0.8), 0.2).unwrap().unwrap();
        let wrist = pose.get(Joint::LeftWrist).unwrap();
        assert_abs_diff_eq!(wrist.y, 0.09, epsilon = 1e-6);
        assert_abs_diff_eq!(wrist.x, 0.59, epsilon = 1e-6);
        assert_abs_diff_eq!(wrist.visibility, 0.8, epsilon = 1e-6);

        let elbow = pose.get(Joint::RightElbow).unwrap();
        assert_abs_diff_eq!(elbow.x, 0.58, epsilon = 1e-6);
    }

    #[test]
    fn test_low_scores_mean_no_person() {
        assert!(decode_keypoints(&tensor_with(0.05), 0.2).unwrap().is_none());
    }

    #[test]
    fn test_non_finite_joint_is_left_out() {
        let mut values = tensor_with(0.8);
        // LeftWrist x
        values[coco_index(Joint::LeftWrist) * KEYPOINT_STRIDE + 1] = f32::NAN;
        // RightElbow y
        values[coco_index(Joint::RightElbow) * KEYPOINT_STRIDE] = f32::INFINITY;

        let pose = decode_keypoints(&values, 0.2).unwrap().unwrap();
        assert!(pose.get(Joint::LeftWrist).is_none());
        assert!(pose.get(Joint::RightElbow).is_none());
        assert!(pose.get(Joint::LeftElbow).is_some());
        assert!(pose.get(Joint::RightWrist).is_some());
    }

    #[test]
    fn test_short_tensor_is_rejected() {
        let err = decode_keypoints(&[0.0; 10], 0.2).unwrap_err();
        assert!(matches!(err, PoseError::InvalidOutputShape { .. }));
    }
}
