//! MoveNet single-pose detector

use std::path::{Path, PathBuf};

use ad_tracking::{PoseDetector, PoseLandmarks, TrackingResult};
use image::{imageops::FilterType, RgbImage};
use serde::{Deserialize, Serialize};

use crate::{decode_keypoints, PoseError, PoseResult};

/// Element type of the model's image input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    /// Pixel values 0..=255 as int32 (the published Lightning/Thunder exports)
    Int32,
    /// Pixel values 0.0..=255.0 as float32
    Float32,
}

/// Pose backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    pub model_path: PathBuf,
    /// Square input edge in pixels (192 Lightning, 256 Thunder)
    pub input_size: u32,
    pub input_type: InputType,
    /// Mean keypoint score below which the frame is treated as empty
    pub min_pose_score: f32,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/movenet_singlepose_lightning.onnx"),
            input_size: 192,
            input_type: InputType::Int32,
            min_pose_score: 0.1,
        }
    }
}

impl PoseConfig {
    pub fn validate(&self) -> PoseResult<()> {
        if self.input_size == 0 {
            return Err(PoseError::InvalidConfig("pose.input_size must be non-zero".into()));
        }
        if !(0.0..=1.0).contains(&self.min_pose_score) {
            return Err(PoseError::InvalidConfig(format!(
                "pose.min_pose_score must be within [0, 1], got {}",
                self.min_pose_score
            )));
        }
        Ok(())
    }
}

/// Tract model wrapper
struct TractModel {
    model: tract_onnx::prelude::SimplePlan<
        tract_onnx::prelude::TypedFact,
        Box<dyn tract_onnx::prelude::TypedOp>,
        tract_onnx::prelude::Graph<
            tract_onnx::prelude::TypedFact,
            Box<dyn tract_onnx::prelude::TypedOp>,
        >,
    >,
}

/// MoveNet detector backed by tract
pub struct MoveNetDetector {
    tract_model: TractModel,
    input_size: u32,
    input_type: InputType,
    min_pose_score: f32,
}

impl MoveNetDetector {
    pub fn new(config: &PoseConfig) -> PoseResult<Self> {
        config.validate()?;
        let path = config.model_path.as_path();

        if !path.exists() {
            return Err(PoseError::ModelNotFound {
                path: path.display().to_string(),
            });
        }

        let tract_model = Self::load_tract_model(path, config.input_size, config.input_type)?;
        log::info!(
            "[Pose] Loaded {} ({}x{} {:?})",
            path.display(),
            config.input_size,
            config.input_size,
            config.input_type
        );

        Ok(Self {
            tract_model,
            input_size: config.input_size,
            input_type: config.input_type,
            min_pose_score: config.min_pose_score,
        })
    }

    fn load_tract_model(path: &Path, size: u32, input_type: InputType) -> PoseResult<TractModel> {
        use tract_onnx::prelude::*;

        let size = size as usize;
        let shape = [1, size, size, 3];
        let fact: InferenceFact = match input_type {
            InputType::Int32 => i32::fact(shape).into(),
            InputType::Float32 => f32::fact(shape).into(),
        };

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| PoseError::TractError(e.to_string()))?
            .with_input_fact(0, fact)
            .map_err(|e| PoseError::TractError(e.to_string()))?
            .into_optimized()
            .map_err(|e| PoseError::TractError(e.to_string()))?
            .into_runnable()
            .map_err(|e| PoseError::TractError(e.to_string()))?;

        Ok(TractModel { model })
    }

    /// Run the model on one frame
    pub fn estimate(&self, frame: &RgbImage) -> PoseResult<Option<PoseLandmarks>> {
        use tract_onnx::prelude::*;

        let size = self.input_size as usize;
        let pixels = resize_to_input(frame, self.input_size);
        let shape = [1, size, size, 3];

        let input: Tensor = match self.input_type {
            InputType::Int32 => {
                let data: Vec<i32> = pixels.iter().map(|&p| p as i32).collect();
                Tensor::from_shape(&shape, &data)
            }
            InputType::Float32 => {
                let data: Vec<f32> = pixels.iter().map(|&p| p as f32).collect();
                Tensor::from_shape(&shape, &data)
            }
        }
        .map_err(|e| PoseError::TractError(e.to_string()))?;

        let outputs = self
            .tract_model
            .model
            .run(tvec!(input.into()))
            .map_err(|e| PoseError::TractError(e.to_string()))?;

        let Some(keypoints) = outputs.first() else {
            return Err(PoseError::InvalidOutputShape {
                expected: "[1, 1, 17, 3]".into(),
                got: "no outputs".into(),
            });
        };
        let values = keypoints
            .as_slice::<f32>()
            .map_err(|e| PoseError::TractError(e.to_string()))?;

        decode_keypoints(values, self.min_pose_score)
    }
}

impl PoseDetector for MoveNetDetector {
    fn detect(&mut self, frame: &RgbImage) -> TrackingResult<Option<PoseLandmarks>> {
        Ok(self.estimate(frame)?)
    }

    fn name(&self) -> &str {
        "movenet"
    }
}

/// Stretch `frame` to the square model input and return interleaved RGB bytes.
///
/// Stretching (rather than letterboxing) keeps normalized keypoints valid for
/// the original frame.
pub fn resize_to_input(frame: &RgbImage, size: u32) -> Vec<u8> {
    if frame.width() == size && frame.height() == size {
        return frame.as_raw().clone();
    }
    image::imageops::resize(frame, size, size, FilterType::Triangle).into_raw()
}
