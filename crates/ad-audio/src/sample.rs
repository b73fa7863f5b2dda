//! One-shot drum samples

use std::path::Path;

use crate::{AudioError, AudioResult};

/// Decoded sample, interleaved f32 in `[-1, 1]`
#[derive(Debug, Clone)]
pub struct DrumSample {
    pub name: String,
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl DrumSample {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / self.sample_rate as f64
        }
    }

    /// Load a WAV file (integer PCM of any width, or 32-bit float)
    pub fn load_wav(name: &str, path: &Path) -> AudioResult<Self> {
        let load_error = |reason: String| AudioError::LoadError {
            path: path.display().to_string(),
            reason,
        };

        let reader = hound::WavReader::open(path).map_err(|e| load_error(e.to_string()))?;
        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(load_error("zero channels".into()));
        }

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| load_error(e.to_string()))?,
            hound::SampleFormat::Int => {
                let max_val = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| load_error(e.to_string()))?
            }
        };

        Ok(Self {
            name: name.to_string(),
            samples,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
        })
    }
}
