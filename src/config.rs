//! Application configuration
//!
//! One TOML file, one table per component. Every field is optional; missing
//! fields keep their defaults.
//!
//! ```toml
//! mode = "remote"
//!
//! [zones]
//! layout = "four_zone"
//!
//! [tracker.predictor]
//! kind = "linear"
//! strength = 4.0
//!
//! [net.debounce]
//! enabled = false
//!
//! [capture]
//! source = "camera"
//! camera.device = "/dev/video1"
//!
//! [kit.samples]
//! "FLOOR TOM" = "kits/rock/tom_low.wav"
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ad_audio::{KitConfig, MixerSettings};
use ad_core::ZoneMapConfig;
use ad_engine::{CaptureConfig, OrchestratorConfig};
use ad_net::{IngressConfig, NetConfig};
use ad_pose::PoseConfig;
use ad_tracking::TrackerConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Where camera frames come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Capture device on this machine
    Local,
    /// Phone camera streaming over WebSocket
    Remote,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunMode::Local => "local",
            RunMode::Remote => "remote",
        })
    }
}

impl FromStr for RunMode {
    type Err = anyhow::Error;

    /// Accepts the names as well as the prompt's `1` / `2`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "local" => Ok(RunMode::Local),
            "2" | "remote" => Ok(RunMode::Remote),
            other => bail!("unknown mode '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AirDrumsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RunMode>,
    pub zones: ZoneMapConfig,
    pub tracker: TrackerConfig,
    pub orchestrator: OrchestratorConfig,
    pub pose: PoseConfig,
    pub net: NetConfig,
    pub ingress: IngressConfig,
    pub capture: CaptureConfig,
    pub audio: MixerSettings,
    pub kit: KitConfig,
}

impl AirDrumsConfig {
    /// Load `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.zones.validate().context("zones")?;
        self.tracker.validate().context("tracker")?;
        self.pose.validate().context("pose")?;
        self.net.validate().context("net")?;
        self.ingress.addr().context("ingress")?;
        self.capture.validate().context("capture")?;
        self.audio.validate().context("audio")?;
        self.kit.validate().context("kit")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ad_core::ZoneLayout;
    use ad_engine::{CameraConfig, CaptureSource};
    use ad_tracking::PredictorConfig;

    #[test]
    fn test_defaults_are_valid() {
        let config = AirDrumsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.net.hit_port, 5556);
        assert_eq!(config.audio.buffer_frames, 64);
        assert!(config.orchestrator.mirror);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AirDrumsConfig::from_toml(
            r#"
            mode = "remote"

            [zones]
            layout = "four_zone"

            [tracker.predictor]
            kind = "linear"

            [net.debounce]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, Some(RunMode::Remote));
        assert_eq!(config.zones.layout, ZoneLayout::FourZone);
        assert_eq!(config.zones.cymbal_height, 0.4);
        assert_eq!(config.tracker.predictor, PredictorConfig::linear());
        assert!(!config.net.debounce.enabled);
        assert_eq!(config.net.debounce.window_ms, 40);
    }

    #[test]
    fn test_roundtrips_through_toml() {
        let config = AirDrumsConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = AirDrumsConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.tracker, config.tracker);
        assert_eq!(parsed.ingress.port, 5000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("airdrums.toml");
        std::fs::write(&path, "[ingress]\nport = 8080\n").unwrap();

        let config = AirDrumsConfig::load(Some(&path)).unwrap();
        assert_eq!(config.ingress.port, 8080);
        assert!(AirDrumsConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
        assert_eq!(AirDrumsConfig::load(None).unwrap().ingress.port, 5000);
    }

    #[test]
    fn test_invalid_thresholds_fail_validation() {
        let config = AirDrumsConfig::from_toml(
            r#"
            [zones]
            left_divider = 0.8
            right_divider = 0.2
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_capture_source_from_file() {
        let config = AirDrumsConfig::from_toml(
            r#"
            [capture]
            source = "image_sequence"
            directory = "frames"

            [capture.camera]
            device = "/dev/video2"
            width = 1280
            height = 720
            "#,
        )
        .unwrap();

        assert_eq!(config.capture.source, CaptureSource::ImageSequence);
        assert_eq!(config.capture.directory, std::path::PathBuf::from("frames"));
        assert_eq!(config.capture.camera.device, "/dev/video2");
        assert_eq!(config.capture.camera.width, 1280);
        assert_eq!(config.capture.camera.input_format, CameraConfig::default().input_format);
        assert!(config.validate().is_ok());

        assert!(AirDrumsConfig::from_toml("[capture]\nsource = \"webcam\"\n").is_err());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("1".parse::<RunMode>().unwrap(), RunMode::Local);
        assert_eq!(" Remote ".parse::<RunMode>().unwrap(), RunMode::Remote);
        assert!("3".parse::<RunMode>().is_err());
    }
}
