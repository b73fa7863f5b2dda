//! Hit dispatch: drum voice -> preloaded sample -> playback

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ad_core::DrumVoice;
use serde::{Deserialize, Serialize};

use crate::{AudioError, AudioResult};

/// Opaque reference to a preloaded sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleHandle(pub u32);

/// Audio output seam
pub trait SamplePlayer: Send + Sync {
    /// Load `path` under `name`. `None` when the asset is unusable.
    fn preload(&self, name: &str, path: &Path) -> Option<SampleHandle>;

    /// Start playback and return immediately
    fn play(&self, handle: SampleHandle);
}

/// Which WAV file each drum voice plays
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KitConfig {
    /// Base directory for relative sample paths
    pub samples_dir: PathBuf,
    /// Per-voice overrides, keyed by label (`SNARE`, `HI-HAT`, `FLOOR TOM`, ...)
    pub samples: BTreeMap<String, PathBuf>,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            samples_dir: PathBuf::from("sounds"),
            samples: BTreeMap::new(),
        }
    }
}

impl KitConfig {
    pub fn validate(&self) -> AudioResult<()> {
        self.overrides().map(|_| ())
    }

    fn overrides(&self) -> AudioResult<HashMap<DrumVoice, &Path>> {
        self.samples
            .iter()
            .map(|(label, path)| {
                label
                    .parse::<DrumVoice>()
                    .map(|voice| (voice, path.as_path()))
                    .map_err(|_| AudioError::InvalidConfig(format!("unknown drum voice '{}'", label)))
            })
            .collect()
    }

    /// Resolved path for every voice, overrides applied
    pub fn resolve(&self) -> AudioResult<Vec<(DrumVoice, PathBuf)>> {
        let overrides = self.overrides()?;
        Ok(DrumVoice::ALL
            .iter()
            .map(|&voice| {
                let file = overrides
                    .get(&voice)
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from(voice.default_file_name()));
                (voice, self.samples_dir.join(file))
            })
            .collect())
    }
}

/// Turns a resolved drum voice into a playback command
pub struct AudioDispatcher {
    player: Arc<dyn SamplePlayer>,
    handles: HashMap<DrumVoice, SampleHandle>,
}

impl AudioDispatcher {
    /// Preload every voice of the kit. Missing or broken files are logged and
    /// leave that voice silent.
    pub fn preload_kit(player: Arc<dyn SamplePlayer>, kit: &KitConfig) -> AudioResult<Self> {
        let mut handles = HashMap::new();
        for (voice, path) in kit.resolve()? {
            match player.preload(voice.label(), &path) {
                Some(handle) => {
                    handles.insert(voice, handle);
                }
                None => {
                    log::warn!(
                        "[Dispatcher] No sample for {} ({}), hits will be silent",
                        voice,
                        path.display()
                    );
                }
            }
        }

        log::info!(
            "[Dispatcher] Kit ready: {}/{} voices loaded",
            handles.len(),
            DrumVoice::ALL.len()
        );
        Ok(Self { player, handles })
    }

    pub fn is_loaded(&self, voice: DrumVoice) -> bool {
        self.handles.contains_key(&voice)
    }

    /// Fire `voice`. Returns false for a voice without a sample.
    pub fn trigger(&self, voice: DrumVoice) -> bool {
        let Some(&handle) = self.handles.get(&voice) else {
            return false;
        };
        self.player.play(handle);
        log::debug!("> {}", voice);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_kit_paths() {
        let resolved = KitConfig::default().resolve().unwrap();
        assert_eq!(resolved.len(), DrumVoice::ALL.len());
        let tom = resolved
            .iter()
            .find(|(voice, _)| *voice == DrumVoice::FloorTom)
            .unwrap();
        assert_eq!(tom.1, PathBuf::from("sounds/tom.wav"));
    }

    #[test]
    fn test_override_by_label() {
        let mut kit = KitConfig::default();
        kit.samples
            .insert("hi-hat".into(), PathBuf::from("/kits/jazz/hat.wav"));
        let resolved = kit.resolve().unwrap();
        let hat = resolved
            .iter()
            .find(|(voice, _)| *voice == DrumVoice::HiHat)
            .unwrap();
        // Absolute overrides replace the base directory
        assert_eq!(hat.1, PathBuf::from("/kits/jazz/hat.wav"));
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let mut kit = KitConfig::default();
        kit.samples.insert("COWBELL".into(), PathBuf::from("more.wav"));
        assert!(kit.validate().is_err());
    }
}
