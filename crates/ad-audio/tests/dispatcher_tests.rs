//! AudioDispatcher Integration Tests
//!
//! Tests for:
//! - Kit preloading from a directory of WAV files
//! - Missing assets turning into silent no-ops
//! - Trigger -> play mapping per drum voice
//! - End-to-end trigger through the offline VoiceMixer

use ad_audio::{AudioDispatcher, KitConfig, MixerSettings, SampleHandle, SamplePlayer, VoiceMixer};
use ad_core::DrumVoice;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Player that accepts any existing file and records play calls by name
#[derive(Default)]
struct RecordingPlayer {
    names: Mutex<HashMap<SampleHandle, String>>,
    played: Mutex<Vec<String>>,
}

impl RecordingPlayer {
    fn played(&self) -> Vec<String> {
        self.played.lock().clone()
    }
}

impl SamplePlayer for RecordingPlayer {
    fn preload(&self, name: &str, path: &Path) -> Option<SampleHandle> {
        if !path.exists() {
            return None;
        }
        let mut names = self.names.lock();
        let handle = SampleHandle(names.len() as u32);
        names.insert(handle, name.to_string());
        Some(handle)
    }

    fn play(&self, handle: SampleHandle) {
        if let Some(name) = self.names.lock().get(&handle) {
            self.played.lock().push(name.clone());
        }
    }
}

fn write_wav(path: &Path, value: i16, frames: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..frames {
        writer.write_sample(value).unwrap();
    }
    writer.finalize().unwrap();
}

/// Kit directory with every default file except the ride
fn kit_without_ride() -> (tempfile::TempDir, KitConfig) {
    let dir = tempfile::tempdir().unwrap();
    for voice in DrumVoice::ALL {
        if voice != DrumVoice::Ride {
            write_wav(&dir.path().join(voice.default_file_name()), 8192, 256);
        }
    }
    let kit = KitConfig {
        samples_dir: dir.path().to_path_buf(),
        ..KitConfig::default()
    };
    (dir, kit)
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_trigger_plays_matching_sample() {
    let (_dir, kit) = kit_without_ride();
    let player = Arc::new(RecordingPlayer::default());
    let dispatcher = AudioDispatcher::preload_kit(player.clone(), &kit).unwrap();

    assert!(dispatcher.trigger(DrumVoice::Crash));
    assert!(dispatcher.trigger(DrumVoice::Kick));
    assert_eq!(player.played(), vec!["CRASH", "KICK"]);
}

#[test]
fn test_missing_asset_is_silent_noop() {
    let (_dir, kit) = kit_without_ride();
    let player = Arc::new(RecordingPlayer::default());
    let dispatcher = AudioDispatcher::preload_kit(player.clone(), &kit).unwrap();

    assert!(!dispatcher.is_loaded(DrumVoice::Ride));
    assert!(!dispatcher.trigger(DrumVoice::Ride));
    assert!(!dispatcher.trigger(DrumVoice::Ride));
    assert!(player.played().is_empty());
}

#[test]
fn test_empty_kit_directory_still_starts() {
    let dir = tempfile::tempdir().unwrap();
    let kit = KitConfig {
        samples_dir: dir.path().to_path_buf(),
        ..KitConfig::default()
    };
    let dispatcher = AudioDispatcher::preload_kit(Arc::new(RecordingPlayer::default()), &kit).unwrap();
    for voice in DrumVoice::ALL {
        assert!(!dispatcher.trigger(voice));
    }
}

#[test]
fn test_dispatch_through_offline_mixer() {
    let (_dir, kit) = kit_without_ride();
    let (mixer, mut core) = VoiceMixer::offline(&MixerSettings::default());
    let mixer = Arc::new(mixer);
    let dispatcher = AudioDispatcher::preload_kit(mixer.clone(), &kit).unwrap();

    assert!(dispatcher.trigger(DrumVoice::Snare));

    let mut out = vec![0.0f32; 64 * 2];
    core.render(&mut out, 2);
    assert_eq!(core.active_voices(), 1);
    assert!((out[0] - 0.25).abs() < 1e-4);
}
