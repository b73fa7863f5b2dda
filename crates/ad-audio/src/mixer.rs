//! Voice Mixer: pooled one-shot playback on the default output device
//!
//! - Fixed pool of voices, pre-allocated, nothing allocates in the callback
//! - Hits reach the audio thread through a lock-free command ring
//! - A hit arriving while every voice is busy is dropped, never queued
//! - Low fixed device buffer when the device supports it

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::{Mutex, RwLock};
use rtrb::{Consumer, Producer, RingBuffer};
use serde::{Deserialize, Serialize};

use crate::{AudioError, AudioResult, DrumSample, SampleHandle, SamplePlayer};

// ═══════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════

/// Maximum concurrent voices (pre-allocated)
pub const MAX_VOICES: usize = 16;

/// Command ring buffer size
const COMMAND_BUFFER_SIZE: usize = 64;

/// Anti-click ramp over the last frames of a sample
const TAIL_FADE_FRAMES: usize = 32;

// ═══════════════════════════════════════════════════════════════════════════
// SETTINGS
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerSettings {
    /// Requested device buffer in frames (64 ≈ 1.5 ms at 44.1 kHz)
    pub buffer_frames: u32,
    /// Master gain applied to the mix, 0.0..=1.0
    pub master_volume: f32,
}

impl Default for MixerSettings {
    fn default() -> Self {
        Self {
            buffer_frames: 64,
            master_volume: 1.0,
        }
    }
}

impl MixerSettings {
    pub fn validate(&self) -> AudioResult<()> {
        if self.buffer_frames == 0 {
            return Err(AudioError::InvalidConfig("audio.buffer_frames must be non-zero".into()));
        }
        if !(0.0..=1.0).contains(&self.master_volume) {
            return Err(AudioError::InvalidConfig(format!(
                "audio.master_volume must be within [0, 1], got {}",
                self.master_volume
            )));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// COMMANDS (hit thread -> audio thread)
// ═══════════════════════════════════════════════════════════════════════════

enum MixerCommand {
    Trigger { sample: Arc<DrumSample> },
    /// Silence every voice at once
    StopAll,
}

/// Counters shared between the audio thread and the rest of the program
#[derive(Debug, Default)]
pub struct MixerStats {
    active_voices: AtomicU32,
    dropped_hits: AtomicU64,
}

impl MixerStats {
    pub fn active_voices(&self) -> u32 {
        self.active_voices.load(Ordering::Relaxed)
    }

    /// Hits lost to a full voice pool or a full command ring
    pub fn dropped_hits(&self) -> u64 {
        self.dropped_hits.load(Ordering::Relaxed)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// VOICE
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct Voice {
    sample: Option<Arc<DrumSample>>,
    position: usize,
}

impl Voice {
    #[inline]
    fn is_active(&self) -> bool {
        self.sample.is_some()
    }

    /// Add this voice into `output`. Returns false once the sample is finished.
    #[inline]
    fn mix_into(&mut self, output: &mut [f32], channels: usize, gain: f32) -> bool {
        let Some(sample) = self.sample.as_ref() else {
            return false;
        };

        let src_channels = sample.channels.max(1) as usize;
        let total_frames = sample.samples.len() / src_channels;
        let frames_needed = output.len() / channels;

        for frame in 0..frames_needed {
            let src_frame = self.position + frame;
            if src_frame >= total_frames {
                break;
            }

            let frames_until_end = total_frames - src_frame;
            let fade = if frames_until_end < TAIL_FADE_FRAMES {
                frames_until_end as f32 / TAIL_FADE_FRAMES as f32
            } else {
                1.0
            };

            let left = sample.samples[src_frame * src_channels] * gain * fade;
            let right = if src_channels > 1 {
                sample.samples[src_frame * src_channels + 1] * gain * fade
            } else {
                left
            };

            match channels {
                1 => output[frame] += (left + right) * 0.5,
                _ => {
                    output[frame * channels] += left;
                    output[frame * channels + 1] += right;
                }
            }
        }

        self.position += frames_needed;
        if self.position >= total_frames {
            self.sample = None;
            self.position = 0;
            false
        } else {
            true
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// MIXER CORE (audio thread, no locks, no allocations)
// ═══════════════════════════════════════════════════════════════════════════

/// Audio-thread half of the mixer. Owned by the device callback, or driven
/// directly with [`render`](Self::render) when running without a device.
pub struct MixerCore {
    voices: [Voice; MAX_VOICES],
    master_volume: f32,
    command_rx: Consumer<MixerCommand>,
    stats: Arc<MixerStats>,
}

impl MixerCore {
    fn new(command_rx: Consumer<MixerCommand>, master_volume: f32, stats: Arc<MixerStats>) -> Self {
        Self {
            voices: std::array::from_fn(|_| Voice::default()),
            master_volume,
            command_rx,
            stats,
        }
    }

    #[inline]
    fn process_commands(&mut self) {
        while let Ok(cmd) = self.command_rx.pop() {
            match cmd {
                MixerCommand::Trigger { sample } => {
                    if let Some(voice) = self.voices.iter_mut().find(|v| !v.is_active()) {
                        voice.sample = Some(sample);
                        voice.position = 0;
                    } else {
                        // Pool exhausted: the hit is lost
                        self.stats.dropped_hits.fetch_add(1, Ordering::Relaxed);
                    }
                }
                MixerCommand::StopAll => {
                    for voice in &mut self.voices {
                        voice.sample = None;
                        voice.position = 0;
                    }
                }
            }
        }
    }

    /// Fill one interleaved output buffer
    #[inline]
    pub fn render(&mut self, output: &mut [f32], channels: usize) {
        self.process_commands();

        output.fill(0.0);
        if channels == 0 {
            return;
        }

        let gain = self.master_volume;
        let mut active = 0;
        for voice in &mut self.voices {
            if voice.is_active() && voice.mix_into(output, channels, gain) {
                active += 1;
            }
        }
        self.stats.active_voices.store(active, Ordering::Relaxed);
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// VOICE MIXER (control-side interface)
// ═══════════════════════════════════════════════════════════════════════════

/// Pooled one-shot sample player
pub struct VoiceMixer {
    /// Command producer (lock-free send to audio thread)
    command_tx: Mutex<Option<Producer<MixerCommand>>>,
    /// Preloaded samples, indexed by handle
    bank: RwLock<Vec<Arc<DrumSample>>>,
    stats: Arc<MixerStats>,
    /// Stream thread handle
    stream_handle: Mutex<Option<thread::JoinHandle<()>>>,
    /// Stop signal
    stop_signal: Arc<AtomicBool>,
}

impl VoiceMixer {
    /// Open the default output device and start the stream
    pub fn open(settings: &MixerSettings) -> AudioResult<Self> {
        settings.validate()?;

        let (producer, consumer) = RingBuffer::new(COMMAND_BUFFER_SIZE);
        let stats = Arc::new(MixerStats::default());
        let core = MixerCore::new(consumer, settings.master_volume, Arc::clone(&stats));

        let stop_signal = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let handle = {
            let stop_signal = Arc::clone(&stop_signal);
            let buffer_frames = settings.buffer_frames;
            thread::Builder::new()
                .name("voice-mixer".into())
                .spawn(move || run_mixer_stream(core, buffer_frames, stop_signal, ready_tx))
                .map_err(|e| AudioError::StreamError(e.to_string()))?
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(AudioError::StreamError("mixer thread exited during startup".into()));
            }
        }

        Ok(Self {
            command_tx: Mutex::new(Some(producer)),
            bank: RwLock::new(Vec::new()),
            stats,
            stream_handle: Mutex::new(Some(handle)),
            stop_signal,
        })
    }

    /// Mixer without a device. The returned core renders on demand.
    pub fn offline(settings: &MixerSettings) -> (Self, MixerCore) {
        let (producer, consumer) = RingBuffer::new(COMMAND_BUFFER_SIZE);
        let stats = Arc::new(MixerStats::default());
        let core = MixerCore::new(consumer, settings.master_volume, Arc::clone(&stats));

        let mixer = Self {
            command_tx: Mutex::new(Some(producer)),
            bank: RwLock::new(Vec::new()),
            stats,
            stream_handle: Mutex::new(None),
            stop_signal: Arc::new(AtomicBool::new(false)),
        };
        (mixer, core)
    }

    pub fn stats(&self) -> &MixerStats {
        &self.stats
    }

    /// Register an already decoded sample
    pub fn insert(&self, sample: DrumSample) -> SampleHandle {
        let mut bank = self.bank.write();
        bank.push(Arc::new(sample));
        SampleHandle((bank.len() - 1) as u32)
    }

    /// Cut every ringing voice, e.g. before the stream closes
    pub fn stop_all(&self) {
        self.send(MixerCommand::StopAll);
    }

    fn send(&self, command: MixerCommand) -> bool {
        match self.command_tx.lock().as_mut() {
            Some(tx) => tx.push(command).is_ok(),
            None => false,
        }
    }

    /// Stop the audio stream
    pub fn stop_stream(&self) {
        self.stop_signal.store(true, Ordering::Release);

        if let Some(handle) = self.stream_handle.lock().take() {
            let _ = handle.join();
        }

        *self.command_tx.lock() = None;
    }
}

impl SamplePlayer for VoiceMixer {
    fn preload(&self, name: &str, path: &std::path::Path) -> Option<SampleHandle> {
        match DrumSample::load_wav(name, path) {
            Ok(sample) => {
                log::debug!(
                    "[VoiceMixer] Loaded {} ({:.3} s, {} ch, {} Hz)",
                    name,
                    sample.duration_secs(),
                    sample.channels,
                    sample.sample_rate
                );
                Some(self.insert(sample))
            }
            Err(e) => {
                log::warn!("[VoiceMixer] {}", e);
                None
            }
        }
    }

    fn play(&self, handle: SampleHandle) {
        let Some(sample) = self.bank.read().get(handle.0 as usize).cloned() else {
            return;
        };
        if !self.send(MixerCommand::Trigger { sample }) {
            self.stats.dropped_hits.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Drop for VoiceMixer {
    fn drop(&mut self) {
        self.stop_stream();
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// AUDIO STREAM THREAD
// ═══════════════════════════════════════════════════════════════════════════

fn run_mixer_stream(
    core: MixerCore,
    buffer_frames: u32,
    stop_signal: Arc<AtomicBool>,
    ready_tx: crossbeam_channel::Sender<AudioResult<()>>,
) {
    let stream = match build_stream(core, buffer_frames) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));

    // The stream must stay on this thread; hold it until told to stop
    while !stop_signal.load(Ordering::Acquire) {
        thread::sleep(Duration::from_millis(50));
    }

    drop(stream);
    log::info!("[VoiceMixer] Stream stopped");
}

fn build_stream(mut core: MixerCore, buffer_frames: u32) -> AudioResult<cpal::Stream> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

    let supported = device
        .default_output_config()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?;

    let channels = supported.channels();
    let fixed_buffer = matches!(
        supported.buffer_size(),
        cpal::SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&buffer_frames)
    );

    let mut config = supported.config();
    config.buffer_size = if fixed_buffer {
        cpal::BufferSize::Fixed(buffer_frames)
    } else {
        log::warn!(
            "[VoiceMixer] Device does not accept a {}-frame buffer, using its default",
            buffer_frames
        );
        cpal::BufferSize::Default
    };

    log::info!(
        "[VoiceMixer] Starting stream: {:?} Hz, {} channels, buffer {:?}, {} voices",
        config.sample_rate,
        channels,
        config.buffer_size,
        MAX_VOICES
    );

    let out_channels = channels as usize;
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                core.render(data, out_channels);
            },
            |err| {
                log::error!("[VoiceMixer] Stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamError(e.to_string()))?;

    stream
        .play()
        .map_err(|e| AudioError::StreamError(e.to_string()))?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(name: &str, value: f32, frames: usize, channels: u16) -> DrumSample {
        DrumSample {
            name: name.into(),
            samples: vec![value; frames * channels as usize],
            channels,
            sample_rate: 44100,
        }
    }

    #[test]
    fn test_voice_slots_start_inactive() {
        let (_mixer, core) = VoiceMixer::offline(&MixerSettings::default());
        assert_eq!(core.active_voices(), 0);
    }

    #[test]
    fn test_mono_sample_reaches_both_channels() {
        let (mixer, mut core) = VoiceMixer::offline(&MixerSettings::default());
        let handle = mixer.insert(constant("SNARE", 0.5, 1024, 1));
        mixer.play(handle);

        let mut out = vec![0.0f32; 64 * 2];
        core.render(&mut out, 2);
        assert_eq!(out[0], 0.5);
        assert_eq!(out[1], 0.5);
        assert_eq!(core.active_voices(), 1);
    }

    #[test]
    fn test_overlapping_hits_sum() {
        let (mixer, mut core) = VoiceMixer::offline(&MixerSettings::default());
        let handle = mixer.insert(constant("HI-HAT", 0.25, 1024, 2));
        mixer.play(handle);
        mixer.play(handle);

        let mut out = vec![0.0f32; 32 * 2];
        core.render(&mut out, 2);
        assert_eq!(out[0], 0.5);
        assert_eq!(core.active_voices(), 2);
    }

    #[test]
    fn test_pool_overflow_drops_hit() {
        let (mixer, mut core) = VoiceMixer::offline(&MixerSettings::default());
        let handle = mixer.insert(constant("CRASH", 0.1, 4096, 2));
        for _ in 0..MAX_VOICES + 1 {
            mixer.play(handle);
        }

        let mut out = vec![0.0f32; 16 * 2];
        core.render(&mut out, 2);
        assert_eq!(core.active_voices(), MAX_VOICES);
        assert_eq!(mixer.stats().dropped_hits(), 1);
    }

    #[test]
    fn test_finished_voice_frees_its_slot() {
        let (mixer, mut core) = VoiceMixer::offline(&MixerSettings::default());
        let handle = mixer.insert(constant("KICK", 0.5, 100, 1));
        mixer.play(handle);

        let mut out = vec![0.0f32; 128 * 2];
        core.render(&mut out, 2);
        assert_eq!(core.active_voices(), 0);
        // Tail is faded and silence follows the sample
        assert!(out[99 * 2].abs() < 0.5);
        assert_eq!(out[100 * 2], 0.0);
    }

    #[test]
    fn test_unknown_handle_is_ignored() {
        let (mixer, mut core) = VoiceMixer::offline(&MixerSettings::default());
        mixer.play(SampleHandle(7));
        let mut out = vec![0.0f32; 8];
        core.render(&mut out, 2);
        assert_eq!(core.active_voices(), 0);
    }

    #[test]
    fn test_stop_all_silences_ringing_voices() {
        let (mixer, mut core) = VoiceMixer::offline(&MixerSettings::default());
        let handle = mixer.insert(constant("CRASH", 0.3, 4096, 2));
        mixer.play(handle);
        mixer.play(handle);

        let mut out = vec![0.0f32; 32 * 2];
        core.render(&mut out, 2);
        assert_eq!(core.active_voices(), 2);

        mixer.stop_all();
        core.render(&mut out, 2);
        assert_eq!(core.active_voices(), 0);
        assert!(out.iter().all(|&s| s == 0.0));

        // Pool is free again
        mixer.play(handle);
        core.render(&mut out, 2);
        assert_eq!(core.active_voices(), 1);
    }

    #[test]
    fn test_master_volume_scales_mix() {
        let settings = MixerSettings {
            master_volume: 0.5,
            ..MixerSettings::default()
        };
        let (mixer, mut core) = VoiceMixer::offline(&settings);
        let handle = mixer.insert(constant("RIDE", 0.8, 1024, 1));
        mixer.play(handle);

        let mut out = vec![0.0f32; 16];
        core.render(&mut out, 1);
        assert!((out[0] - 0.4).abs() < 1e-6);
    }
}
