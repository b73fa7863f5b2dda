//! Local frame producers
//!
//! A live camera (built with the `camera` feature) or a directory of stills
//! replayed at a fixed rate. Either way a dedicated thread reads frames and
//! overwrites the shared frame slot.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::{EngineContext, EngineError, EngineResult};

/// A source of camera frames
pub trait CaptureDevice {
    /// Next frame. `Ok(None)` means the device has nothing more to give.
    fn read_frame(&mut self) -> EngineResult<Option<RgbImage>>;

    fn describe(&self) -> String;
}

/// Where local frames come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    /// Live camera through FFmpeg (`camera` feature)
    Camera,
    /// Stills from [`CaptureConfig::directory`]
    ImageSequence,
}

impl Default for CaptureSource {
    fn default() -> Self {
        if cfg!(feature = "camera") {
            CaptureSource::Camera
        } else {
            CaptureSource::ImageSequence
        }
    }
}

/// Live camera settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// `/dev/video0` for v4l2, a device index such as `0` for avfoundation
    pub device: String,
    /// FFmpeg input device format (`v4l2`, `avfoundation`, `dshow`)
    pub input_format: String,
    /// Requested capture size; the device may pick the closest it supports
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let (input_format, device) = if cfg!(target_os = "macos") {
            ("avfoundation", "0")
        } else {
            ("v4l2", "/dev/video0")
        };
        Self {
            device: device.into(),
            input_format: input_format.into(),
            width: 640,
            height: 480,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub source: CaptureSource,
    /// Directory of still images (jpg/png), replayed in file-name order
    pub directory: PathBuf,
    /// Target frame rate; 0 = as fast as frames can be read
    pub fps: f32,
    /// Start over after the last frame
    pub looped: bool,
    pub camera: CameraConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: CaptureSource::default(),
            directory: PathBuf::from("capture"),
            fps: 30.0,
            looped: true,
            camera: CameraConfig::default(),
        }
    }
}

impl CaptureConfig {
    pub fn frame_interval(&self) -> Option<Duration> {
        (self.fps > 0.0).then(|| Duration::from_secs_f32(1.0 / self.fps))
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(self.fps >= 0.0 && self.fps.is_finite()) {
            return Err(EngineError::InvalidConfig(format!(
                "capture.fps must be a non-negative number, got {}",
                self.fps
            )));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(EngineError::InvalidConfig(
                "capture.camera width and height must be non-zero".into(),
            ));
        }
        if self.camera.device.is_empty() {
            return Err(EngineError::InvalidConfig("capture.camera.device must be set".into()));
        }
        Ok(())
    }
}

/// Pack `height` rows of `width` RGB24 pixels, `stride` bytes apart, into an
/// image. `None` when `data` is too short for that layout.
pub fn rgb_from_strided(data: &[u8], stride: usize, width: u32, height: u32) -> Option<RgbImage> {
    let row = width as usize * 3;
    if stride < row {
        return None;
    }
    let mut pixels = Vec::with_capacity(row * height as usize);
    for y in 0..height as usize {
        let start = y * stride;
        pixels.extend_from_slice(data.get(start..start + row)?);
    }
    RgbImage::from_raw(width, height, pixels)
}

// ═══════════════════════════════════════════════════════════════════════════
// IMAGE SEQUENCE
// ═══════════════════════════════════════════════════════════════════════════

/// Replays a directory of stills as a camera
pub struct ImageSequenceCapture {
    directory: PathBuf,
    paths: Vec<PathBuf>,
    next: usize,
    looped: bool,
}

impl ImageSequenceCapture {
    pub fn open(directory: &Path, looped: bool) -> EngineResult<Self> {
        let entries = std::fs::read_dir(directory)
            .map_err(|e| EngineError::Capture(format!("{}: {}", directory.display(), e)))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_image(path))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(EngineError::EmptySequence(directory.display().to_string()));
        }

        Ok(Self {
            directory: directory.to_path_buf(),
            paths,
            next: 0,
            looped,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png"))
        .unwrap_or(false)
}

impl CaptureDevice for ImageSequenceCapture {
    fn read_frame(&mut self) -> EngineResult<Option<RgbImage>> {
        if self.next >= self.paths.len() {
            if !self.looped {
                return Ok(None);
            }
            self.next = 0;
        }

        let path = &self.paths[self.next];
        self.next += 1;

        let image = image::open(path)
            .map_err(|e| EngineError::Capture(format!("{}: {}", path.display(), e)))?;
        Ok(Some(image.to_rgb8()))
    }

    fn describe(&self) -> String {
        format!(
            "image sequence {} ({} frames{})",
            self.directory.display(),
            self.paths.len(),
            if self.looped { ", looped" } else { "" }
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PRODUCER THREAD
// ═══════════════════════════════════════════════════════════════════════════

/// Running capture thread
pub struct CaptureProducer {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl CaptureProducer {
    /// Start the producer configured by `config`
    pub fn start(config: &CaptureConfig, context: Arc<EngineContext>) -> EngineResult<Self> {
        match config.source {
            CaptureSource::ImageSequence => {
                let device = ImageSequenceCapture::open(&config.directory, config.looped)?;
                Self::spawn(device, context, config.frame_interval())
            }
            CaptureSource::Camera => start_camera(config, context),
        }
    }

    /// Read frames from `device` into the context's frame exchange until the
    /// context stops, the device runs dry, or a read fails.
    pub fn spawn<C: CaptureDevice + Send + 'static>(
        device: C,
        context: Arc<EngineContext>,
        frame_interval: Option<Duration>,
    ) -> EngineResult<Self> {
        Self::spawn_with(move || Ok(device), context, frame_interval)
    }

    /// Like [`spawn`](Self::spawn), but the device is opened on the capture
    /// thread itself. Returns once `open` has finished; its error is returned
    /// here.
    pub fn spawn_with<C, F>(
        open: F,
        context: Arc<EngineContext>,
        frame_interval: Option<Duration>,
    ) -> EngineResult<Self>
    where
        C: CaptureDevice,
        F: FnOnce() -> EngineResult<C> + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let handle = {
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("capture".into())
                .spawn(move || {
                    let mut device = match open() {
                        Ok(device) => {
                            let _ = ready_tx.send(Ok(()));
                            device
                        }
                        Err(e) => {
                            running.store(false, Ordering::Release);
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                    run_capture(&mut device, &context, frame_interval);
                    running.store(false, Ordering::Release);
                })
                .map_err(|source| EngineError::Spawn {
                    name: "capture",
                    source,
                })?
        };

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { running, handle }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(EngineError::Capture("capture thread exited during startup".into()))
            }
        }
    }

    /// False once the producer has stopped for any reason
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn join(self) {
        let _ = self.handle.join();
    }
}

fn run_capture<C: CaptureDevice>(
    device: &mut C,
    context: &EngineContext,
    frame_interval: Option<Duration>,
) {
    let description = device.describe();
    log::info!("[Capture] Reading {}", description);

    while !context.is_stopped() {
        let started = Instant::now();
        match device.read_frame() {
            Ok(Some(frame)) => {
                context.frames.publish(frame);
            }
            Ok(None) => {
                log::info!("[Capture] {} exhausted", description);
                break;
            }
            Err(e) => {
                log::error!("[Capture] {}", e);
                break;
            }
        }
        if let Some(interval) = frame_interval {
            if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }
    }
}

#[cfg(feature = "camera")]
fn start_camera(config: &CaptureConfig, context: Arc<EngineContext>) -> EngineResult<CaptureProducer> {
    let camera = config.camera.clone();
    let fps = config.fps;
    // The camera delivers at its own rate
    CaptureProducer::spawn_with(move || crate::FfmpegCamera::open(&camera, fps), context, None)
}

#[cfg(not(feature = "camera"))]
fn start_camera(_config: &CaptureConfig, _context: Arc<EngineContext>) -> EngineResult<CaptureProducer> {
    Err(EngineError::Capture(
        "built without camera support; rebuild with `--features camera` \
         or set capture.source = \"image_sequence\""
            .into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_frames(dir: &Path, count: u8) {
        for i in 0..count {
            let image = RgbImage::from_pixel(4, 4, image::Rgb([i, 0, 0]));
            image.save(dir.join(format!("frame_{:03}.png", i))).unwrap();
        }
        std::fs::write(dir.join("notes.txt"), b"not a frame").unwrap();
    }

    #[test]
    fn test_sequence_reads_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 3);

        let mut capture = ImageSequenceCapture::open(dir.path(), false).unwrap();
        assert_eq!(capture.len(), 3);
        for expected in 0..3u8 {
            let frame = capture.read_frame().unwrap().unwrap();
            assert_eq!(frame.get_pixel(0, 0).0[0], expected);
        }
        assert!(capture.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_looped_sequence_wraps() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 2);

        let mut capture = ImageSequenceCapture::open(dir.path(), true).unwrap();
        for _ in 0..2 {
            capture.read_frame().unwrap();
        }
        let frame = capture.read_frame().unwrap().unwrap();
        assert_eq!(frame.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_empty_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ImageSequenceCapture::open(dir.path(), true),
            Err(EngineError::EmptySequence(_))
        ));
    }

    #[test]
    fn test_strided_rows_drop_padding() {
        // 2x2 image, rows padded to 8 bytes
        let data = [
            1, 2, 3, 4, 5, 6, 0, 0, //
            7, 8, 9, 10, 11, 12, 0, 0,
        ];
        let image = rgb_from_strided(&data, 8, 2, 2).unwrap();
        assert_eq!(image.get_pixel(1, 0).0, [4, 5, 6]);
        assert_eq!(image.get_pixel(0, 1).0, [7, 8, 9]);
        assert_eq!(image.as_raw().len(), 12);

        assert!(rgb_from_strided(&data[..10], 8, 2, 2).is_none());
        assert!(rgb_from_strided(&data, 4, 2, 2).is_none());
    }

    #[test]
    fn test_open_failure_is_reported_by_spawn() {
        let context = Arc::new(EngineContext::new());
        let result = CaptureProducer::spawn_with(
            || -> EngineResult<ImageSequenceCapture> {
                Err(EngineError::Capture("no such camera".into()))
            },
            context,
            None,
        );
        assert!(matches!(result, Err(EngineError::Capture(msg)) if msg == "no such camera"));
    }

    #[test]
    fn test_start_replays_image_sequence() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 3);
        let config = CaptureConfig {
            source: CaptureSource::ImageSequence,
            directory: dir.path().to_path_buf(),
            fps: 0.0,
            looped: false,
            ..CaptureConfig::default()
        };
        let context = Arc::new(EngineContext::new());

        let producer = CaptureProducer::start(&config, Arc::clone(&context)).unwrap();
        producer.join();
        assert_eq!(context.frames.version(), 3);
    }

    #[cfg(not(feature = "camera"))]
    #[test]
    fn test_camera_source_needs_camera_feature() {
        assert_eq!(CaptureSource::default(), CaptureSource::ImageSequence);
        let config = CaptureConfig {
            source: CaptureSource::Camera,
            ..CaptureConfig::default()
        };
        let result = CaptureProducer::start(&config, Arc::new(EngineContext::new()));
        assert!(matches!(result, Err(EngineError::Capture(_))));
    }

    #[test]
    fn test_camera_config_validation() {
        assert!(CaptureConfig::default().validate().is_ok());
        let mut config = CaptureConfig::default();
        config.camera.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_producer_marks_itself_stopped_when_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 2);
        let capture = ImageSequenceCapture::open(dir.path(), false).unwrap();
        let context = Arc::new(EngineContext::new());

        let producer = CaptureProducer::spawn(capture, Arc::clone(&context), None).unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while producer.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        assert!(!producer.is_running());
        assert_eq!(context.frames.version(), 2);
        producer.join();
    }
}
