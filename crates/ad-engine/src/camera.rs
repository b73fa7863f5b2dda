//! Live camera capture via FFmpeg's device layer
//!
//! Opens the configured input format (`v4l2`, `avfoundation`, ...) on the
//! configured device, decodes whatever the camera sends (raw YUV or MJPEG)
//! and converts each frame to RGB24.

use ffmpeg_next::format::{context::Input, Pixel};
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::Video;
use image::RgbImage;

use crate::{rgb_from_strided, CameraConfig, CaptureDevice, EngineError, EngineResult};

fn ffmpeg_error(what: &str, e: ffmpeg_next::Error) -> EngineError {
    EngineError::Capture(format!("{}: {}", what, e))
}

/// Converter for one source geometry
struct Converter {
    source: (Pixel, u32, u32),
    context: scaling::Context,
}

/// Camera opened through libavdevice
pub struct FfmpegCamera {
    description: String,
    input: Input,
    stream_index: usize,
    decoder: ffmpeg_next::codec::decoder::Video,
    converter: Option<Converter>,
}

impl FfmpegCamera {
    /// Open `config.device`. `fps` is requested from the device when non-zero.
    pub fn open(config: &CameraConfig, fps: f32) -> EngineResult<Self> {
        ffmpeg_next::init().map_err(|e| ffmpeg_error("FFmpeg init", e))?;

        let format = ffmpeg_next::device::input::video()
            .find(|format| format.name() == config.input_format)
            .ok_or_else(|| {
                EngineError::Capture(format!(
                    "input format '{}' is not available in this FFmpeg build",
                    config.input_format
                ))
            })?;

        let mut options = ffmpeg_next::Dictionary::new();
        options.set("video_size", &format!("{}x{}", config.width, config.height));
        if fps > 0.0 {
            options.set("framerate", &format!("{}", fps));
        }

        let input = match ffmpeg_next::format::open_with(&config.device, &format, options) {
            Ok(ffmpeg_next::format::context::Context::Input(input)) => input,
            Ok(_) => {
                return Err(EngineError::Capture(format!(
                    "{} did not open as an input",
                    config.device
                )));
            }
            Err(e) => return Err(ffmpeg_error(&config.device, e)),
        };

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| EngineError::Capture(format!("{} has no video stream", config.device)))?;
        let stream_index = stream.index();

        let decoder = ffmpeg_next::codec::Context::from_parameters(stream.parameters())
            .map_err(|e| ffmpeg_error("codec parameters", e))?
            .decoder()
            .video()
            .map_err(|e| ffmpeg_error("video decoder", e))?;

        let description = format!(
            "camera {} via {} ({}x{})",
            config.device,
            config.input_format,
            decoder.width(),
            decoder.height()
        );

        Ok(Self {
            description,
            input,
            stream_index,
            decoder,
            converter: None,
        })
    }

    /// RGB24 copy of `decoded`. The converter follows the source geometry.
    fn convert(&mut self, decoded: &Video) -> EngineResult<RgbImage> {
        let source = (decoded.format(), decoded.width(), decoded.height());
        if self.converter.as_ref().map(|c| c.source) != Some(source) {
            let (format, width, height) = source;
            let context = scaling::Context::get(
                format,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                scaling::Flags::BILINEAR,
            )
            .map_err(|e| ffmpeg_error("pixel converter", e))?;
            self.converter = Some(Converter { source, context });
        }

        let mut rgb = Video::empty();
        if let Some(converter) = self.converter.as_mut() {
            converter
                .context
                .run(decoded, &mut rgb)
                .map_err(|e| ffmpeg_error("pixel conversion", e))?;
        }

        rgb_from_strided(rgb.data(0), rgb.stride(0), rgb.width(), rgb.height()).ok_or_else(|| {
            EngineError::Capture(format!(
                "short RGB frame from {} ({}x{})",
                self.description,
                rgb.width(),
                rgb.height()
            ))
        })
    }
}

impl CaptureDevice for FfmpegCamera {
    fn read_frame(&mut self) -> EngineResult<Option<RgbImage>> {
        let mut decoded = Video::empty();
        let mut got_frame = false;

        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }
            self.decoder
                .send_packet(&packet)
                .map_err(|e| ffmpeg_error("decode", e))?;
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                got_frame = true;
                break;
            }
        }

        // No more packets: the device went away
        if !got_frame {
            return Ok(None);
        }
        self.convert(&decoded).map(Some)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}
