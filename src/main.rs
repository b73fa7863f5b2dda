//! AirDrums - camera-tracked air drumming
//!
//! Main entry point: loads the kit and the pose model, starts the hit
//! listener, the frame producer and the classify loop, then waits for Ctrl-C.

mod config;
mod priority;

use std::io::{BufRead, Write};
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::path::PathBuf;
use std::sync::Arc;

use ad_audio::{AudioDispatcher, VoiceMixer};
use ad_core::{ZoneLayout, ZoneMap};
use ad_engine::{CaptureProducer, CaptureSource, EngineContext, HitRouter, Orchestrator};
use ad_net::{FrameIngress, HitListener};
use ad_pose::MoveNetDetector;
use ad_tracking::PredictorConfig;
use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{AirDrumsConfig, RunMode};
use crate::priority::PriorityResult;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum PredictorKind {
    /// Wrist-displacement warp
    Linear,
    /// Alpha-beta filter with look-ahead
    AlphaBeta,
}

#[derive(Parser)]
#[command(name = "airdrums", version, about = "Camera-tracked air drums with sensor-triggered hits")]
struct Cli {
    /// TOML config file (defaults are used for anything it leaves out)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frame source; prompts when neither this nor the config sets it
    #[arg(short, long)]
    mode: Option<RunMode>,

    /// Replay this directory of stills instead of opening a camera
    #[arg(long, conflicts_with = "camera")]
    capture_dir: Option<PathBuf>,

    /// Camera device for local mode, e.g. /dev/video1 (needs the `camera` feature)
    #[arg(long)]
    camera: Option<String>,

    /// MoveNet ONNX model
    #[arg(long)]
    model: Option<PathBuf>,

    /// Directory holding the kit's WAV files
    #[arg(long)]
    sounds: Option<PathBuf>,

    /// Zone layout: four or five
    #[arg(long)]
    layout: Option<String>,

    #[arg(long, value_enum)]
    predictor: Option<PredictorKind>,

    /// Dispatch every hit, even repeats inside the debounce window
    #[arg(long)]
    no_debounce: bool,

    /// Mirror the camera picture
    #[arg(long)]
    mirror: Option<bool>,

    #[arg(long)]
    hit_port: Option<u16>,

    #[arg(long)]
    discovery_port: Option<u16>,

    /// WebSocket port for the phone camera
    #[arg(long)]
    web_port: Option<u16>,

    /// Log filter (overrides RUST_LOG), e.g. `debug` or `ad_net=trace`
    #[arg(long)]
    log_level: Option<String>,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut AirDrumsConfig) -> Result<()> {
        if let Some(mode) = self.mode {
            config.mode = Some(mode);
        }
        if let Some(dir) = &self.capture_dir {
            config.capture.source = CaptureSource::ImageSequence;
            config.capture.directory = dir.clone();
        }
        if let Some(device) = &self.camera {
            config.capture.source = CaptureSource::Camera;
            config.capture.camera.device = device.clone();
        }
        if let Some(model) = &self.model {
            config.pose.model_path = model.clone();
        }
        if let Some(sounds) = &self.sounds {
            config.kit.samples_dir = sounds.clone();
        }
        if let Some(layout) = &self.layout {
            config.zones.layout = layout.parse::<ZoneLayout>()?;
        }
        match self.predictor {
            Some(PredictorKind::Linear) => config.tracker.predictor = PredictorConfig::linear(),
            Some(PredictorKind::AlphaBeta) => config.tracker.predictor = PredictorConfig::default(),
            None => {}
        }
        if self.no_debounce {
            config.net.debounce.enabled = false;
        }
        if let Some(mirror) = self.mirror {
            config.orchestrator.mirror = mirror;
        }
        if let Some(port) = self.hit_port {
            config.net.hit_port = port;
        }
        if let Some(port) = self.discovery_port {
            config.net.discovery_port = port;
        }
        if let Some(port) = self.web_port {
            config.ingress.port = port;
        }
        Ok(())
    }
}

fn init_logging(level: Option<&str>) {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(level) = level {
        builder.parse_filters(level);
    }
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let mut config = AirDrumsConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config)?;
    config.validate().context("invalid configuration")?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let mode = match config.mode {
        Some(mode) => mode,
        None => prompt_mode()?,
    };

    log::info!("Starting AirDrums ({} mode)...", mode);
    match priority::raise_process_priority(-10) {
        PriorityResult::Success => log::info!("Process priority raised"),
        PriorityResult::Failed => log::info!("Running at normal priority (no permission to raise it)"),
        PriorityResult::Unsupported => {}
    }

    if let Err(e) = run(&config, mode) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run(config: &AirDrumsConfig, mode: RunMode) -> Result<()> {
    let context = Arc::new(EngineContext::new());

    // Everything that can fail at startup happens before any thread starts
    let mixer = Arc::new(VoiceMixer::open(&config.audio).context("opening audio output")?);
    let dispatcher =
        AudioDispatcher::preload_kit(mixer.clone(), &config.kit).context("loading drum kit")?;
    let detector = MoveNetDetector::new(&config.pose).context("loading pose model")?;
    let zones = ZoneMap::new(config.zones.clone())?;
    let orchestrator = Orchestrator::new(
        Arc::clone(&context),
        detector,
        zones,
        &config.tracker,
        &config.orchestrator,
    )?;

    let router = Arc::new(HitRouter::new(Arc::clone(&context), dispatcher));
    let listener = HitListener::bind(&config.net, router).context("binding hit socket")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("starting async runtime")?;

    let mut capture = None;
    let mut ingress_shutdown = None;
    match mode {
        RunMode::Local => {
            capture = Some(
                CaptureProducer::start(&config.capture, Arc::clone(&context))
                    .context("opening capture device")?,
            );
        }
        RunMode::Remote => {
            let ingress = runtime
                .block_on(FrameIngress::bind(&config.ingress, Arc::clone(&context.frames)))
                .context("binding WebSocket ingress")?;
            ingress_shutdown = Some(ingress.shutdown_handle());
            runtime.spawn(ingress.run());

            let ip = local_ip().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
            log::info!("Point the phone at ws://{}:{}", ip, config.ingress.port);
        }
    }

    let listener_handle = listener.spawn(context.stop_flag())?;
    let orchestrator_handle = orchestrator.spawn()?;

    log::info!("Ready. Press Ctrl-C to stop.");
    runtime
        .block_on(tokio::signal::ctrl_c())
        .context("waiting for Ctrl-C")?;

    log::info!("Shutting down...");
    context.request_stop();
    if let Some(shutdown) = ingress_shutdown {
        shutdown.trigger();
    }
    let _ = listener_handle.join();
    let _ = orchestrator_handle.join();
    if let Some(capture) = capture {
        capture.join();
    }
    mixer.stop_all();
    mixer.stop_stream();
    runtime.shutdown_timeout(std::time::Duration::from_millis(500));

    log::info!("Stopped");
    Ok(())
}

/// Ask for the mode on stdin. Anything but `2` means local.
fn prompt_mode() -> Result<RunMode> {
    print!(" Mode (1=Local camera, 2=Phone): ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.parse().unwrap_or(RunMode::Local))
}

/// Outbound LAN address. Connecting a UDP socket sends nothing; it only
/// makes the OS pick the interface it would route through.
fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}
