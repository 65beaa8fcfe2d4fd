// This is free and unencumbered software released into the public domain.

#[cfg(not(feature = "std"))]
compile_error!("asimov-gphoto-reader requires the 'std' feature");

#[cfg(not(unix))]
compile_error!("asimov-gphoto-reader requires a unix target");

use asimov_gphoto_module::{
    cli,
    shared::{
        CameraError, CameraEvent, Frame, ParameterValue, Registry, SessionConfig, SessionStatus,
        Worker, backends::gphoto2::Gphoto2Backend, open_camera,
    },
};
use asimov_module::SysexitsError::{self, *};
use clap::Parser;
use clientele::StandardOptions;
use image_hasher::{HashAlg, Hasher, HasherConfig, ImageHash};
use know::traits::ToJsonLd;
use std::{
    error::Error as StdError,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::RecvTimeoutError,
    },
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

/// How long a preview request may go unanswered before another is sent.
const PREVIEW_STALL: Duration = Duration::from_secs(2);

const EVENT_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Parser)]
struct Options {
    #[clap(flatten)]
    flags: StandardOptions,

    /// Camera model to open (default: the first detected camera)
    #[arg(long)]
    device: Option<String>,

    /// Preview frames per second
    #[arg(short, long, value_parser = parse_frequency, default_value = "5")]
    frequency: f64,

    /// Skip frames perceptually close to the previous one (repeat to widen)
    #[clap(short = 'D', long, action = clap::ArgAction::Count)]
    debounce: u8,

    /// Set a camera option before streaming, e.g. `--set iso=400`
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, ParameterValue)>,

    /// Take a single still image, write it to FILE and exit
    #[arg(long, value_name = "FILE")]
    capture: Option<PathBuf>,
}

pub fn main() -> Result<SysexitsError, Box<dyn StdError>> {
    asimov_module::dotenv().ok();
    let args = asimov_module::args_os()?;
    let options = Options::parse_from(args);

    if options.flags.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(EX_OK);
    }

    if options.flags.license {
        print!("{}", include_str!("../../UNLICENSE"));
        return Ok(EX_OK);
    }

    #[cfg(feature = "tracing")]
    asimov_module::init_tracing_subscriber(&options.flags).expect("failed to initialize logging");

    let exit_code = match run_reader(&options) {
        Ok(()) => EX_OK,
        Err(err) => cli::handle_error(&err, &options.flags),
    };

    Ok(exit_code)
}

fn run_reader(opts: &Options) -> Result<(), CameraError> {
    let registry = Registry::new(Gphoto2Backend);
    if !registry.is_ready() {
        return Err(CameraError::Unavailable);
    }

    let device = match opts.device.as_deref().map(str::trim) {
        Some(device) if !device.is_empty() => device.to_owned(),
        _ => registry.default_device(),
    };
    let port = registry.description_for(&device);
    cli::info_user(&opts.flags, &format!("opening {device} on {port}"));

    let worker = open_camera(&registry, &device, SessionConfig::default())?;
    worker.open()?;

    for (name, value) in &opts.set {
        if worker.set_parameter(name.as_str(), value.clone())? {
            cli::info_user(&opts.flags, &format!("set {name} = {value}"));
        } else {
            cli::warn_user(&opts.flags, &format!("failed to set {name} = {value}"));
        }
    }

    match &opts.capture {
        Some(path) => capture_still(&worker, path, opts),
        None => stream_previews(&worker, &device, opts),
    }
}

fn capture_still(worker: &Worker, path: &Path, opts: &Options) -> Result<(), CameraError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    worker.capture_photo(1, file_name)?;

    loop {
        match worker.events().recv().map_err(|_| CameraError::Closed)? {
            CameraEvent::ImageCaptured { data, file_name, .. } => {
                std::fs::write(path, &data)
                    .map_err(|e| CameraError::driver("writing captured image", e))?;
                cli::info_user(
                    &opts.flags,
                    &format!("wrote {} bytes to {file_name}", data.len()),
                );
                return Ok(());
            },
            CameraEvent::ImageCaptureError { message, .. } => {
                return Err(CameraError::other(message));
            },
            CameraEvent::StatusChanged(SessionStatus::Unavailable) => {
                return Err(CameraError::Unavailable);
            },
            CameraEvent::Error { message, .. } => cli::warn_user(&opts.flags, &message),
            _ => {},
        }
    }
}

fn stream_previews(worker: &Worker, device: &str, opts: &Options) -> Result<(), CameraError> {
    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit2 = Arc::clone(&quit);
        ctrlc::set_handler(move || {
            quit2.store(true, Ordering::SeqCst);
        })
        .map_err(|e| CameraError::other(format!("{e}")))?;
    }

    let interval = Duration::from_secs_f64(1.0 / opts.frequency.max(0.000_001));
    let mut emitter = Emitter::new(device, opts.debounce);
    let mut next_due = Instant::now();
    let mut in_flight: Option<Instant> = None;

    while !quit.load(Ordering::SeqCst) {
        let now = Instant::now();
        let idle = in_flight.is_none_or(|sent| now.duration_since(sent) >= PREVIEW_STALL);
        if idle && now >= next_due {
            worker.capture_preview()?;
            in_flight = Some(now);
            next_due = now + interval;
        }

        match worker.events().recv_timeout(EVENT_POLL) {
            Ok(CameraEvent::PreviewCaptured(frame)) => {
                in_flight = None;
                if !emitter.emit(&frame) {
                    break;
                }
            },
            Ok(CameraEvent::StatusChanged(SessionStatus::Unavailable)) => {
                return Err(CameraError::Unavailable);
            },
            Ok(CameraEvent::StatusChanged(SessionStatus::Unloaded)) => {
                in_flight = None;
                cli::warn_user(&opts.flags, "camera closed after repeated preview failures");
            },
            Ok(CameraEvent::Error { message, .. }) => cli::warn_user(&opts.flags, &message),
            Ok(_) | Err(RecvTimeoutError::Timeout) => {},
            Err(RecvTimeoutError::Disconnected) => return Err(CameraError::Closed),
        }
    }

    worker.stop_viewfinder()?;
    Ok(())
}

/// Writes preview frames to stdout as JSON-LD images.
struct Emitter {
    source: String,
    hasher: Option<Hasher>,
    threshold: u32,
    last_hash: Option<ImageHash>,
}

impl Emitter {
    fn new(source: &str, debounce: u8) -> Self {
        let hasher = (debounce > 0).then(|| {
            HasherConfig::new()
                .hash_alg(HashAlg::Gradient)
                .to_hasher()
        });
        Self {
            source: source.to_owned(),
            hasher,
            threshold: debounce as u32,
            last_hash: None,
        }
    }

    /// Returns `false` once stdout has gone away.
    fn emit(&mut self, frame: &Frame) -> bool {
        if let Some(hasher) = &self.hasher {
            let hash = hasher.hash_image(&frame.image);
            if let Some(prev) = &self.last_hash {
                if hash.dist(prev) < self.threshold {
                    return true;
                }
            }
            self.last_hash = Some(hash);
        }

        let ts_secs = if frame.timestamp_ns != 0 {
            frame.timestamp_ns / 1_000_000_000
        } else {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
        };

        let img = know::classes::Image {
            id: Some(format!("{}#{ts_secs}", self.source)),
            width: Some(frame.width() as _),
            height: Some(frame.height() as _),
            data: frame.image.to_rgb8().into_raw(),
            source: Some(self.source.clone()),
        };

        let Ok(json) = img.to_jsonld() else {
            return true;
        };

        let mut out = io::stdout().lock();
        match writeln!(&mut out, "{json}") {
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => false,
            _ => true,
        }
    }
}

fn parse_assignment(s: &str) -> Result<(String, ParameterValue), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid assignment '{s}'. Use NAME=VALUE (e.g., iso=400)"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Missing option name in '{s}'"));
    }
    let Ok(value) = value.parse::<ParameterValue>();
    Ok((name.to_owned(), value))
}

fn parse_frequency(s: &str) -> Result<f64, String> {
    let freq: f64 = s.parse().map_err(|_| format!("Invalid frequency: {s}"))?;

    if freq <= 0.0 {
        return Err("Frequency must be positive".to_string());
    }
    if freq > 60.0 {
        return Err(format!("Frequency {freq} Hz exceeds reasonable maximum (60 Hz)"));
    }
    if freq < 0.1 {
        return Err(format!("Frequency {freq} Hz is below reasonable minimum (0.1 Hz)"));
    }

    Ok(freq)
}
