// This is free and unencumbered software released into the public domain.

#[cfg(not(feature = "std"))]
compile_error!("asimov-gphoto-cataloger requires the 'std' feature");

#[cfg(not(unix))]
compile_error!("asimov-gphoto-cataloger requires a unix target");

use asimov_gphoto_module::{
    cli,
    shared::{CameraError, Registry, backends::gphoto2::Gphoto2Backend},
};
use asimov_module::SysexitsError::{self, *};
use clap::Parser;
use clientele::StandardOptions;
use serde_json::json;
use std::error::Error as StdError;

#[derive(Debug, Parser)]
struct Options {
    #[clap(flatten)]
    flags: StandardOptions,

    #[arg(
        value_name = "FORMAT",
        short = 'o',
        long = "output",
        value_enum,
        default_value = "text"
    )]
    output: OutputFormat,
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Jsonl,
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

    let exit_code = match run_cataloger(&options) {
        Ok(()) => EX_OK,
        Err(err) => cli::handle_error(&err, &options.flags),
    };

    Ok(exit_code)
}

fn run_cataloger(options: &Options) -> Result<(), CameraError> {
    cli::info_user(&options.flags, "detecting cameras");

    let registry = Registry::new(Gphoto2Backend);
    if !registry.is_ready() {
        return Err(CameraError::Unavailable);
    }

    let cameras = cli::list_cameras(&registry);
    if cameras.is_empty() {
        cli::warn_user(&options.flags, "no cameras found");
        return Ok(());
    }

    for camera in cameras {
        match options.output {
            OutputFormat::Text => {
                if camera.is_usb {
                    println!("{}: {} [usb]", camera.model, camera.port);
                } else {
                    println!("{}: {}", camera.model, camera.port);
                }
            },
            OutputFormat::Jsonl => {
                println!(
                    "{}",
                    json!({ "model": camera.model, "port": camera.port, "usb": camera.is_usb })
                );
            },
        }
    }

    Ok(())
}
