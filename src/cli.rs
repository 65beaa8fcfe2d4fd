// This is free and unencumbered software released into the public domain.

//! CLI helpers (error reporting, verbosity handling, camera listing).
//!
//! This module must compile even when the crate feature `cli` is disabled,
//! because the library is built in non-CLI configurations.

use crate::shared::{Backend, Registry};

#[cfg(feature = "cli")]
use crate::shared::CameraError;

#[cfg(feature = "cli")]
use asimov_module::SysexitsError::{self, *};

#[cfg(feature = "cli")]
use clientele::StandardOptions;

/// An attached camera as shown to users.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraInfo {
    pub model: String,
    pub port: String,
    pub is_usb: bool,
}

/// Lists attached cameras, USB-connected ones first, each group sorted by model.
pub fn list_cameras<B: Backend>(registry: &Registry<B>) -> Vec<CameraInfo> {
    let mut cameras: Vec<CameraInfo> = registry
        .cameras()
        .into_iter()
        .map(|c| CameraInfo {
            is_usb: c.port.starts_with("usb:"),
            model: c.model,
            port: c.port,
        })
        .collect();
    cameras.sort_by(|a, b| {
        b.is_usb
            .cmp(&a.is_usb)
            .then_with(|| a.model.cmp(&b.model))
            .then_with(|| a.port.cmp(&b.port))
    });
    cameras
}

#[cfg(feature = "cli")]
pub fn handle_error(err: &CameraError, flags: &StandardOptions) -> SysexitsError {
    #[cfg(feature = "tracing")]
    {
        use asimov_module::tracing::{debug, error};

        error!(target: "asimov_gphoto_module", %err, "camera command failed");

        if flags.debug || flags.verbose >= 2 {
            debug!(target: "asimov_gphoto_module", ?err, "detailed error");
        }
    }

    report_error(err, flags);
    map_error_to_sysexit(err)
}

#[cfg(feature = "cli")]
pub fn info_user(flags: &StandardOptions, msg: &str) {
    if flags.debug || flags.verbose >= 1 {
        eprintln!("INFO: {msg}");
    }

    #[cfg(feature = "tracing")]
    asimov_module::tracing::info!(target: "asimov_gphoto_module", "{msg}");
}

#[cfg(feature = "cli")]
pub fn warn_user(flags: &StandardOptions, msg: &str) {
    if flags.debug || flags.verbose >= 1 {
        eprintln!("WARN: {msg}");
    }

    #[cfg(feature = "tracing")]
    asimov_module::tracing::warn!(target: "asimov_gphoto_module", "{msg}");
}

#[cfg(feature = "cli")]
fn report_error(err: &CameraError, flags: &StandardOptions) {
    use std::error::Error as _;
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "ERROR: {err}");

    if flags.debug || flags.verbose >= 2 {
        let mut source = err.source();
        while let Some(cause) = source {
            let _ = writeln!(stderr, "  Caused by: {}", cause);
            source = cause.source();
        }
    }
}

#[cfg(feature = "cli")]
pub fn map_error_to_sysexit(err: &CameraError) -> SysexitsError {
    match err {
        CameraError::NoCamera => EX_UNAVAILABLE,
        CameraError::UnknownModel(_) | CameraError::UnknownPort(_) => EX_UNAVAILABLE,
        CameraError::Unavailable => EX_UNAVAILABLE,
        CameraError::Closed => EX_SOFTWARE,
        CameraError::InvalidConfig(_) => EX_USAGE,
        CameraError::Unsupported(_) => EX_UNAVAILABLE,
        CameraError::Library { .. } => EX_IOERR,
        CameraError::DriverError { .. } => EX_SOFTWARE,
        CameraError::Other(_) => EX_SOFTWARE,
    }
}

// When `cli` is disabled, keep the module linkable without exposing CLI-only types.
#[cfg(not(feature = "cli"))]
#[inline]
pub fn info_user(_msg: &str) {}

#[cfg(not(feature = "cli"))]
#[inline]
pub fn warn_user(_msg: &str) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::backends::simulated::SimulatedBackend;

    #[test]
    fn usb_cameras_are_listed_first() {
        let backend = SimulatedBackend::new()
            .with_camera("Nikon DSC D750", "ptpip:192.168.1.20")
            .with_camera("Canon EOS 5D", "usb:001,004")
            .with_camera("Canon EOS 80D", "usb:001,007");
        let registry = Registry::new(backend);

        let cameras = list_cameras(&registry);
        let models: Vec<_> = cameras.iter().map(|c| c.model.as_str()).collect();
        assert_eq!(models, ["Canon EOS 5D", "Canon EOS 80D", "Nikon DSC D750"]);
        assert!(cameras[0].is_usb);
        assert!(!cameras[2].is_usb);
    }

    #[cfg(feature = "cli")]
    #[test]
    fn errors_map_to_sysexits() {
        assert!(matches!(
            map_error_to_sysexit(&CameraError::NoCamera),
            EX_UNAVAILABLE
        ));
        assert!(matches!(
            map_error_to_sysexit(&CameraError::invalid_config("bad --set")),
            EX_USAGE
        ));
    }
}
