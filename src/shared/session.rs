// This is free and unencumbered software released into the public domain.

//! The per-camera state machine.
//!
//! A [`Session`] is owned by exactly one thread. Every operation runs to
//! completion and reports its outcome through [`CameraEvent`]s, in order.

use crate::shared::{
    Backend, Camera, CameraEvent, CameraEventType, CameraFile, CaptureErrorKind, ErrorKind,
    FileType, Frame, GpResult, ParameterInfo, ParameterValue, PortBinding, SessionConfig,
    SessionStatus, parameter,
};
use bytes::Bytes;
use core::time::Duration;
use std::sync::mpsc::Sender;
use tracing::{debug, trace, warn};

const VIEWFINDER: &str = "viewfinder";
const AUTOFOCUS_DRIVE: &str = "autofocusedrive";

/// An open camera and its reusable preview buffer.
///
/// The preview buffer is released before the camera.
struct Device<B: Backend> {
    preview: B::File,
    camera: B::Camera,
}

pub struct Session<B: Backend> {
    backend: B,
    config: SessionConfig,
    abilities: B::Abilities,
    events: Sender<CameraEvent>,
    status: SessionStatus,
    preview_failures: u32,
    unavailable_reported: bool,
    // The device must be released before the context and the port it uses.
    device: Option<Device<B>>,
    context: Option<B::Context>,
    #[allow(dead_code)]
    port: PortBinding<B>,
}

impl<B: Backend> Session<B> {
    /// Creates a closed session for the given camera.
    ///
    /// If no library context can be created the session is `Unavailable`
    /// and never opens.
    pub fn new(
        backend: B,
        abilities: B::Abilities,
        port: PortBinding<B>,
        config: SessionConfig,
        events: Sender<CameraEvent>,
    ) -> Self {
        let context = backend
            .new_context()
            .map_err(|status| warn!(%status, "unable to create gphoto context"))
            .ok();
        let status = match context {
            Some(_) => SessionStatus::Unloaded,
            None => SessionStatus::Unavailable,
        };
        Self {
            backend,
            config,
            abilities,
            events,
            status,
            preview_failures: 0,
            unavailable_reported: false,
            device: None,
            context,
            port,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    fn emit(&self, event: CameraEvent) {
        let _ = self.events.send(event);
    }

    fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
        self.emit(CameraEvent::StatusChanged(status));
    }

    fn error(&self, message: &str) {
        self.emit(CameraEvent::Error {
            kind: ErrorKind::Camera,
            message: message.to_owned(),
        });
    }

    fn capture_error(&self, id: i32, reason: CaptureErrorKind, message: &str) {
        self.emit(CameraEvent::ImageCaptureError {
            id,
            reason,
            message: message.to_owned(),
        });
    }

    fn connect(&self) -> GpResult<Device<B>> {
        let mut camera = self.backend.new_camera()?;
        camera.set_abilities(&self.abilities)?;
        camera.set_port_info(self.port.info())?;
        let preview = self.backend.new_file()?;
        Ok(Device { preview, camera })
    }

    /// Opens the camera and raises its mirror for live view.
    ///
    /// An `Unavailable` session reports itself once, on the first attempt.
    pub fn open(&mut self) {
        if self.device.is_some() {
            return;
        }
        if self.status == SessionStatus::Unavailable {
            if !self.unavailable_reported {
                self.report_unavailable();
            }
            return;
        }

        self.set_status(SessionStatus::Loading);

        match self.connect() {
            Ok(device) => self.device = Some(device),
            Err(status) => {
                warn!(%status, "unable to open camera");
                self.report_unavailable();
                return;
            },
        }

        if self.parameter(VIEWFINDER).is_some()
            && !self.set_parameter(VIEWFINDER, ParameterValue::Bool(true))
        {
            warn!("failed to flap up camera mirror");
        }

        self.preview_failures = 0;
        self.set_status(SessionStatus::Loaded);
    }

    fn report_unavailable(&mut self) {
        self.unavailable_reported = true;
        self.set_status(SessionStatus::Unavailable);
        self.error("Unable to open camera");
    }

    /// Releases the camera. On failure the handle is kept and the session
    /// stays `Loaded`.
    pub fn close(&mut self) {
        if self.device.is_none() {
            return;
        }

        self.set_status(SessionStatus::Unloading);

        let (Some(device), Some(context)) = (self.device.as_mut(), self.context.as_ref()) else {
            return;
        };
        if let Err(status) = device.camera.exit(context) {
            warn!(%status, "unable to close camera");
            self.set_status(SessionStatus::Loaded);
            self.error("Unable to close camera");
            return;
        }

        self.device = None;
        self.preview_failures = 0;
        self.set_status(SessionStatus::Unloaded);
    }

    /// Leaves live view without closing the camera.
    pub fn stop_viewfinder(&mut self) {
        if !matches!(self.status, SessionStatus::Active | SessionStatus::Starting) {
            return;
        }
        self.set_status(SessionStatus::Stopping);
        self.set_status(SessionStatus::Loaded);
    }

    fn grab_preview(&mut self) -> Option<Frame> {
        let context = self.context.as_ref()?;
        let device = self.device.as_mut()?;

        if let Err(status) = device.preview.clean() {
            warn!(%status, "unable to clean preview buffer");
            return None;
        }
        if let Err(status) = device.camera.capture_preview(&mut device.preview, context) {
            warn!(%status, "failed to capture preview");
            return None;
        }
        let data = match device.preview.data() {
            Ok(data) => data,
            Err(status) => {
                warn!(%status, "failed to get preview data");
                return None;
            },
        };
        Frame::decode_preview(data)
            .map_err(|err| warn!(%err, "failed to decode preview"))
            .ok()
    }

    /// Captures one live-view frame, opening the camera if needed.
    ///
    /// After too many consecutive failures the camera is closed.
    pub fn capture_preview(&mut self) {
        self.open();
        if self.device.is_none() {
            return;
        }

        if self.status != SessionStatus::Active {
            self.set_status(SessionStatus::Starting);
        }

        match self.grab_preview() {
            Some(frame) => {
                self.preview_failures = 0;
                if self.status != SessionStatus::Active {
                    self.set_status(SessionStatus::Active);
                }
                self.emit(CameraEvent::PreviewCaptured(frame));
            },
            None => {
                self.preview_failures += 1;
                debug!(failures = self.preview_failures, "preview capture failed");
                if self.preview_failures >= self.config.preview_fail_limit {
                    warn!("too many preview failures, closing camera");
                    self.preview_failures = 0;
                    self.close();
                }
            },
        }
    }

    /// Captures a still image and downloads it.
    pub fn capture_photo(&mut self, id: i32, file_name: &str) {
        if self.device.is_none() || self.context.is_none() {
            self.capture_error(id, CaptureErrorKind::NotReady, "Camera is not ready");
            return;
        }

        let viewfinder = self.parameter(VIEWFINDER).is_some();
        if viewfinder {
            if !self.set_parameter(VIEWFINDER, ParameterValue::Bool(false)) {
                warn!("failed to flap down camera mirror");
            }
        } else if self.parameter(AUTOFOCUS_DRIVE).is_some()
            && !self.set_parameter(AUTOFOCUS_DRIVE, ParameterValue::Bool(true))
        {
            warn!("failed to trigger autofocus");
        }

        self.take_still(id, file_name);

        if viewfinder && !self.set_parameter(VIEWFINDER, ParameterValue::Bool(true)) {
            warn!("failed to flap up camera mirror");
        }
    }

    fn take_still(&mut self, id: i32, file_name: &str) {
        let (Some(device), Some(context)) = (self.device.as_mut(), self.context.as_ref()) else {
            return;
        };

        let path = match device.camera.capture_image(context) {
            Ok(path) => path,
            Err(status) => {
                warn!(%status, "failed to capture frame");
                self.capture_error(id, CaptureErrorKind::Resource, "Failed to capture frame");
                return;
            },
        };
        debug!(folder = %path.folder, name = %path.name, "captured image");

        let downloaded = self.backend.new_file().and_then(|mut file| {
            device
                .camera
                .file_get(&path, FileType::Normal, &mut file, context)?;
            Ok(Bytes::copy_from_slice(file.data()?))
        });

        match downloaded {
            Ok(data) => self.emit(CameraEvent::ImageCaptured {
                id,
                data,
                file_name: file_name.to_owned(),
            }),
            Err(status) => {
                warn!(%status, "failed to download file from camera");
                self.capture_error(
                    id,
                    CaptureErrorKind::Resource,
                    "Failed to download file from camera",
                );
            },
        }

        self.drain_events(self.config.capture_event_timeout, false);
    }

    /// Consumes pending camera events until the camera goes quiet.
    ///
    /// A `quiet` drain swallows whatever the camera reports.
    fn drain_events(&mut self, timeout: Duration, quiet: bool) {
        let (Some(device), Some(context)) = (self.device.as_mut(), self.context.as_ref()) else {
            return;
        };

        loop {
            match device.camera.wait_for_event(timeout, context) {
                Ok(CameraEventType::Timeout) => break,
                Ok(CameraEventType::CaptureComplete | CameraEventType::Unknown) => {},
                Ok(event) if quiet => trace!(?event, "camera event while settling"),
                Ok(event) => warn!(?event, "unexpected event received from camera"),
                Err(status) => {
                    warn!(%status, "failed to wait for camera event");
                    break;
                },
            }
        }
    }

    /// Reads a radio or toggle option; `None` if closed or unreadable.
    pub fn parameter(&mut self, name: &str) -> Option<ParameterValue> {
        let context = self.context.as_ref()?;
        let device = self.device.as_mut()?;
        parameter::read::<B>(&mut device.camera, context, name)
    }

    /// Writes an option and lets the camera settle.
    pub fn set_parameter(&mut self, name: &str, value: ParameterValue) -> bool {
        let (Some(device), Some(context)) = (self.device.as_mut(), self.context.as_ref()) else {
            return false;
        };

        let tolerance = self.config.real_match_tolerance;
        if !parameter::write::<B>(&mut device.camera, context, name, &value, tolerance) {
            return false;
        }

        self.drain_events(self.config.settle_event_timeout, true);
        true
    }

    /// Reads an option together with its choices.
    pub fn describe_parameter(&mut self, name: &str) -> Option<ParameterInfo> {
        let context = self.context.as_ref()?;
        let device = self.device.as_mut()?;
        parameter::describe::<B>(&mut device.camera, context, name)
    }
}

impl<B: Backend> Drop for Session<B> {
    fn drop(&mut self) {
        self.close();
    }
}
