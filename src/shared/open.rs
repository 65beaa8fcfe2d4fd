// This is free and unencumbered software released into the public domain.

use super::{Backend, CameraError, Registry, SessionConfig, Worker};
use tracing::debug;

/// Starts a worker for `device`, or for the default camera if `device` is empty.
///
/// The camera itself is opened lazily by the worker's first command.
pub fn open_camera<B: Backend>(
    registry: &Registry<B>,
    device: impl AsRef<str>,
    config: SessionConfig,
) -> Result<Worker, CameraError> {
    let device = match device.as_ref() {
        "" => registry.default_device(),
        device => device.to_owned(),
    };
    if device.is_empty() {
        return Err(CameraError::NoCamera);
    }

    let description = registry.description_for(&device);
    if description.is_empty() {
        return Err(CameraError::NoCamera);
    }

    let abilities = registry
        .abilities_for(&device)
        .ok_or_else(|| CameraError::UnknownModel(device.clone()))?;
    let port = registry
        .port_info_for(&description)
        .ok_or_else(|| CameraError::UnknownPort(description.clone()))?;

    debug!(model = %device, port = %description, "opening camera");
    Worker::spawn(registry.backend().clone(), abilities, port, config)
}
