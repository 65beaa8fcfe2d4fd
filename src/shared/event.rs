// This is free and unencumbered software released into the public domain.

use crate::shared::Frame;
use bytes::Bytes;
use derive_more::Display;

/// Lifecycle of a camera session.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Unloaded,
    Loading,
    Loaded,
    Starting,
    Active,
    Stopping,
    Unloading,
    Unavailable,
}

impl SessionStatus {
    /// Whether a session in this status holds a camera handle.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            Self::Loaded | Self::Starting | Self::Active | Self::Stopping
        )
    }
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum ErrorKind {
    Camera,
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum CaptureErrorKind {
    NotReady,
    Resource,
}

/// Notifications emitted by a camera session, in command order.
#[derive(Clone, Debug, PartialEq)]
pub enum CameraEvent {
    StatusChanged(SessionStatus),
    PreviewCaptured(Frame),
    ImageCaptured {
        id: i32,
        data: Bytes,
        file_name: String,
    },
    ImageCaptureError {
        id: i32,
        reason: CaptureErrorKind,
        message: String,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}
