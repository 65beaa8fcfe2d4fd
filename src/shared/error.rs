// This is free and unencumbered software released into the public domain.

use derive_more::Display;
use std::error::Error as StdError;
use thiserror::Error;

pub type GpResult<T = ()> = core::result::Result<T, GpStatus>;

/// A libgphoto2 return code. Negative codes are errors.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
#[display("gphoto2 status {}", _0)]
pub struct GpStatus(pub i32);

impl core::error::Error for GpStatus {}

impl Default for GpStatus {
    fn default() -> Self {
        GpStatus::OK
    }
}

impl GpStatus {
    pub const OK: Self = Self(0);
    pub const ERROR: Self = Self(-1);
    pub const BAD_PARAMETERS: Self = Self(-2);
    pub const NO_MEMORY: Self = Self(-3);
    pub const LIBRARY: Self = Self(-4);
    pub const UNKNOWN_PORT: Self = Self(-5);
    pub const NOT_SUPPORTED: Self = Self(-6);
    pub const IO: Self = Self(-7);
    pub const TIMEOUT: Self = Self(-10);
    pub const MODEL_NOT_FOUND: Self = Self(-105);
    pub const FILE_NOT_FOUND: Self = Self(-108);
    pub const CAMERA_BUSY: Self = Self(-110);

    /// Splits a raw return code into its non-negative payload or an error.
    #[inline]
    pub fn check(code: i32) -> GpResult<i32> {
        if code < 0 { Err(Self(code)) } else { Ok(code) }
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        self.0 >= 0
    }
}

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("no camera device available")]
    NoCamera,

    #[error("no abilities known for camera model `{0}`")]
    UnknownModel(String),

    #[error("no port known for path `{0}`")]
    UnknownPort(String),

    #[error("camera is unavailable")]
    Unavailable,

    #[error("camera session closed")]
    Closed,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("gphoto2 error while {context}")]
    Library {
        context: &'static str,
        #[source]
        source: GpStatus,
    },

    #[error("driver error while {context}")]
    DriverError {
        context: &'static str,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("{0}")]
    Other(String),
}

impl CameraError {
    #[inline]
    pub fn library(context: &'static str, status: GpStatus) -> Self {
        Self::Library {
            context,
            source: status,
        }
    }

    #[inline]
    pub fn driver(context: &'static str, source: impl StdError + Send + Sync + 'static) -> Self {
        Self::DriverError {
            context,
            source: Box::new(source),
        }
    }

    #[inline]
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    #[inline]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    #[inline]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// The library status behind this error, if any.
    pub fn status(&self) -> Option<GpStatus> {
        match self {
            Self::Library { source, .. } => Some(*source),
            _ => None,
        }
    }
}
