// This is free and unencumbered software released into the public domain.

//! Tethered camera control over libgphoto2.
//!
//! [`shared::Registry`] enumerates attached cameras and resolves their
//! abilities and ports; [`shared::Worker`] drives one camera session on a
//! dedicated thread and reports back through [`shared::CameraEvent`]s.

extern crate alloc;

pub mod cli;
pub mod shared;
