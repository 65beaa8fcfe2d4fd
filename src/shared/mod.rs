// This is free and unencumbered software released into the public domain.

mod backend;
pub use backend::*;

pub mod backends {
    pub mod simulated;

    cfg_if::cfg_if! {
        if #[cfg(all(feature = "gphoto2", unix))] {
            pub mod gphoto2;
        }
    }
}

mod config;
pub use config::*;

mod error;
pub use error::*;

mod event;
pub use event::*;

mod frame;
pub use frame::*;

mod open;
pub use open::*;

pub mod parameter;
pub use parameter::{ParameterInfo, ParameterValue, ValueKind};

mod registry;
pub use registry::*;

mod session;
pub use session::*;

mod worker;
pub use worker::*;
