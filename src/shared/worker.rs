// This is free and unencumbered software released into the public domain.

use crate::shared::{
    Backend, CameraError, CameraEvent, ParameterInfo, ParameterValue, PortBinding, Session,
    SessionConfig,
};
use core::{fmt, ops::ControlFlow};
use std::{
    sync::mpsc::{Receiver, Sender, SyncSender, channel, sync_channel},
    thread::{self, JoinHandle},
};
use tracing::{debug, trace};

/// A request to the worker thread.
#[derive(Debug)]
pub enum Command {
    Open,
    Close,
    CapturePreview,
    CapturePhoto {
        id: i32,
        file_name: String,
    },
    StopViewfinder,
    GetParameter {
        name: String,
        reply: SyncSender<Option<ParameterValue>>,
    },
    SetParameter {
        name: String,
        value: ParameterValue,
        reply: SyncSender<bool>,
    },
    DescribeParameter {
        name: String,
        reply: SyncSender<Option<ParameterInfo>>,
    },
    Shutdown,
}

/// Handle to a camera session running on its own thread.
///
/// Commands are executed in submission order, one at a time; notifications
/// arrive on [`Worker::events`] in the order they were produced. Dropping the
/// worker closes the camera and joins the thread.
pub struct Worker {
    name: String,
    commands: Sender<Command>,
    events: Receiver<CameraEvent>,
    join: Option<JoinHandle<()>>,
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("running", &self.join.is_some())
            .finish_non_exhaustive()
    }
}

impl Worker {
    /// Starts a worker thread for the camera described by `abilities` and `port`.
    pub fn spawn<B: Backend>(
        backend: B,
        abilities: B::Abilities,
        port: PortBinding<B>,
        config: SessionConfig,
    ) -> Result<Self, CameraError> {
        let name = format!("gphoto-{}", backend.name());
        let (commands, inbox) = channel::<Command>();
        let (outbox, events) = channel::<CameraEvent>();

        let join = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let mut session = Session::new(backend, abilities, port, config, outbox);
                debug!(status = %session.status(), "camera worker started");
                while let Ok(command) = inbox.recv() {
                    trace!(?command, "camera command");
                    if dispatch(&mut session, command).is_break() {
                        break;
                    }
                }
                drop(session);
                debug!("camera worker stopped");
            })
            .map_err(|e| CameraError::driver("spawning camera worker", e))?;

        Ok(Self {
            name,
            commands,
            events,
            join: Some(join),
        })
    }

    /// Notifications from the session.
    pub fn events(&self) -> &Receiver<CameraEvent> {
        &self.events
    }

    fn send(&self, command: Command) -> Result<(), CameraError> {
        self.commands.send(command).map_err(|_| CameraError::Closed)
    }

    fn request<T>(
        &self,
        command: impl FnOnce(SyncSender<T>) -> Command,
    ) -> Result<T, CameraError> {
        let (reply, response) = sync_channel(1);
        self.send(command(reply))?;
        response.recv().map_err(|_| CameraError::Closed)
    }

    pub fn open(&self) -> Result<(), CameraError> {
        self.send(Command::Open)
    }

    pub fn close(&self) -> Result<(), CameraError> {
        self.send(Command::Close)
    }

    pub fn capture_preview(&self) -> Result<(), CameraError> {
        self.send(Command::CapturePreview)
    }

    pub fn capture_photo(&self, id: i32, file_name: impl Into<String>) -> Result<(), CameraError> {
        self.send(Command::CapturePhoto {
            id,
            file_name: file_name.into(),
        })
    }

    pub fn stop_viewfinder(&self) -> Result<(), CameraError> {
        self.send(Command::StopViewfinder)
    }

    /// Reads an option, waiting for the worker to answer.
    pub fn parameter(
        &self,
        name: impl Into<String>,
    ) -> Result<Option<ParameterValue>, CameraError> {
        let name = name.into();
        self.request(|reply| Command::GetParameter { name, reply })
    }

    /// Writes an option, waiting for the worker to answer.
    pub fn set_parameter(
        &self,
        name: impl Into<String>,
        value: impl Into<ParameterValue>,
    ) -> Result<bool, CameraError> {
        let (name, value) = (name.into(), value.into());
        self.request(|reply| Command::SetParameter { name, value, reply })
    }

    pub fn describe_parameter(
        &self,
        name: impl Into<String>,
    ) -> Result<Option<ParameterInfo>, CameraError> {
        let name = name.into();
        self.request(|reply| Command::DescribeParameter { name, reply })
    }

    /// Closes the camera and waits for the worker thread to exit.
    pub fn shutdown(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn dispatch<B: Backend>(session: &mut Session<B>, command: Command) -> ControlFlow<()> {
    match command {
        Command::Open => session.open(),
        Command::Close => session.close(),
        Command::CapturePreview => session.capture_preview(),
        Command::CapturePhoto { id, file_name } => session.capture_photo(id, &file_name),
        Command::StopViewfinder => session.stop_viewfinder(),
        Command::GetParameter { name, reply } => {
            let _ = reply.send(session.parameter(&name));
        },
        Command::SetParameter { name, value, reply } => {
            let _ = reply.send(session.set_parameter(&name, value));
        },
        Command::DescribeParameter { name, reply } => {
            let _ = reply.send(session.describe_parameter(&name));
        },
        Command::Shutdown => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}
