// This is free and unencumbered software released into the public domain.

//! The seam between the session logic and the camera library.
//!
//! Every handle type is an owner: dropping it releases the underlying library
//! object exactly once. Widget nodes are the exception; they are borrowed from
//! their [`ConfigTree`] root and released together with it.

use crate::shared::GpResult;
use core::{fmt::Debug, time::Duration};

/// Node kinds of the library's configuration widget tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Window,
    Section,
    Text,
    Range,
    Toggle,
    Radio,
    Menu,
    Button,
    Date,
}

/// A widget value in the representation the library stores it in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WidgetValue {
    /// Text, radio and menu widgets.
    Text(String),
    /// Toggle and date widgets.
    Int(i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CameraEventType {
    Unknown,
    Timeout,
    FileAdded,
    FolderAdded,
    CaptureComplete,
    FileChanged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileType {
    Preview,
    Normal,
    Raw,
}

/// Location of a captured file on the camera's storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CameraFilePath {
    pub folder: String,
    pub name: String,
}

impl CameraFilePath {
    pub fn new(folder: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            name: name.into(),
        }
    }
}

/// A `(model, port)` pair reported by camera detection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DetectedCamera {
    pub model: String,
    pub port: String,
}

impl DetectedCamera {
    pub fn new(model: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            port: port.into(),
        }
    }
}

/// Entry point into a camera library: allocates its top-level handles.
pub trait Backend: dogma::Named + Clone + Send + Sync + 'static {
    type Context: Send + Sync + 'static;
    type Abilities: Clone + Debug + Send + Sync + 'static;
    type PortInfo: Clone + Debug + Send + Sync + 'static;
    type AbilitiesList: AbilitiesList<Self> + Send + Sync + 'static;
    type PortInfoList: PortInfoList<Self> + Send + Sync + 'static;
    type Camera: Camera<Self>;
    type File: CameraFile;
    type Config: ConfigTree;

    fn new_context(&self) -> GpResult<Self::Context>;
    fn new_abilities_list(&self) -> GpResult<Self::AbilitiesList>;
    fn new_port_info_list(&self) -> GpResult<Self::PortInfoList>;
    fn new_camera(&self) -> GpResult<Self::Camera>;
    fn new_file(&self) -> GpResult<Self::File>;
}

/// The library's catalogue of supported camera models.
pub trait AbilitiesList<B: Backend + ?Sized> {
    /// Populates the catalogue from the library's built-in driver table.
    fn load(&mut self, context: &B::Context) -> GpResult;
    fn lookup_model(&self, model: &str) -> GpResult<usize>;
    fn abilities(&self, index: usize) -> GpResult<B::Abilities>;
    /// Walks models against ports and reports the cameras currently attached.
    fn detect(&self, ports: &B::PortInfoList, context: &B::Context)
    -> GpResult<Vec<DetectedCamera>>;
}

/// The library's catalogue of I/O ports.
pub trait PortInfoList<B: Backend + ?Sized> {
    /// Scans the ports available on this machine.
    fn load(&mut self) -> GpResult;
    fn count(&self) -> GpResult<usize>;
    fn lookup_path(&self, path: &str) -> GpResult<usize>;
    fn port_info(&self, index: usize) -> GpResult<B::PortInfo>;
}

pub trait Camera<B: Backend + ?Sized> {
    fn set_abilities(&mut self, abilities: &B::Abilities) -> GpResult;
    fn set_port_info(&mut self, port: &B::PortInfo) -> GpResult;
    fn exit(&mut self, context: &B::Context) -> GpResult;
    fn config(&mut self, context: &B::Context) -> GpResult<B::Config>;
    fn set_config(&mut self, config: &B::Config, context: &B::Context) -> GpResult;
    fn capture_image(&mut self, context: &B::Context) -> GpResult<CameraFilePath>;
    fn capture_preview(&mut self, file: &mut B::File, context: &B::Context) -> GpResult;
    fn file_get(
        &mut self,
        path: &CameraFilePath,
        kind: FileType,
        file: &mut B::File,
        context: &B::Context,
    ) -> GpResult;
    fn wait_for_event(
        &mut self,
        timeout: Duration,
        context: &B::Context,
    ) -> GpResult<CameraEventType>;
}

/// An in-memory file buffer.
pub trait CameraFile {
    fn clean(&mut self) -> GpResult;
    /// The buffered bytes, borrowed from the library.
    fn data(&self) -> GpResult<&[u8]>;
}

/// A configuration widget tree, owned through its root.
pub trait ConfigTree {
    /// A child widget, valid while the root is alive.
    type Node: Copy;

    fn child_by_name(&self, name: &str) -> GpResult<Self::Node>;
    fn kind(&self, node: Self::Node) -> GpResult<WidgetKind>;
    fn value(&self, node: Self::Node) -> GpResult<WidgetValue>;
    fn set_value(&mut self, node: Self::Node, value: &WidgetValue) -> GpResult;
    fn count_choices(&self, node: Self::Node) -> GpResult<usize>;
    fn choice(&self, node: Self::Node, index: usize) -> GpResult<String>;

    /// All choices of a radio or menu widget; unreadable entries are skipped.
    fn choices(&self, node: Self::Node) -> GpResult<Vec<String>> {
        let count = self.count_choices(node)?;
        Ok((0..count)
            .filter_map(|index| self.choice(node, index).ok())
            .collect())
    }
}
