// This is free and unencumbered software released into the public domain.

//! An in-process stand-in for libgphoto2.
//!
//! The simulated library is scripted through [`SimState`]: which models and
//! ports exist, which cameras are attached, the widget tree, preview frames,
//! captured stills, queued camera events and injected failures. Every camera
//! call is appended to a journal and every handle is counted while alive, so
//! callers can check call order and handle hygiene.

use crate::shared::{
    AbilitiesList, Backend, Camera, CameraEventType, CameraFile, CameraFilePath, ConfigTree,
    DetectedCamera, FileType, GpResult, GpStatus, PortInfoList, WidgetKind, WidgetValue,
};
use alloc::borrow::Cow;
use core::time::Duration;
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::warn;

/// Library operations that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    NewContext,
    NewAbilitiesList,
    LoadAbilities,
    NewPortInfoList,
    LoadPortInfo,
    Detect,
    /// Reading one entry of a detection result.
    ListEntry,
    NewCamera,
    SetAbilities,
    SetPortInfo,
    NewFile,
    Exit,
    GetConfig,
    SetConfig,
    SetValue,
    CaptureImage,
    CapturePreview,
    FileGet,
    WaitForEvent,
}

/// A journaled camera call.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Exit,
    GetConfig,
    SetValue { name: String, value: WidgetValue },
    SetConfig,
    CaptureImage,
    CapturePreview,
    FileGet { path: CameraFilePath, kind: FileType },
    WaitForEvent { timeout: Duration, event: CameraEventType },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimWidget {
    pub name: String,
    pub kind: WidgetKind,
    pub value: WidgetValue,
    pub choices: Vec<String>,
}

impl SimWidget {
    pub fn new(name: impl Into<String>, kind: WidgetKind, value: WidgetValue) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
            choices: Vec::new(),
        }
    }

    pub fn radio(name: impl Into<String>, value: &str, choices: &[&str]) -> Self {
        Self {
            choices: choices.iter().map(|c| c.to_string()).collect(),
            ..Self::new(name, WidgetKind::Radio, WidgetValue::Text(value.to_owned()))
        }
    }

    pub fn toggle(name: impl Into<String>, on: bool) -> Self {
        Self::new(name, WidgetKind::Toggle, WidgetValue::Int(on as i32))
    }
}

/// Number of library handles currently alive, per kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LiveHandles {
    pub contexts: usize,
    pub abilities_lists: usize,
    pub port_info_lists: usize,
    pub lists: usize,
    pub cameras: usize,
    pub files: usize,
    pub configs: usize,
}

impl LiveHandles {
    pub fn total(&self) -> usize {
        self.contexts
            + self.abilities_lists
            + self.port_info_lists
            + self.lists
            + self.cameras
            + self.files
            + self.configs
    }
}

#[derive(Debug, Default)]
pub struct SimState {
    /// Models in the abilities catalogue.
    pub models: Vec<String>,
    /// Paths in the port-info catalogue.
    pub ports: Vec<String>,
    /// Cameras reported by detection.
    pub attached: Vec<DetectedCamera>,
    pub widgets: Vec<SimWidget>,
    /// Preview frames handed out in order, before falling back to `default_preview`.
    pub previews: VecDeque<Vec<u8>>,
    pub default_preview: Option<Vec<u8>>,
    /// Payload stored for each still capture.
    pub still: Vec<u8>,
    pub storage: HashMap<CameraFilePath, Vec<u8>>,
    /// Events returned by `wait_for_event` before it times out.
    pub events: VecDeque<CameraEventType>,
    pub failures: HashMap<Op, VecDeque<GpStatus>>,
    pub live: LiveHandles,
    pub journal: Vec<Call>,
    pub detections: usize,
    pub captures: usize,
}

impl SimState {
    fn check(&mut self, op: Op) -> GpResult {
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }

    fn record(&mut self, call: Call) {
        self.journal.push(call);
    }
}

type Shared = Arc<Mutex<SimState>>;

fn lock(state: &Shared) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|p| p.into_inner())
}

#[derive(Clone, Debug, Default)]
pub struct SimulatedBackend {
    state: Shared,
}

impl dogma::Named for SimulatedBackend {
    fn name(&self) -> Cow<'_, str> {
        "simulated".into()
    }
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model and a port, and reports the pair as attached.
    pub fn with_camera(self, model: impl Into<String>, port: impl Into<String>) -> Self {
        {
            let mut state = self.state();
            let camera = DetectedCamera::new(model, port);
            if !state.models.contains(&camera.model) {
                state.models.push(camera.model.clone());
            }
            if !state.ports.contains(&camera.port) {
                state.ports.push(camera.port.clone());
            }
            state.attached.push(camera);
        }
        self
    }

    pub fn with_widget(self, widget: SimWidget) -> Self {
        self.state().widgets.push(widget);
        self
    }

    pub fn with_preview(self, data: Vec<u8>) -> Self {
        self.state().default_preview = Some(data);
        self
    }

    pub fn with_still(self, data: Vec<u8>) -> Self {
        self.state().still = data;
        self
    }

    /// Makes the next `times` calls of `op` fail with [`GpStatus::ERROR`].
    pub fn fail(&self, op: Op, times: usize) {
        self.fail_with(op, GpStatus::ERROR, times);
    }

    pub fn fail_with(&self, op: Op, status: GpStatus, times: usize) {
        let mut state = self.state();
        let queue = state.failures.entry(op).or_default();
        queue.extend(core::iter::repeat_n(status, times));
    }

    pub fn state(&self) -> MutexGuard<'_, SimState> {
        lock(&self.state)
    }

    pub fn journal(&self) -> Vec<Call> {
        self.state().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state().journal.clear();
    }

    pub fn live(&self) -> LiveHandles {
        self.state().live
    }

    pub fn widget(&self, name: &str) -> Option<SimWidget> {
        self.state().widgets.iter().find(|w| w.name == name).cloned()
    }
}

impl Backend for SimulatedBackend {
    type Context = SimContext;
    type Abilities = SimAbilities;
    type PortInfo = SimPortInfo;
    type AbilitiesList = SimAbilitiesList;
    type PortInfoList = SimPortInfoList;
    type Camera = SimCamera;
    type File = SimFile;
    type Config = SimConfig;

    fn new_context(&self) -> GpResult<SimContext> {
        let mut state = self.state();
        state.check(Op::NewContext)?;
        state.live.contexts += 1;
        Ok(SimContext {
            state: self.state.clone(),
        })
    }

    fn new_abilities_list(&self) -> GpResult<SimAbilitiesList> {
        let mut state = self.state();
        state.check(Op::NewAbilitiesList)?;
        state.live.abilities_lists += 1;
        Ok(SimAbilitiesList {
            state: self.state.clone(),
            models: Vec::new(),
        })
    }

    fn new_port_info_list(&self) -> GpResult<SimPortInfoList> {
        let mut state = self.state();
        state.check(Op::NewPortInfoList)?;
        state.live.port_info_lists += 1;
        Ok(SimPortInfoList {
            state: self.state.clone(),
            paths: Vec::new(),
        })
    }

    fn new_camera(&self) -> GpResult<SimCamera> {
        let mut state = self.state();
        state.check(Op::NewCamera)?;
        state.live.cameras += 1;
        Ok(SimCamera {
            state: self.state.clone(),
            abilities: None,
            port: None,
        })
    }

    fn new_file(&self) -> GpResult<SimFile> {
        let mut state = self.state();
        state.check(Op::NewFile)?;
        state.live.files += 1;
        Ok(SimFile {
            state: self.state.clone(),
            data: Vec::new(),
        })
    }
}

#[derive(Debug)]
pub struct SimContext {
    state: Shared,
}

impl Drop for SimContext {
    fn drop(&mut self) {
        lock(&self.state).live.contexts -= 1;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimAbilities {
    pub model: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimPortInfo {
    pub path: String,
}

#[derive(Debug)]
pub struct SimAbilitiesList {
    state: Shared,
    models: Vec<String>,
}

impl Drop for SimAbilitiesList {
    fn drop(&mut self) {
        lock(&self.state).live.abilities_lists -= 1;
    }
}

impl AbilitiesList<SimulatedBackend> for SimAbilitiesList {
    fn load(&mut self, _context: &SimContext) -> GpResult {
        let mut state = lock(&self.state);
        state.check(Op::LoadAbilities)?;
        self.models = state.models.clone();
        Ok(())
    }

    fn lookup_model(&self, model: &str) -> GpResult<usize> {
        self.models
            .iter()
            .position(|m| m == model)
            .ok_or(GpStatus::MODEL_NOT_FOUND)
    }

    fn abilities(&self, index: usize) -> GpResult<SimAbilities> {
        self.models
            .get(index)
            .map(|model| SimAbilities {
                model: model.clone(),
            })
            .ok_or(GpStatus::BAD_PARAMETERS)
    }

    fn detect(
        &self,
        ports: &SimPortInfoList,
        _context: &SimContext,
    ) -> GpResult<Vec<DetectedCamera>> {
        let mut state = lock(&self.state);
        state.check(Op::Detect)?;
        state.detections += 1;
        state.live.lists += 1;
        let candidates: Vec<DetectedCamera> = state
            .attached
            .iter()
            .filter(|c| self.models.contains(&c.model) && ports.paths.contains(&c.port))
            .cloned()
            .collect();
        let mut found = Vec::with_capacity(candidates.len());
        for (index, camera) in candidates.into_iter().enumerate() {
            if let Err(status) = state.check(Op::ListEntry) {
                warn!(index, %status, "unable to read detected camera entry");
                continue;
            }
            found.push(camera);
        }
        state.live.lists -= 1;
        Ok(found)
    }
}

#[derive(Debug)]
pub struct SimPortInfoList {
    state: Shared,
    paths: Vec<String>,
}

impl Drop for SimPortInfoList {
    fn drop(&mut self) {
        lock(&self.state).live.port_info_lists -= 1;
    }
}

impl PortInfoList<SimulatedBackend> for SimPortInfoList {
    fn load(&mut self) -> GpResult {
        let mut state = lock(&self.state);
        state.check(Op::LoadPortInfo)?;
        self.paths = state.ports.clone();
        Ok(())
    }

    fn count(&self) -> GpResult<usize> {
        Ok(self.paths.len())
    }

    fn lookup_path(&self, path: &str) -> GpResult<usize> {
        self.paths
            .iter()
            .position(|p| p == path)
            .ok_or(GpStatus::UNKNOWN_PORT)
    }

    fn port_info(&self, index: usize) -> GpResult<SimPortInfo> {
        self.paths
            .get(index)
            .map(|path| SimPortInfo { path: path.clone() })
            .ok_or(GpStatus::BAD_PARAMETERS)
    }
}

#[derive(Debug)]
pub struct SimCamera {
    state: Shared,
    abilities: Option<SimAbilities>,
    port: Option<SimPortInfo>,
}

impl Drop for SimCamera {
    fn drop(&mut self) {
        lock(&self.state).live.cameras -= 1;
    }
}

impl SimCamera {
    pub fn abilities(&self) -> Option<&SimAbilities> {
        self.abilities.as_ref()
    }

    pub fn port(&self) -> Option<&SimPortInfo> {
        self.port.as_ref()
    }

    fn connected(&self) -> GpResult {
        match (&self.abilities, &self.port) {
            (Some(_), Some(_)) => Ok(()),
            _ => Err(GpStatus::UNKNOWN_PORT),
        }
    }
}

impl Camera<SimulatedBackend> for SimCamera {
    fn set_abilities(&mut self, abilities: &SimAbilities) -> GpResult {
        lock(&self.state).check(Op::SetAbilities)?;
        self.abilities = Some(abilities.clone());
        Ok(())
    }

    fn set_port_info(&mut self, port: &SimPortInfo) -> GpResult {
        lock(&self.state).check(Op::SetPortInfo)?;
        self.port = Some(port.clone());
        Ok(())
    }

    fn exit(&mut self, _context: &SimContext) -> GpResult {
        let mut state = lock(&self.state);
        state.record(Call::Exit);
        state.check(Op::Exit)
    }

    fn config(&mut self, _context: &SimContext) -> GpResult<SimConfig> {
        self.connected()?;
        let mut state = lock(&self.state);
        state.record(Call::GetConfig);
        state.check(Op::GetConfig)?;
        state.live.configs += 1;
        Ok(SimConfig {
            state: self.state.clone(),
            widgets: state.widgets.clone(),
        })
    }

    fn set_config(&mut self, config: &SimConfig, _context: &SimContext) -> GpResult {
        self.connected()?;
        let mut state = lock(&self.state);
        state.record(Call::SetConfig);
        state.check(Op::SetConfig)?;
        state.widgets = config.widgets.clone();
        Ok(())
    }

    fn capture_image(&mut self, _context: &SimContext) -> GpResult<CameraFilePath> {
        self.connected()?;
        let mut state = lock(&self.state);
        state.record(Call::CaptureImage);
        state.check(Op::CaptureImage)?;
        state.captures += 1;
        let path = CameraFilePath::new(
            "/store_00010001/DCIM/100CANON",
            format!("IMG_{:04}.JPG", state.captures),
        );
        let still = state.still.clone();
        state.storage.insert(path.clone(), still);
        state.events.push_back(CameraEventType::CaptureComplete);
        Ok(path)
    }

    fn capture_preview(&mut self, file: &mut SimFile, _context: &SimContext) -> GpResult {
        self.connected()?;
        let mut state = lock(&self.state);
        state.record(Call::CapturePreview);
        state.check(Op::CapturePreview)?;
        let frame = match state.previews.pop_front() {
            Some(frame) => frame,
            None => state.default_preview.clone().ok_or(GpStatus::NOT_SUPPORTED)?,
        };
        file.data = frame;
        Ok(())
    }

    fn file_get(
        &mut self,
        path: &CameraFilePath,
        kind: FileType,
        file: &mut SimFile,
        _context: &SimContext,
    ) -> GpResult {
        self.connected()?;
        let mut state = lock(&self.state);
        state.record(Call::FileGet {
            path: path.clone(),
            kind,
        });
        state.check(Op::FileGet)?;
        file.data = state
            .storage
            .get(path)
            .cloned()
            .ok_or(GpStatus::FILE_NOT_FOUND)?;
        Ok(())
    }

    fn wait_for_event(
        &mut self,
        timeout: Duration,
        _context: &SimContext,
    ) -> GpResult<CameraEventType> {
        self.connected()?;
        let mut state = lock(&self.state);
        state.check(Op::WaitForEvent)?;
        let event = state
            .events
            .pop_front()
            .unwrap_or(CameraEventType::Timeout);
        state.record(Call::WaitForEvent { timeout, event });
        Ok(event)
    }
}

#[derive(Debug)]
pub struct SimFile {
    state: Shared,
    data: Vec<u8>,
}

impl Drop for SimFile {
    fn drop(&mut self) {
        lock(&self.state).live.files -= 1;
    }
}

impl CameraFile for SimFile {
    fn clean(&mut self) -> GpResult {
        self.data.clear();
        Ok(())
    }

    fn data(&self) -> GpResult<&[u8]> {
        Ok(&self.data)
    }
}

/// A detached copy of the widget tree; [`Camera::set_config`] writes it back.
#[derive(Debug)]
pub struct SimConfig {
    state: Shared,
    widgets: Vec<SimWidget>,
}

impl Drop for SimConfig {
    fn drop(&mut self) {
        lock(&self.state).live.configs -= 1;
    }
}

impl SimConfig {
    fn widget(&self, node: usize) -> GpResult<&SimWidget> {
        self.widgets.get(node).ok_or(GpStatus::BAD_PARAMETERS)
    }
}

impl ConfigTree for SimConfig {
    type Node = usize;

    fn child_by_name(&self, name: &str) -> GpResult<usize> {
        self.widgets
            .iter()
            .position(|w| w.name == name)
            .ok_or(GpStatus::BAD_PARAMETERS)
    }

    fn kind(&self, node: usize) -> GpResult<WidgetKind> {
        Ok(self.widget(node)?.kind)
    }

    fn value(&self, node: usize) -> GpResult<WidgetValue> {
        let widget = self.widget(node)?;
        match widget.kind {
            WidgetKind::Window | WidgetKind::Section | WidgetKind::Button => {
                Err(GpStatus::NOT_SUPPORTED)
            },
            _ => Ok(widget.value.clone()),
        }
    }

    fn set_value(&mut self, node: usize, value: &WidgetValue) -> GpResult {
        let name = self.widget(node)?.name.clone();
        {
            let mut state = lock(&self.state);
            state.record(Call::SetValue {
                name,
                value: value.clone(),
            });
            state.check(Op::SetValue)?;
        }

        let widget = self
            .widgets
            .get_mut(node)
            .ok_or(GpStatus::BAD_PARAMETERS)?;
        let valid = match (widget.kind, value) {
            (WidgetKind::Radio | WidgetKind::Menu, WidgetValue::Text(v)) => {
                widget.choices.contains(v)
            },
            (WidgetKind::Text, WidgetValue::Text(_)) => true,
            (WidgetKind::Toggle | WidgetKind::Date, WidgetValue::Int(_)) => true,
            _ => false,
        };
        if !valid {
            return Err(GpStatus::BAD_PARAMETERS);
        }
        widget.value = value.clone();
        Ok(())
    }

    fn count_choices(&self, node: usize) -> GpResult<usize> {
        Ok(self.widget(node)?.choices.len())
    }

    fn choice(&self, node: usize, index: usize) -> GpResult<String> {
        self.widget(node)?
            .choices
            .get(index)
            .cloned()
            .ok_or(GpStatus::BAD_PARAMETERS)
    }
}
