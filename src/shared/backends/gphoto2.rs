// This is free and unencumbered software released into the public domain.

//! The libgphoto2 backend.
//!
//! Each wrapper owns one library handle and releases it on drop. Widget
//! nodes are borrowed pointers into their root window; only the root is
//! freed.

mod ffi;

use crate::shared::{
    AbilitiesList, Backend, Camera, CameraEventType, CameraFile, CameraFilePath, ConfigTree,
    DetectedCamera, FileType, GpResult, GpStatus, PortInfoList, WidgetKind, WidgetValue,
};
use alloc::{borrow::Cow, ffi::CString};
use core::{
    ffi::{CStr, c_char, c_int, c_ulong, c_void},
    fmt,
    mem::zeroed,
    ptr::{null, null_mut},
    time::Duration,
};
use scopeguard::defer;
use tracing::warn;

#[inline]
fn check(code: c_int) -> GpResult<i32> {
    GpStatus::check(code)
}

fn c_string(s: &str) -> GpResult<CString> {
    CString::new(s).map_err(|_| GpStatus::BAD_PARAMETERS)
}

/// Copies a possibly-null C string; invalid UTF-8 is replaced.
unsafe fn string_from(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

fn string_from_array(chars: &[c_char]) -> String {
    let bytes: Vec<u8> = chars
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[derive(Clone, Debug, Default)]
pub struct Gphoto2Backend;

impl dogma::Named for Gphoto2Backend {
    fn name(&self) -> Cow<'_, str> {
        "gphoto2".into()
    }
}

impl Backend for Gphoto2Backend {
    type Context = GpContext;
    type Abilities = GpAbilities;
    type PortInfo = GpPortInfo;
    type AbilitiesList = GpAbilitiesList;
    type PortInfoList = GpPortInfoList;
    type Camera = GpCamera;
    type File = GpFile;
    type Config = GpConfig;

    fn new_context(&self) -> GpResult<GpContext> {
        let context = unsafe { ffi::gp_context_new() };
        if context.is_null() {
            return Err(GpStatus::NO_MEMORY);
        }
        Ok(GpContext(context))
    }

    fn new_abilities_list(&self) -> GpResult<GpAbilitiesList> {
        let mut list = null_mut();
        check(unsafe { ffi::gp_abilities_list_new(&mut list) })?;
        Ok(GpAbilitiesList(list))
    }

    fn new_port_info_list(&self) -> GpResult<GpPortInfoList> {
        let mut list = null_mut();
        check(unsafe { ffi::gp_port_info_list_new(&mut list) })?;
        Ok(GpPortInfoList(list))
    }

    fn new_camera(&self) -> GpResult<GpCamera> {
        let mut camera = null_mut();
        check(unsafe { ffi::gp_camera_new(&mut camera) })?;
        Ok(GpCamera(camera))
    }

    fn new_file(&self) -> GpResult<GpFile> {
        let mut file = null_mut();
        check(unsafe { ffi::gp_file_new(&mut file) })?;
        Ok(GpFile(file))
    }
}

pub struct GpContext(*mut ffi::GPContext);

// The registry context is only used under the detection lock.
unsafe impl Send for GpContext {}
unsafe impl Sync for GpContext {}

impl Drop for GpContext {
    fn drop(&mut self) {
        unsafe { ffi::gp_context_unref(self.0) };
    }
}

#[derive(Clone, Copy)]
pub struct GpAbilities(ffi::CameraAbilities);

impl GpAbilities {
    pub fn model(&self) -> String {
        string_from_array(&self.0.model)
    }

    pub fn library(&self) -> String {
        string_from_array(&self.0.library)
    }
}

impl fmt::Debug for GpAbilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpAbilities")
            .field("model", &self.model())
            .field("library", &self.library())
            .finish_non_exhaustive()
    }
}

/// A port record, borrowed from its [`GpPortInfoList`].
#[derive(Clone, Copy, Debug)]
pub struct GpPortInfo(ffi::GPPortInfo);

unsafe impl Send for GpPortInfo {}
unsafe impl Sync for GpPortInfo {}

pub struct GpAbilitiesList(*mut ffi::CameraAbilitiesList);

unsafe impl Send for GpAbilitiesList {}
unsafe impl Sync for GpAbilitiesList {}

impl Drop for GpAbilitiesList {
    fn drop(&mut self) {
        unsafe { ffi::gp_abilities_list_free(self.0) };
    }
}

impl AbilitiesList<Gphoto2Backend> for GpAbilitiesList {
    fn load(&mut self, context: &GpContext) -> GpResult {
        check(unsafe { ffi::gp_abilities_list_load(self.0, context.0) })?;
        Ok(())
    }

    fn lookup_model(&self, model: &str) -> GpResult<usize> {
        let model = c_string(model)?;
        let index = check(unsafe { ffi::gp_abilities_list_lookup_model(self.0, model.as_ptr()) })?;
        Ok(index as usize)
    }

    fn abilities(&self, index: usize) -> GpResult<GpAbilities> {
        unsafe {
            let mut abilities: ffi::CameraAbilities = zeroed();
            check(ffi::gp_abilities_list_get_abilities(
                self.0,
                index as c_int,
                &mut abilities,
            ))?;
            Ok(GpAbilities(abilities))
        }
    }

    fn detect(
        &self,
        ports: &GpPortInfoList,
        context: &GpContext,
    ) -> GpResult<Vec<DetectedCamera>> {
        unsafe {
            let mut list = null_mut();
            check(ffi::gp_list_new(&mut list))?;
            defer! {
                ffi::gp_list_free(list);
            }

            check(ffi::gp_abilities_list_detect(
                self.0, ports.0, list, context.0,
            ))?;

            let count = check(ffi::gp_list_count(list))?;
            let mut cameras = Vec::with_capacity(count as usize);
            for index in 0..count {
                let (mut name, mut value) = (null(), null());
                if let Err(status) = check(ffi::gp_list_get_name(list, index, &mut name)) {
                    warn!(index, %status, "unable to read detected camera name");
                    continue;
                }
                if let Err(status) = check(ffi::gp_list_get_value(list, index, &mut value)) {
                    warn!(index, %status, "unable to read detected camera port");
                    continue;
                }
                cameras.push(DetectedCamera::new(string_from(name), string_from(value)));
            }
            Ok(cameras)
        }
    }
}

pub struct GpPortInfoList(*mut ffi::GPPortInfoList);

unsafe impl Send for GpPortInfoList {}
unsafe impl Sync for GpPortInfoList {}

impl Drop for GpPortInfoList {
    fn drop(&mut self) {
        unsafe { ffi::gp_port_info_list_free(self.0) };
    }
}

impl PortInfoList<Gphoto2Backend> for GpPortInfoList {
    fn load(&mut self) -> GpResult {
        check(unsafe { ffi::gp_port_info_list_load(self.0) })?;
        Ok(())
    }

    fn count(&self) -> GpResult<usize> {
        Ok(check(unsafe { ffi::gp_port_info_list_count(self.0) })? as usize)
    }

    fn lookup_path(&self, path: &str) -> GpResult<usize> {
        let path = c_string(path)?;
        let index = check(unsafe { ffi::gp_port_info_list_lookup_path(self.0, path.as_ptr()) })?;
        Ok(index as usize)
    }

    fn port_info(&self, index: usize) -> GpResult<GpPortInfo> {
        let mut info = null_mut();
        check(unsafe { ffi::gp_port_info_list_get_info(self.0, index as c_int, &mut info) })?;
        Ok(GpPortInfo(info))
    }
}

pub struct GpCamera(*mut ffi::Camera);

impl Drop for GpCamera {
    fn drop(&mut self) {
        unsafe { ffi::gp_camera_unref(self.0) };
    }
}

impl Camera<Gphoto2Backend> for GpCamera {
    fn set_abilities(&mut self, abilities: &GpAbilities) -> GpResult {
        check(unsafe { ffi::gp_camera_set_abilities(self.0, abilities.0) })?;
        Ok(())
    }

    fn set_port_info(&mut self, port: &GpPortInfo) -> GpResult {
        check(unsafe { ffi::gp_camera_set_port_info(self.0, port.0) })?;
        Ok(())
    }

    fn exit(&mut self, context: &GpContext) -> GpResult {
        check(unsafe { ffi::gp_camera_exit(self.0, context.0) })?;
        Ok(())
    }

    fn config(&mut self, context: &GpContext) -> GpResult<GpConfig> {
        let mut root = null_mut();
        check(unsafe { ffi::gp_camera_get_config(self.0, &mut root, context.0) })?;
        Ok(GpConfig(root))
    }

    fn set_config(&mut self, config: &GpConfig, context: &GpContext) -> GpResult {
        check(unsafe { ffi::gp_camera_set_config(self.0, config.0, context.0) })?;
        Ok(())
    }

    fn capture_image(&mut self, context: &GpContext) -> GpResult<CameraFilePath> {
        unsafe {
            let mut path: ffi::CameraFilePath = zeroed();
            check(ffi::gp_camera_capture(
                self.0,
                ffi::GP_CAPTURE_IMAGE,
                &mut path,
                context.0,
            ))?;
            Ok(CameraFilePath::new(
                string_from_array(&path.folder),
                string_from_array(&path.name),
            ))
        }
    }

    fn capture_preview(&mut self, file: &mut GpFile, context: &GpContext) -> GpResult {
        check(unsafe { ffi::gp_camera_capture_preview(self.0, file.0, context.0) })?;
        Ok(())
    }

    fn file_get(
        &mut self,
        path: &CameraFilePath,
        kind: FileType,
        file: &mut GpFile,
        context: &GpContext,
    ) -> GpResult {
        let folder = c_string(&path.folder)?;
        let name = c_string(&path.name)?;
        let kind = match kind {
            FileType::Preview => ffi::GP_FILE_TYPE_PREVIEW,
            FileType::Normal => ffi::GP_FILE_TYPE_NORMAL,
            FileType::Raw => ffi::GP_FILE_TYPE_RAW,
        };
        check(unsafe {
            ffi::gp_camera_file_get(
                self.0,
                folder.as_ptr(),
                name.as_ptr(),
                kind,
                file.0,
                context.0,
            )
        })?;
        Ok(())
    }

    fn wait_for_event(
        &mut self,
        timeout: Duration,
        context: &GpContext,
    ) -> GpResult<CameraEventType> {
        let timeout = timeout.as_millis().min(c_int::MAX as u128) as c_int;
        unsafe {
            let mut kind = ffi::GP_EVENT_UNKNOWN;
            let mut data: *mut c_void = null_mut();
            let code =
                ffi::gp_camera_wait_for_event(self.0, timeout, &mut kind, &mut data, context.0);
            defer! {
                if !data.is_null() {
                    libc::free(data);
                }
            }
            check(code)?;

            Ok(match kind {
                ffi::GP_EVENT_TIMEOUT => CameraEventType::Timeout,
                ffi::GP_EVENT_FILE_ADDED => CameraEventType::FileAdded,
                ffi::GP_EVENT_FOLDER_ADDED => CameraEventType::FolderAdded,
                ffi::GP_EVENT_CAPTURE_COMPLETE => CameraEventType::CaptureComplete,
                ffi::GP_EVENT_FILE_CHANGED => CameraEventType::FileChanged,
                _ => CameraEventType::Unknown,
            })
        }
    }
}

pub struct GpFile(*mut ffi::CameraFile);

impl Drop for GpFile {
    fn drop(&mut self) {
        unsafe { ffi::gp_file_unref(self.0) };
    }
}

impl CameraFile for GpFile {
    fn clean(&mut self) -> GpResult {
        check(unsafe { ffi::gp_file_clean(self.0) })?;
        Ok(())
    }

    fn data(&self) -> GpResult<&[u8]> {
        let mut data: *const c_char = null();
        let mut size: c_ulong = 0;
        check(unsafe { ffi::gp_file_get_data_and_size(self.0, &mut data, &mut size) })?;
        if data.is_null() || size == 0 {
            return Ok(&[]);
        }
        Ok(unsafe { core::slice::from_raw_parts(data.cast::<u8>(), size as usize) })
    }
}

/// The root window of a camera's configuration tree.
pub struct GpConfig(*mut ffi::CameraWidget);

impl Drop for GpConfig {
    fn drop(&mut self) {
        unsafe { ffi::gp_widget_free(self.0) };
    }
}

impl ConfigTree for GpConfig {
    type Node = *mut ffi::CameraWidget;

    fn child_by_name(&self, name: &str) -> GpResult<Self::Node> {
        let name = c_string(name)?;
        let mut child = null_mut();
        check(unsafe { ffi::gp_widget_get_child_by_name(self.0, name.as_ptr(), &mut child) })?;
        Ok(child)
    }

    fn kind(&self, node: Self::Node) -> GpResult<WidgetKind> {
        let mut kind = ffi::GP_WIDGET_WINDOW;
        check(unsafe { ffi::gp_widget_get_type(node, &mut kind) })?;
        Ok(match kind {
            ffi::GP_WIDGET_WINDOW => WidgetKind::Window,
            ffi::GP_WIDGET_SECTION => WidgetKind::Section,
            ffi::GP_WIDGET_TEXT => WidgetKind::Text,
            ffi::GP_WIDGET_RANGE => WidgetKind::Range,
            ffi::GP_WIDGET_TOGGLE => WidgetKind::Toggle,
            ffi::GP_WIDGET_RADIO => WidgetKind::Radio,
            ffi::GP_WIDGET_MENU => WidgetKind::Menu,
            ffi::GP_WIDGET_BUTTON => WidgetKind::Button,
            ffi::GP_WIDGET_DATE => WidgetKind::Date,
            _ => return Err(GpStatus::NOT_SUPPORTED),
        })
    }

    fn value(&self, node: Self::Node) -> GpResult<WidgetValue> {
        match self.kind(node)? {
            WidgetKind::Text | WidgetKind::Radio | WidgetKind::Menu => {
                let mut value: *const c_char = null();
                check(unsafe {
                    ffi::gp_widget_get_value(node, (&raw mut value).cast::<c_void>())
                })?;
                Ok(WidgetValue::Text(unsafe { string_from(value) }))
            },
            WidgetKind::Toggle | WidgetKind::Date => {
                let mut value: c_int = 0;
                check(unsafe {
                    ffi::gp_widget_get_value(node, (&raw mut value).cast::<c_void>())
                })?;
                Ok(WidgetValue::Int(value))
            },
            _ => Err(GpStatus::NOT_SUPPORTED),
        }
    }

    fn set_value(&mut self, node: Self::Node, value: &WidgetValue) -> GpResult {
        match value {
            WidgetValue::Text(text) => {
                let text = c_string(text)?;
                check(unsafe { ffi::gp_widget_set_value(node, text.as_ptr().cast::<c_void>()) })?;
            },
            WidgetValue::Int(value) => {
                check(unsafe {
                    ffi::gp_widget_set_value(node, (value as *const c_int).cast::<c_void>())
                })?;
            },
        }
        Ok(())
    }

    fn count_choices(&self, node: Self::Node) -> GpResult<usize> {
        Ok(check(unsafe { ffi::gp_widget_count_choices(node) })? as usize)
    }

    fn choice(&self, node: Self::Node, index: usize) -> GpResult<String> {
        let mut choice: *const c_char = null();
        check(unsafe { ffi::gp_widget_get_choice(node, index as c_int, &mut choice) })?;
        Ok(unsafe { string_from(choice) })
    }
}
