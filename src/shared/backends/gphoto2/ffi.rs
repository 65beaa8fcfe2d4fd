// This is free and unencumbered software released into the public domain.

//! Raw bindings for the subset of libgphoto2 used by this crate.

#![allow(non_camel_case_types, non_snake_case, dead_code)]

use core::ffi::{c_char, c_int, c_ulong, c_void};

macro_rules! opaque {
    ($($name:ident),* $(,)?) => {
        $(
            #[repr(C)]
            pub struct $name {
                _private: [u8; 0],
            }
        )*
    };
}

opaque!(
    GPContext,
    CameraAbilitiesList,
    GPPortInfoList,
    _GPPortInfo,
    CameraList,
    Camera,
    CameraFile,
    CameraWidget,
);

pub type GPPortInfo = *mut _GPPortInfo;

pub type CameraWidgetType = c_int;
pub const GP_WIDGET_WINDOW: CameraWidgetType = 0;
pub const GP_WIDGET_SECTION: CameraWidgetType = 1;
pub const GP_WIDGET_TEXT: CameraWidgetType = 2;
pub const GP_WIDGET_RANGE: CameraWidgetType = 3;
pub const GP_WIDGET_TOGGLE: CameraWidgetType = 4;
pub const GP_WIDGET_RADIO: CameraWidgetType = 5;
pub const GP_WIDGET_MENU: CameraWidgetType = 6;
pub const GP_WIDGET_BUTTON: CameraWidgetType = 7;
pub const GP_WIDGET_DATE: CameraWidgetType = 8;

pub type CameraEventType = c_int;
pub const GP_EVENT_UNKNOWN: CameraEventType = 0;
pub const GP_EVENT_TIMEOUT: CameraEventType = 1;
pub const GP_EVENT_FILE_ADDED: CameraEventType = 2;
pub const GP_EVENT_FOLDER_ADDED: CameraEventType = 3;
pub const GP_EVENT_CAPTURE_COMPLETE: CameraEventType = 4;
pub const GP_EVENT_FILE_CHANGED: CameraEventType = 5;

pub type CameraCaptureType = c_int;
pub const GP_CAPTURE_IMAGE: CameraCaptureType = 0;

pub type CameraFileType = c_int;
pub const GP_FILE_TYPE_PREVIEW: CameraFileType = 0;
pub const GP_FILE_TYPE_NORMAL: CameraFileType = 1;
pub const GP_FILE_TYPE_RAW: CameraFileType = 2;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CameraAbilities {
    pub model: [c_char; 128],
    pub status: c_int,
    pub port: c_int,
    pub speed: [c_int; 64],
    pub operations: c_int,
    pub file_operations: c_int,
    pub folder_operations: c_int,
    pub usb_vendor: c_int,
    pub usb_product: c_int,
    pub usb_class: c_int,
    pub usb_subclass: c_int,
    pub usb_protocol: c_int,
    pub library: [c_char; 1024],
    pub id: [c_char; 1024],
    pub device_type: c_int,
    pub reserved2: c_int,
    pub reserved3: c_int,
    pub reserved4: c_int,
    pub reserved5: c_int,
    pub reserved6: c_int,
    pub reserved7: c_int,
    pub reserved8: c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CameraFilePath {
    pub name: [c_char; 128],
    pub folder: [c_char; 1024],
}

#[link(name = "gphoto2")]
unsafe extern "C" {
    pub fn gp_context_new() -> *mut GPContext;
    pub fn gp_context_unref(context: *mut GPContext);

    pub fn gp_abilities_list_new(list: *mut *mut CameraAbilitiesList) -> c_int;
    pub fn gp_abilities_list_free(list: *mut CameraAbilitiesList) -> c_int;
    pub fn gp_abilities_list_load(list: *mut CameraAbilitiesList, context: *mut GPContext)
    -> c_int;
    pub fn gp_abilities_list_lookup_model(
        list: *mut CameraAbilitiesList,
        model: *const c_char,
    ) -> c_int;
    pub fn gp_abilities_list_get_abilities(
        list: *mut CameraAbilitiesList,
        index: c_int,
        abilities: *mut CameraAbilities,
    ) -> c_int;
    pub fn gp_abilities_list_detect(
        list: *mut CameraAbilitiesList,
        info_list: *mut GPPortInfoList,
        l: *mut CameraList,
        context: *mut GPContext,
    ) -> c_int;

    pub fn gp_list_new(list: *mut *mut CameraList) -> c_int;
    pub fn gp_list_free(list: *mut CameraList) -> c_int;
    pub fn gp_list_count(list: *mut CameraList) -> c_int;
    pub fn gp_list_get_name(list: *mut CameraList, index: c_int, name: *mut *const c_char)
    -> c_int;
    pub fn gp_list_get_value(
        list: *mut CameraList,
        index: c_int,
        value: *mut *const c_char,
    ) -> c_int;

    pub fn gp_camera_new(camera: *mut *mut Camera) -> c_int;
    pub fn gp_camera_unref(camera: *mut Camera) -> c_int;
    pub fn gp_camera_set_abilities(camera: *mut Camera, abilities: CameraAbilities) -> c_int;
    pub fn gp_camera_set_port_info(camera: *mut Camera, info: GPPortInfo) -> c_int;
    pub fn gp_camera_exit(camera: *mut Camera, context: *mut GPContext) -> c_int;
    pub fn gp_camera_get_config(
        camera: *mut Camera,
        window: *mut *mut CameraWidget,
        context: *mut GPContext,
    ) -> c_int;
    pub fn gp_camera_set_config(
        camera: *mut Camera,
        window: *mut CameraWidget,
        context: *mut GPContext,
    ) -> c_int;
    pub fn gp_camera_capture(
        camera: *mut Camera,
        kind: CameraCaptureType,
        path: *mut CameraFilePath,
        context: *mut GPContext,
    ) -> c_int;
    pub fn gp_camera_capture_preview(
        camera: *mut Camera,
        file: *mut CameraFile,
        context: *mut GPContext,
    ) -> c_int;
    pub fn gp_camera_file_get(
        camera: *mut Camera,
        folder: *const c_char,
        file: *const c_char,
        kind: CameraFileType,
        camera_file: *mut CameraFile,
        context: *mut GPContext,
    ) -> c_int;
    pub fn gp_camera_wait_for_event(
        camera: *mut Camera,
        timeout: c_int,
        event_type: *mut CameraEventType,
        event_data: *mut *mut c_void,
        context: *mut GPContext,
    ) -> c_int;

    pub fn gp_file_new(file: *mut *mut CameraFile) -> c_int;
    pub fn gp_file_unref(file: *mut CameraFile) -> c_int;
    pub fn gp_file_clean(file: *mut CameraFile) -> c_int;
    pub fn gp_file_get_data_and_size(
        file: *mut CameraFile,
        data: *mut *const c_char,
        size: *mut c_ulong,
    ) -> c_int;

    pub fn gp_widget_free(widget: *mut CameraWidget) -> c_int;
    pub fn gp_widget_get_child_by_name(
        widget: *mut CameraWidget,
        name: *const c_char,
        child: *mut *mut CameraWidget,
    ) -> c_int;
    pub fn gp_widget_get_type(widget: *mut CameraWidget, kind: *mut CameraWidgetType) -> c_int;
    pub fn gp_widget_get_value(widget: *mut CameraWidget, value: *mut c_void) -> c_int;
    pub fn gp_widget_set_value(widget: *mut CameraWidget, value: *const c_void) -> c_int;
    pub fn gp_widget_count_choices(widget: *mut CameraWidget) -> c_int;
    pub fn gp_widget_get_choice(
        widget: *mut CameraWidget,
        index: c_int,
        choice: *mut *const c_char,
    ) -> c_int;
}

#[link(name = "gphoto2_port")]
unsafe extern "C" {
    pub fn gp_port_info_list_new(list: *mut *mut GPPortInfoList) -> c_int;
    pub fn gp_port_info_list_free(list: *mut GPPortInfoList) -> c_int;
    pub fn gp_port_info_list_load(list: *mut GPPortInfoList) -> c_int;
    pub fn gp_port_info_list_count(list: *mut GPPortInfoList) -> c_int;
    pub fn gp_port_info_list_lookup_path(list: *mut GPPortInfoList, path: *const c_char)
    -> c_int;
    pub fn gp_port_info_list_get_info(
        list: *mut GPPortInfoList,
        n: c_int,
        info: *mut GPPortInfo,
    ) -> c_int;
}
