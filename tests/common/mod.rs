// This is free and unencumbered software released into the public domain.

#![allow(dead_code)]

use asimov_gphoto_module::shared::{
    CameraEvent, Registry, Session, SessionConfig, SessionStatus,
    backends::simulated::{SimWidget, SimulatedBackend},
};
use image::{ImageFormat, Rgb, RgbImage};
use std::{
    io::Cursor,
    sync::mpsc::{Receiver, channel},
};

pub const MODEL: &str = "Canon EOS 5D";
pub const PORT: &str = "usb:001,004";

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// A 2x1 image: red on the left, blue on the right.
pub fn two_pixels() -> RgbImage {
    let mut image = RgbImage::new(2, 1);
    image.put_pixel(0, 0, RED);
    image.put_pixel(1, 0, BLUE);
    image
}

pub fn png(image: &RgbImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// One attached camera with a working live view.
pub fn camera() -> SimulatedBackend {
    SimulatedBackend::new()
        .with_camera(MODEL, PORT)
        .with_preview(png(&two_pixels()))
        .with_still(b"\xFF\xD8still\xFF\xD9".to_vec())
}

/// A camera exposing a mirror control, like most DSLRs.
pub fn dslr() -> SimulatedBackend {
    camera().with_widget(SimWidget::toggle("viewfinder", false))
}

pub fn session(backend: &SimulatedBackend) -> (Session<SimulatedBackend>, Receiver<CameraEvent>) {
    session_with(backend, SessionConfig::default())
}

pub fn session_with(
    backend: &SimulatedBackend,
    config: SessionConfig,
) -> (Session<SimulatedBackend>, Receiver<CameraEvent>) {
    let registry = Registry::new(backend.clone());
    let abilities = registry.abilities_for(MODEL).unwrap();
    let port = registry.port_info_for(PORT).unwrap();
    let (tx, rx) = channel();
    let session = Session::new(backend.clone(), abilities, port, config, tx);
    (session, rx)
}

pub fn drain(events: &Receiver<CameraEvent>) -> Vec<CameraEvent> {
    events.try_iter().collect()
}

pub fn statuses(events: &[CameraEvent]) -> Vec<SessionStatus> {
    events
        .iter()
        .filter_map(|event| match event {
            CameraEvent::StatusChanged(status) => Some(*status),
            _ => None,
        })
        .collect()
}

pub fn errors(events: &[CameraEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            CameraEvent::Error { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect()
}
