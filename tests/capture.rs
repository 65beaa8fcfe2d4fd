// This is free and unencumbered software released into the public domain.

mod common;

use asimov_gphoto_module::shared::{
    CameraEvent, CameraEventType, CameraFilePath, CaptureErrorKind, FileType, WidgetValue,
    backends::simulated::{Call, Op, SimWidget},
};
use common::drain;
use core::time::Duration;

const SETTLE: Duration = Duration::from_millis(10);
const DRAIN: Duration = Duration::from_millis(100);

fn set(name: &str, value: i32) -> Call {
    Call::SetValue {
        name: name.into(),
        value: WidgetValue::Int(value),
    }
}

fn wait(timeout: Duration, event: CameraEventType) -> Call {
    Call::WaitForEvent { timeout, event }
}

fn capture_errors(events: &[CameraEvent]) -> Vec<(i32, CaptureErrorKind, String)> {
    events
        .iter()
        .filter_map(|event| match event {
            CameraEvent::ImageCaptureError {
                id,
                reason,
                message,
            } => Some((*id, *reason, message.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn still_capture_with_viewfinder() {
    let backend = common::dslr();
    let (mut session, events) = common::session(&backend);
    session.open();
    assert_eq!(backend.widget("viewfinder").unwrap().value, WidgetValue::Int(1));
    drain(&events);
    backend.clear_journal();

    session.capture_photo(42, "shot.jpg");

    let calls: Vec<Call> = backend
        .journal()
        .into_iter()
        .filter(|call| *call != Call::GetConfig)
        .collect();
    assert_eq!(
        calls,
        [
            set("viewfinder", 0),
            Call::SetConfig,
            wait(SETTLE, CameraEventType::Timeout),
            Call::CaptureImage,
            Call::FileGet {
                path: CameraFilePath::new("/store_00010001/DCIM/100CANON", "IMG_0001.JPG"),
                kind: FileType::Normal,
            },
            wait(DRAIN, CameraEventType::CaptureComplete),
            wait(DRAIN, CameraEventType::Timeout),
            set("viewfinder", 1),
            Call::SetConfig,
            wait(SETTLE, CameraEventType::Timeout),
        ]
    );

    let produced = drain(&events);
    assert_eq!(produced.len(), 1);
    match &produced[0] {
        CameraEvent::ImageCaptured {
            id,
            data,
            file_name,
        } => {
            assert_eq!(*id, 42);
            assert_eq!(file_name, "shot.jpg");
            assert_eq!(&data[..], b"\xFF\xD8still\xFF\xD9");
        },
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(backend.widget("viewfinder").unwrap().value, WidgetValue::Int(1));
}

#[test]
fn still_capture_triggers_autofocus_without_viewfinder() {
    let backend = common::camera().with_widget(SimWidget::toggle("autofocusedrive", false));
    let (mut session, events) = common::session(&backend);
    session.open();
    backend.clear_journal();

    session.capture_photo(7, "af.jpg");

    let journal = backend.journal();
    let sets: Vec<&Call> = journal
        .iter()
        .filter(|call| matches!(call, Call::SetValue { .. }))
        .collect();
    assert_eq!(sets, [&set("autofocusedrive", 1)]);
    let focus = journal.iter().position(|c| *c == set("autofocusedrive", 1));
    let capture = journal.iter().position(|c| *c == Call::CaptureImage);
    assert!(focus < capture);
    assert!(
        drain(&events)
            .iter()
            .any(|event| matches!(event, CameraEvent::ImageCaptured { id: 7, .. }))
    );
}

#[test]
fn unexpected_events_are_drained() {
    let backend = common::camera();
    let (mut session, events) = common::session(&backend);
    session.open();
    backend.state().events.extend([
        CameraEventType::FileAdded,
        CameraEventType::Unknown,
        CameraEventType::FolderAdded,
    ]);
    backend.clear_journal();

    session.capture_photo(1, "x.jpg");

    let waits = backend
        .journal()
        .iter()
        .filter(|call| matches!(call, Call::WaitForEvent { .. }))
        .count();
    // Three queued events, the capture's own completion, then the timeout.
    assert_eq!(waits, 5);
    assert!(backend.state().events.is_empty());
    drain(&events);
}

#[test]
fn capture_on_closed_camera_is_not_ready() {
    let backend = common::camera();
    let (mut session, events) = common::session(&backend);

    session.capture_photo(3, "x.jpg");
    assert_eq!(
        capture_errors(&drain(&events)),
        [(3, CaptureErrorKind::NotReady, "Camera is not ready".to_owned())]
    );
    assert!(!backend.journal().contains(&Call::CaptureImage));
}

#[test]
fn capture_failure_is_reported_and_mirror_restored() {
    let backend = common::dslr();
    let (mut session, events) = common::session(&backend);
    session.open();
    drain(&events);
    backend.clear_journal();
    backend.fail(Op::CaptureImage, 1);

    session.capture_photo(5, "x.jpg");

    assert_eq!(
        capture_errors(&drain(&events)),
        [(5, CaptureErrorKind::Resource, "Failed to capture frame".to_owned())]
    );
    let journal = backend.journal();
    assert!(!journal.iter().any(|call| matches!(call, Call::FileGet { .. })));
    assert_eq!(journal.iter().filter(|c| **c == set("viewfinder", 1)).count(), 1);
    assert_eq!(backend.widget("viewfinder").unwrap().value, WidgetValue::Int(1));
    assert!(session.is_open());
}

#[test]
fn download_failure_is_reported() {
    let backend = common::camera();
    let (mut session, events) = common::session(&backend);
    session.open();
    drain(&events);
    backend.fail(Op::FileGet, 1);

    session.capture_photo(9, "x.jpg");

    let produced = drain(&events);
    assert_eq!(
        capture_errors(&produced),
        [(9, CaptureErrorKind::Resource, "Failed to download file from camera".to_owned())]
    );
    assert!(
        !produced
            .iter()
            .any(|event| matches!(event, CameraEvent::ImageCaptured { .. }))
    );
    assert_eq!(backend.live().files, 1);
}
