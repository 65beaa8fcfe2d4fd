// This is free and unencumbered software released into the public domain.

mod common;

use asimov_gphoto_module::shared::{
    CameraEventType, ParameterValue, WidgetKind, WidgetValue,
    backends::simulated::{Call, Op, SimWidget, SimulatedBackend},
};
use core::time::Duration;

fn camera_with(widgets: impl IntoIterator<Item = SimWidget>) -> SimulatedBackend {
    widgets
        .into_iter()
        .fold(common::camera(), |backend, widget| backend.with_widget(widget))
}

fn text(backend: &SimulatedBackend, name: &str) -> WidgetValue {
    backend.widget(name).unwrap().value
}

#[test]
fn iso_auto_selection() {
    let backend = camera_with([SimWidget::radio("iso", "100", &["Auto", "100", "200", "400"])]);
    let (mut session, _events) = common::session(&backend);
    session.open();

    assert!(session.set_parameter("iso", ParameterValue::Int(-1)));
    assert_eq!(text(&backend, "iso"), WidgetValue::Text("Auto".into()));
    assert!(backend.journal().contains(&Call::SetConfig));

    assert!(session.set_parameter("iso", ParameterValue::Int(200)));
    assert_eq!(text(&backend, "iso"), WidgetValue::Text("200".into()));

    assert!(!session.set_parameter("iso", ParameterValue::Int(150)));
    assert_eq!(text(&backend, "iso"), WidgetValue::Text("200".into()));
}

#[test]
fn auto_fails_when_every_choice_is_numeric() {
    let backend = camera_with([SimWidget::radio("iso", "100", &["100", "200"])]);
    let (mut session, _events) = common::session(&backend);
    session.open();

    assert!(!session.set_parameter("iso", ParameterValue::Int(-1)));
}

#[test]
fn aperture_matches_within_tolerance() {
    let backend = camera_with([SimWidget::radio("f-number", "f/8", &["5.6", "8", "1,8"])]);
    let (mut session, _events) = common::session(&backend);
    session.open();

    assert!(session.set_parameter("f-number", ParameterValue::Real(5.61)));
    assert_eq!(text(&backend, "f-number"), WidgetValue::Text("5.6".into()));

    assert!(!session.set_parameter("f-number", ParameterValue::Real(5.75)));

    assert!(session.set_parameter("f-number", ParameterValue::Real(1.8)));
    assert_eq!(text(&backend, "f-number"), WidgetValue::Text("1,8".into()));
}

#[test]
fn toggle_round_trip() {
    let backend = camera_with([SimWidget::toggle("capture", false)]);
    let (mut session, _events) = common::session(&backend);
    session.open();

    assert_eq!(session.parameter("capture"), Some(ParameterValue::Bool(false)));
    assert!(session.set_parameter("capture", ParameterValue::Bool(true)));
    assert_eq!(session.parameter("capture"), Some(ParameterValue::Bool(true)));

    assert!(session.set_parameter("capture", ParameterValue::Int(0)));
    assert_eq!(session.parameter("capture"), Some(ParameterValue::Bool(false)));

    assert!(session.set_parameter("capture", ParameterValue::Real(0.7)));
    assert_eq!(session.parameter("capture"), Some(ParameterValue::Bool(true)));

    assert!(!session.set_parameter("capture", ParameterValue::from("on")));
}

#[test]
fn radio_string_round_trip() {
    let backend = camera_with([SimWidget::radio(
        "whitebalance",
        "Auto",
        &["Auto", "Daylight", "Tungsten"],
    )]);
    let (mut session, _events) = common::session(&backend);
    session.open();

    let value = ParameterValue::from("Daylight".to_owned());
    assert!(session.set_parameter("whitebalance", value.clone()));
    assert_eq!(session.parameter("whitebalance"), Some(value));

    assert!(!session.set_parameter("whitebalance", ParameterValue::from("Candlelight".to_owned())));
    assert!(!session.set_parameter("whitebalance", ParameterValue::Bool(true)));
}

#[test]
fn unsupported_widgets_are_rejected() {
    let backend = camera_with([
        SimWidget::new("owner", WidgetKind::Text, WidgetValue::Text("Ada".into())),
        SimWidget::new("datetime", WidgetKind::Date, WidgetValue::Int(1_700_000_000)),
    ]);
    let (mut session, _events) = common::session(&backend);
    session.open();

    assert_eq!(session.parameter("owner"), None);
    assert_eq!(session.parameter("datetime"), None);
    assert!(!session.set_parameter("owner", ParameterValue::from("Grace".to_owned())));
    assert!(!session.set_parameter("datetime", ParameterValue::Int(0)));
    assert!(!backend.journal().contains(&Call::SetConfig));
}

#[test]
fn missing_option_and_closed_camera() {
    let backend = camera_with([SimWidget::toggle("capture", false)]);
    let (mut session, _events) = common::session(&backend);

    assert_eq!(session.parameter("capture"), None);
    assert!(!session.set_parameter("capture", ParameterValue::Bool(true)));

    session.open();
    assert_eq!(session.parameter("shutterspeed"), None);
    assert!(!session.set_parameter("shutterspeed", ParameterValue::Real(0.5)));
}

#[test]
fn failed_config_push_reports_false() {
    let backend = camera_with([SimWidget::toggle("capture", false)]);
    let (mut session, _events) = common::session(&backend);
    session.open();
    backend.fail(Op::SetConfig, 1);

    assert!(!session.set_parameter("capture", ParameterValue::Bool(true)));
    assert_eq!(session.parameter("capture"), Some(ParameterValue::Bool(false)));
    assert_eq!(backend.live().configs, 0);
}

#[test]
fn successful_write_lets_camera_settle() {
    let backend = camera_with([SimWidget::toggle("capture", false)]);
    let (mut session, _events) = common::session(&backend);
    session.open();
    backend.clear_journal();

    assert!(session.set_parameter("capture", ParameterValue::Bool(true)));
    assert_eq!(
        backend.journal().last(),
        Some(&Call::WaitForEvent {
            timeout: Duration::from_millis(10),
            event: CameraEventType::Timeout,
        })
    );
}

#[test]
fn settling_swallows_camera_events() {
    let backend = camera_with([SimWidget::radio("iso", "100", &["100", "200"])]);
    let (mut session, events) = common::session(&backend);
    session.open();
    common::drain(&events);
    backend.clear_journal();
    backend
        .state()
        .events
        .extend([CameraEventType::FileAdded, CameraEventType::FolderAdded]);

    assert!(session.set_parameter("iso", ParameterValue::from("200")));
    assert!(backend.state().events.is_empty());

    let waited: Vec<_> = backend
        .journal()
        .into_iter()
        .filter_map(|call| match call {
            Call::WaitForEvent { event, .. } => Some(event),
            _ => None,
        })
        .collect();
    assert_eq!(
        waited,
        [
            CameraEventType::FileAdded,
            CameraEventType::FolderAdded,
            CameraEventType::Timeout
        ]
    );
    assert!(common::drain(&events).is_empty());
}

#[test]
fn describe_lists_choices() {
    let backend = camera_with([SimWidget::radio("iso", "200", &["Auto", "100", "200"])]);
    let (mut session, _events) = common::session(&backend);
    session.open();

    let info = session.describe_parameter("iso").unwrap();
    assert_eq!(info.name, "iso");
    assert_eq!(info.kind, WidgetKind::Radio);
    assert_eq!(info.value, Some(ParameterValue::from("200".to_owned())));
    assert_eq!(info.choices, ["Auto", "100", "200"]);
    assert!(session.describe_parameter("nothing").is_none());
}
