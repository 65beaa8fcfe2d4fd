// This is free and unencumbered software released into the public domain.

mod common;

use asimov_gphoto_module::shared::{
    Registry,
    backends::simulated::{Op, SimulatedBackend},
};
use common::{MODEL, PORT};
use std::thread;

#[test]
fn empty_system_has_no_devices() {
    let registry = Registry::new(SimulatedBackend::new());
    assert!(registry.is_ready());
    assert!(registry.devices().is_empty());
    assert!(registry.descriptions().is_empty());
    assert_eq!(registry.default_device(), "");
    assert_eq!(registry.description_for("X"), "");
}

#[test]
fn one_camera_is_enumerated() {
    let registry = Registry::new(common::camera());
    assert_eq!(registry.devices(), [MODEL]);
    assert_eq!(registry.descriptions(), [PORT]);
    assert_eq!(registry.default_device(), MODEL);
    assert_eq!(registry.description_for(MODEL), PORT);
    assert!(registry.abilities_for(MODEL).is_some());
    assert!(registry.port_info_for(PORT).is_some());
}

#[test]
fn unknown_model_and_port_resolve_to_nothing() {
    let registry = Registry::new(common::camera());
    assert!(registry.abilities_for("Nikon DSC D750").is_none());
    assert!(registry.port_info_for("usb:009,009").is_none());
    assert_eq!(registry.description_for("Nikon DSC D750"), "");
}

#[test]
fn detection_is_cached_until_refresh() {
    let backend = common::camera();
    let registry = Registry::new(backend.clone());
    assert_eq!(registry.devices().len(), 1);
    assert_eq!(registry.descriptions().len(), 1);
    assert_eq!(backend.state().detections, 1);

    backend.state().attached.clear();
    assert_eq!(registry.devices(), [MODEL]);

    registry.refresh();
    assert!(registry.devices().is_empty());
    assert_eq!(backend.state().detections, 2);
}

#[test]
fn empty_detection_is_cached() {
    let backend = SimulatedBackend::new();
    let registry = Registry::new(backend.clone());
    assert!(registry.devices().is_empty());
    assert!(registry.devices().is_empty());
    assert_eq!(backend.state().detections, 1);
}

#[test]
fn unreadable_entry_is_skipped() {
    let backend = common::camera().with_camera("Nikon DSC D750", "usb:001,007");
    let registry = Registry::new(backend.clone());
    backend.fail(Op::ListEntry, 1);

    assert_eq!(registry.devices(), ["Nikon DSC D750"]);
    assert_eq!(registry.description_for("Nikon DSC D750"), "usb:001,007");
    assert_eq!(registry.description_for(MODEL), "");
}

#[test]
fn concurrent_queries_detect_once() {
    let backend = common::camera().with_camera("Nikon DSC D750", "usb:001,007");
    let registry = Registry::new(backend.clone());

    let seen: Vec<Vec<String>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| registry.devices()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for devices in &seen {
        assert_eq!(devices, &[MODEL, "Nikon DSC D750"]);
    }
    assert_eq!(backend.state().detections, 1);
}

#[test]
fn failed_detection_is_retried() {
    let backend = common::camera();
    let registry = Registry::new(backend.clone());
    backend.fail(Op::Detect, 1);

    assert!(registry.devices().is_empty());
    assert_eq!(registry.devices(), [MODEL]);
}

#[test]
fn initialization_failure_leaves_registry_empty() {
    for op in [
        Op::NewContext,
        Op::NewAbilitiesList,
        Op::LoadAbilities,
        Op::NewPortInfoList,
        Op::LoadPortInfo,
    ] {
        let backend = common::camera();
        backend.fail(op, 1);
        let registry = Registry::new(backend.clone());

        assert!(!registry.is_ready(), "{op:?}");
        assert!(registry.devices().is_empty(), "{op:?}");
        assert_eq!(registry.default_device(), "", "{op:?}");
        assert!(registry.abilities_for(MODEL).is_none(), "{op:?}");
        assert!(registry.port_info_for(PORT).is_none(), "{op:?}");
        assert_eq!(backend.live().total(), 0, "{op:?}");
    }
}

#[test]
fn port_binding_keeps_port_catalogue_alive() {
    let backend = common::camera();
    let registry = Registry::new(backend.clone());
    let port = registry.port_info_for(PORT).unwrap();
    assert_eq!(port.info().path, PORT);

    drop(registry);
    let live = backend.live();
    assert_eq!(live.port_info_lists, 1);
    assert_eq!(live.abilities_lists, 0);
    assert_eq!(live.contexts, 0);

    drop(port);
    assert_eq!(backend.live().total(), 0);
}
