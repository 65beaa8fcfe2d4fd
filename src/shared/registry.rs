// This is free and unencumbered software released into the public domain.

//! Enumeration of attached cameras.

use crate::shared::{AbilitiesList, Backend, DetectedCamera, PortInfoList};
use core::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Catalogue handles loaded once per registry.
///
/// Fields drop in declaration order: ports, abilities, then the context.
struct Catalog<B: Backend> {
    ports: Arc<B::PortInfoList>,
    abilities: B::AbilitiesList,
    context: B::Context,
}

/// A resolved port, together with the catalogue it was read from.
///
/// Port records can borrow from their catalogue, so the catalogue is kept
/// alive for as long as the binding is.
pub struct PortBinding<B: Backend> {
    info: B::PortInfo,
    #[allow(dead_code)]
    catalog: Arc<B::PortInfoList>,
}

impl<B: Backend> PortBinding<B> {
    pub fn info(&self) -> &B::PortInfo {
        &self.info
    }
}

impl<B: Backend> fmt::Debug for PortBinding<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortBinding")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// The cameras currently attached, as `(model, port)` pairs.
pub type DeviceList = Vec<DetectedCamera>;

/// Detects attached cameras and resolves their abilities and ports.
///
/// Library initialization happens once, in [`Registry::new`]; if any step
/// fails the registry stays permanently empty. Detection runs lazily on the
/// first query and its result is cached until [`Registry::refresh`].
pub struct Registry<B: Backend> {
    backend: B,
    catalog: Option<Catalog<B>>,
    cache: Mutex<Option<DeviceList>>,
}

impl<B: Backend> fmt::Debug for Registry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("backend", &self.backend.name())
            .field("ready", &self.catalog.is_some())
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Registry<B> {
    pub fn new(backend: B) -> Self {
        let catalog = Self::load(&backend);
        Self {
            backend,
            catalog,
            cache: Mutex::new(None),
        }
    }

    fn load(backend: &B) -> Option<Catalog<B>> {
        let context = backend
            .new_context()
            .map_err(|status| warn!(%status, "unable to create gphoto context"))
            .ok()?;

        let mut abilities = backend
            .new_abilities_list()
            .map_err(|status| warn!(%status, "unable to create gphoto abilities list"))
            .ok()?;
        abilities
            .load(&context)
            .map_err(|status| warn!(%status, "unable to load gphoto abilities"))
            .ok()?;

        let mut ports = backend
            .new_port_info_list()
            .map_err(|status| warn!(%status, "unable to create gphoto port info list"))
            .ok()?;
        ports
            .load()
            .map_err(|status| warn!(%status, "unable to load gphoto port info"))
            .ok()?;
        match ports.count() {
            Ok(count) => debug!(count, "loaded gphoto ports"),
            Err(status) => {
                warn!(%status, "unable to count gphoto ports");
                return None;
            },
        }

        Some(Catalog {
            ports: Arc::new(ports),
            abilities,
            context,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether library initialization succeeded.
    pub fn is_ready(&self) -> bool {
        self.catalog.is_some()
    }

    fn cache(&self) -> MutexGuard<'_, Option<DeviceList>> {
        self.cache.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// The attached cameras, detecting them on first use.
    ///
    /// A failed detection yields an empty list and is retried on the next call.
    pub fn cameras(&self) -> DeviceList {
        let Some(catalog) = &self.catalog else {
            return DeviceList::new();
        };

        let mut cache = self.cache();
        if let Some(cameras) = cache.as_ref() {
            return cameras.clone();
        }

        match catalog
            .abilities
            .detect(&catalog.ports, &catalog.context)
        {
            Ok(cameras) => {
                debug!(count = cameras.len(), "detected cameras");
                *cache = Some(cameras.clone());
                cameras
            },
            Err(status) => {
                warn!(%status, "unable to detect cameras");
                DeviceList::new()
            },
        }
    }

    /// Drops the cached detection result; the next query detects again.
    pub fn refresh(&self) {
        self.cache().take();
    }

    /// Device identifiers (model names), in detection order.
    pub fn devices(&self) -> Vec<String> {
        self.cameras().into_iter().map(|c| c.model).collect()
    }

    /// Device descriptions (port paths), in detection order.
    pub fn descriptions(&self) -> Vec<String> {
        self.cameras().into_iter().map(|c| c.port).collect()
    }

    /// The first detected device, or an empty string when there is none.
    pub fn default_device(&self) -> String {
        self.devices().into_iter().next().unwrap_or_default()
    }

    /// The description of `device`, or an empty string if it is not attached.
    pub fn description_for(&self, device: &str) -> String {
        self.cameras()
            .into_iter()
            .find(|c| c.model == device)
            .map(|c| c.port)
            .unwrap_or_default()
    }

    /// Looks up the abilities record for a camera model.
    pub fn abilities_for(&self, device: &str) -> Option<B::Abilities> {
        let catalog = self.catalog.as_ref()?;
        let index = catalog
            .abilities
            .lookup_model(device)
            .map_err(|status| warn!(model = device, %status, "unable to find camera model"))
            .ok()?;
        catalog
            .abilities
            .abilities(index)
            .map_err(|status| warn!(model = device, %status, "unable to get camera abilities"))
            .ok()
    }

    /// Looks up the port record for a port path.
    pub fn port_info_for(&self, description: &str) -> Option<PortBinding<B>> {
        let catalog = self.catalog.as_ref()?;
        let index = catalog
            .ports
            .lookup_path(description)
            .map_err(|status| warn!(port = description, %status, "unable to find port"))
            .ok()?;
        let info = catalog
            .ports
            .port_info(index)
            .map_err(|status| warn!(port = description, %status, "unable to get port info"))
            .ok()?;
        Some(PortBinding {
            info,
            catalog: Arc::clone(&catalog.ports),
        })
    }
}
