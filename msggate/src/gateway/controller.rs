//! The gateway: registry ownership, lifecycle supervision, event emission.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio::sync::Mutex;
use tracing::{debug, warn};

// Layer 3: Internal module imports
use super::config::{GatewayConfig, LinkEntry, ModuleEntry};
use super::error::GatewayError;
use super::snapshot::{ModuleInfo, ModuleList};
use crate::broker::Broker;
use crate::event::types::EventCallback;
use crate::event::{EventSystem, GatewayEvent};
use crate::module::{LoaderRegistry, Module, ModuleLibrary, ModuleLoader, GATEWAY_API_VERSION};
use crate::util::ModuleHandle;

/// Per-module bookkeeping held by the controller.
struct ModuleData {
    name: String,
    handle: ModuleHandle,
    module: Arc<dyn Module>,
    library: Arc<dyn ModuleLibrary>,
    loader: Arc<dyn ModuleLoader>,
    started: bool,
}

/// Registry and link table; guarded by the single controller lock.
#[derive(Default)]
struct GatewayState {
    modules: Vec<ModuleData>,
    links: Vec<LinkEntry>,
    destroyed: bool,
}

/// In-process message gateway hosting a graph of modules.
///
/// The gateway constructs modules through registered loaders, wires the
/// directed links between them, attaches every module to the broker, and
/// supervises lifecycle transitions. All controller operations serialize
/// against one another through a single lock; they never block message
/// delivery, which runs on the broker's per-module workers.
///
/// # Example
///
/// ```ignore
/// use msggate::gateway::{Gateway, GatewayConfig, LinkEntry, ModuleEntry};
///
/// let config = GatewayConfig::new()
///     .with_module(ModuleEntry::new("sensor", "native"))
///     .with_module(ModuleEntry::new("printer", "native"))
///     .with_link(LinkEntry::new("sensor", "printer"));
///
/// let gateway = Gateway::create(Some(config)).await?;
/// gateway.start().await?;
/// // ... sensor publishes, printer receives ...
/// gateway.destroy().await;
/// ```
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    broker: Broker,
    events: EventSystem,
    state: Mutex<GatewayState>,
}

impl Gateway {
    /// Create a gateway, optionally applying a configuration.
    ///
    /// With a configuration, every described module is added first, then
    /// every described link; any failure tears the partially built gateway
    /// down and surfaces the error. On success a
    /// [`GatewayEvent::Created`] is reported.
    ///
    /// # Errors
    ///
    /// Whatever `add_module`/`add_link` would return for the offending
    /// configuration entry.
    pub async fn create(config: Option<GatewayConfig>) -> Result<Gateway, GatewayError> {
        let gateway = Gateway {
            inner: Arc::new(GatewayInner {
                broker: Broker::new(),
                events: EventSystem::new(),
                state: Mutex::new(GatewayState::default()),
            }),
        };

        if let Some(config) = config {
            let mut state = gateway.inner.state.lock().await;
            for entry in config.modules {
                if let Err(error) = gateway.add_module_locked(&mut state, entry) {
                    drop(state);
                    gateway.destroy_internal(false).await;
                    return Err(error);
                }
            }
            for entry in config.links {
                if let Err(error) = gateway.add_link_locked(&mut state, entry) {
                    drop(state);
                    gateway.destroy_internal(false).await;
                    return Err(error);
                }
            }
        }

        gateway.inner.events.report(GatewayEvent::Created, None);
        Ok(gateway)
    }

    /// Invoke the startup hook of every module that has not started yet.
    ///
    /// Start is idempotent per module: modules already started by an
    /// earlier `start` or [`start_module`](Self::start_module) are skipped.
    /// Modules added afterwards do not start automatically. Reports
    /// [`GatewayEvent::Started`] after the hooks ran.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Destroyed`] after [`destroy`](Self::destroy).
    pub async fn start(&self) -> Result<(), GatewayError> {
        let mut state = self.inner.state.lock().await;
        if state.destroyed {
            return Err(GatewayError::Destroyed);
        }

        for data in state.modules.iter_mut() {
            if !data.started {
                data.module.start().await;
                data.started = true;
            }
        }

        self.inner.events.report(GatewayEvent::Started, None);
        Ok(())
    }

    /// Invoke one module's startup hook, if it has not started yet.
    ///
    /// An unknown handle (or a gateway that was already destroyed) is a
    /// logged no-op.
    pub async fn start_module(&self, handle: ModuleHandle) {
        let mut state = self.inner.state.lock().await;
        if state.destroyed {
            warn!(%handle, "start_module ignored: gateway destroyed");
            return;
        }

        match state.modules.iter_mut().find(|data| data.handle == handle) {
            Some(data) if !data.started => {
                data.module.start().await;
                data.started = true;
            }
            Some(data) => {
                debug!(module = %data.name, "start_module: module already started");
            }
            None => {
                warn!(%handle, "start_module: no module with this handle");
            }
        }
    }

    /// Construct a module through its loader and add it to the graph.
    ///
    /// Steps, each unwinding the previous ones on failure: name check,
    /// loader lookup, library load, API version gate, configuration build,
    /// instance construction, broker attach, registry insert. Reports
    /// [`GatewayEvent::ModuleListChanged`] on success.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidModuleName`] / [`GatewayError::DuplicateModuleName`]
    /// - [`GatewayError::LoaderNotFound`] for an unregistered loader
    /// - [`GatewayError::Loader`] when the loader or library refuses
    /// - [`GatewayError::UnsupportedApiVersion`]
    /// - [`GatewayError::Destroyed`]
    pub async fn add_module(&self, entry: ModuleEntry) -> Result<ModuleHandle, GatewayError> {
        let mut state = self.inner.state.lock().await;
        if state.destroyed {
            return Err(GatewayError::Destroyed);
        }

        let handle = self.add_module_locked(&mut state, entry)?;
        self.report_module_list_changed(&state);
        Ok(handle)
    }

    /// Remove a module by handle.
    ///
    /// Cascade-removes every link referencing the module, detaches it from
    /// the broker (waiting for its delivery worker to exit), releases the
    /// instance, and unloads the library. Reports
    /// [`GatewayEvent::ModuleListChanged`].
    ///
    /// # Errors
    ///
    /// [`GatewayError::ModuleNotFound`] for an unknown handle,
    /// [`GatewayError::Destroyed`] after destroy.
    pub async fn remove_module(&self, handle: ModuleHandle) -> Result<(), GatewayError> {
        let mut state = self.inner.state.lock().await;
        if state.destroyed {
            return Err(GatewayError::Destroyed);
        }

        let index = state
            .modules
            .iter()
            .position(|data| data.handle == handle)
            .ok_or_else(|| GatewayError::ModuleNotFound(handle.to_string()))?;

        self.remove_module_locked(&mut state, index).await;
        self.report_module_list_changed(&state);
        Ok(())
    }

    /// Remove a module by name. Same semantics as
    /// [`remove_module`](Self::remove_module).
    ///
    /// # Errors
    ///
    /// [`GatewayError::ModuleNotFound`] for an unknown name,
    /// [`GatewayError::Destroyed`] after destroy.
    pub async fn remove_module_by_name(&self, name: &str) -> Result<(), GatewayError> {
        let mut state = self.inner.state.lock().await;
        if state.destroyed {
            return Err(GatewayError::Destroyed);
        }

        let index = state
            .modules
            .iter()
            .position(|data| data.name == name)
            .ok_or_else(|| GatewayError::ModuleNotFound(name.to_owned()))?;

        self.remove_module_locked(&mut state, index).await;
        self.report_module_list_changed(&state);
        Ok(())
    }

    /// Add a directed link to the graph.
    ///
    /// With the wildcard source only the sink must exist; otherwise both
    /// endpoints must resolve to registered modules. The exact link must
    /// not already exist. Reports [`GatewayEvent::ModuleListChanged`].
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidLinkEntry`] for empty endpoints
    /// - [`GatewayError::DuplicateLink`]
    /// - [`GatewayError::LinkEndpointNotFound`]
    /// - [`GatewayError::Destroyed`]
    pub async fn add_link(&self, entry: LinkEntry) -> Result<(), GatewayError> {
        let mut state = self.inner.state.lock().await;
        if state.destroyed {
            return Err(GatewayError::Destroyed);
        }

        self.add_link_locked(&mut state, entry)?;
        self.report_module_list_changed(&state);
        Ok(())
    }

    /// Remove a link by exact match.
    ///
    /// Removing a link that does not exist is a silent success: nothing
    /// changes and no event is reported.
    pub async fn remove_link(&self, entry: &LinkEntry) {
        let mut state = self.inner.state.lock().await;
        if state.destroyed {
            warn!("remove_link ignored: gateway destroyed");
            return;
        }

        match state.links.iter().position(|link| link == entry) {
            Some(index) => {
                let link = state.links.remove(index);
                self.unsubscribe(&link);
                self.report_module_list_changed(&state);
            }
            None => {
                debug!(
                    source = %entry.source,
                    sink = %entry.sink,
                    "remove_link: no such link"
                );
            }
        }
    }

    /// Take a defensive snapshot of the module graph.
    ///
    /// The caller owns the snapshot; it reflects the registry at this
    /// moment and is unaffected by later mutations.
    pub async fn module_list(&self) -> ModuleList {
        let state = self.inner.state.lock().await;
        Self::snapshot_locked(&state)
    }

    /// Register an observer for one lifecycle event kind.
    ///
    /// Observers run on the event system's dispatch worker, in
    /// registration order, in event report order.
    pub fn add_event_callback<F>(&self, event: GatewayEvent, callback: F)
    where
        F: Fn(GatewayEvent, Option<&ModuleList>) + Send + Sync + 'static,
    {
        let callback: EventCallback = Arc::new(callback);
        self.inner.events.add_callback(event, callback);
    }

    /// Number of modules currently registered.
    pub async fn module_count(&self) -> usize {
        self.inner.state.lock().await.modules.len()
    }

    /// Destroy the gateway.
    ///
    /// Reports [`GatewayEvent::Destroyed`], removes every link, destroys
    /// every module in insertion order (detaching each from the broker and
    /// unloading its library), shuts the broker down, and finally tears
    /// down the event system. The event system drains its dispatch queue
    /// before exiting, so the `Destroyed` event is the last thing observers
    /// see.
    pub async fn destroy(self) {
        self.destroy_internal(true).await;
    }

    // ------------------------------------------------------------------
    // Internals (callers hold the controller lock where noted)
    // ------------------------------------------------------------------

    fn add_module_locked(
        &self,
        state: &mut GatewayState,
        entry: ModuleEntry,
    ) -> Result<ModuleHandle, GatewayError> {
        let ModuleEntry {
            name,
            loader: loader_name,
            entrypoint,
            configuration,
        } = entry;

        if name.is_empty()
            || name == super::config::WILDCARD_SOURCE
            || !name.chars().all(|c| c.is_ascii_graphic())
        {
            return Err(GatewayError::InvalidModuleName(name));
        }
        if state.modules.iter().any(|data| data.name == name) {
            return Err(GatewayError::DuplicateModuleName(name));
        }

        let loader = LoaderRegistry::global()
            .resolve(&loader_name)
            .ok_or(GatewayError::LoaderNotFound(loader_name))?;

        let library = loader.load(&entrypoint)?;

        let version = library.api_version();
        if version > GATEWAY_API_VERSION {
            loader.unload(library);
            return Err(GatewayError::UnsupportedApiVersion {
                module: name,
                version,
                supported: GATEWAY_API_VERSION,
            });
        }

        let built = match loader.build_module_configuration(&entrypoint, &configuration) {
            Ok(built) => built,
            Err(error) => {
                loader.unload(library);
                return Err(error.into());
            }
        };

        let module = match library.create(self.inner.broker.clone(), &built) {
            Ok(module) => module,
            Err(error) => {
                loader.unload(library);
                return Err(error.into());
            }
        };

        if let Err(error) = self.inner.broker.attach(&name, Arc::clone(&module)) {
            drop(module);
            loader.unload(library);
            return Err(error.into());
        }

        let handle = ModuleHandle::new();
        state.modules.push(ModuleData {
            name,
            handle,
            module,
            library,
            loader,
            started: false,
        });
        Ok(handle)
    }

    async fn remove_module_locked(&self, state: &mut GatewayState, index: usize) {
        let name = state.modules[index].name.clone();

        // Cascade: drop every link that references the module as either
        // endpoint, in the table and in the broker's routing view.
        let mut kept = Vec::with_capacity(state.links.len());
        for link in state.links.drain(..) {
            let touches =
                link.sink == name || (!link.from_any_source() && link.source == name);
            if touches {
                self.unsubscribe(&link);
            } else {
                kept.push(link);
            }
        }
        state.links = kept;

        if let Err(error) = self.inner.broker.detach(&name).await {
            debug!(module = %name, %error, "detach during module removal");
        }

        let data = state.modules.remove(index);
        let ModuleData {
            module,
            library,
            loader,
            ..
        } = data;
        // The delivery worker has exited, so this is the last instance
        // reference; dropping it runs the module's teardown.
        drop(module);
        loader.unload(library);
    }

    fn add_link_locked(
        &self,
        state: &mut GatewayState,
        entry: LinkEntry,
    ) -> Result<(), GatewayError> {
        if entry.source.is_empty() || entry.sink.is_empty() {
            return Err(GatewayError::InvalidLinkEntry);
        }
        if state.links.contains(&entry) {
            return Err(GatewayError::DuplicateLink {
                link_source: entry.source,
                sink: entry.sink,
            });
        }
        if !state.modules.iter().any(|data| data.name == entry.sink) {
            return Err(GatewayError::LinkEndpointNotFound(entry.sink));
        }

        if entry.from_any_source() {
            self.inner.broker.add_wildcard_subscription(&entry.sink)?;
        } else {
            if !state.modules.iter().any(|data| data.name == entry.source) {
                return Err(GatewayError::LinkEndpointNotFound(entry.source));
            }
            self.inner
                .broker
                .add_subscription(&entry.source, &entry.sink)?;
        }

        state.links.push(entry);
        Ok(())
    }

    fn unsubscribe(&self, link: &LinkEntry) {
        if link.from_any_source() {
            self.inner.broker.remove_wildcard_subscription(&link.sink);
        } else {
            self.inner.broker.remove_subscription(&link.source, &link.sink);
        }
    }

    /// Build the snapshot from the locked state, so a mutation and its
    /// `ModuleListChanged` context are captured atomically.
    fn snapshot_locked(state: &GatewayState) -> ModuleList {
        let modules = state
            .modules
            .iter()
            .map(|data| {
                let wildcard_fed = state
                    .links
                    .iter()
                    .any(|link| link.from_any_source() && link.sink == data.name);
                let sources = if wildcard_fed {
                    None
                } else {
                    Some(
                        state
                            .links
                            .iter()
                            .filter(|link| {
                                !link.from_any_source() && link.sink == data.name
                            })
                            .map(|link| link.source.clone())
                            .collect(),
                    )
                };
                ModuleInfo::new(data.name.clone(), sources)
            })
            .collect();
        ModuleList::new(modules)
    }

    fn report_module_list_changed(&self, state: &GatewayState) {
        let snapshot = Self::snapshot_locked(state);
        self.inner
            .events
            .report(GatewayEvent::ModuleListChanged, Some(snapshot));
    }

    async fn destroy_internal(&self, report: bool) {
        {
            let mut state = self.inner.state.lock().await;
            if state.destroyed {
                return;
            }
            state.destroyed = true;

            if report {
                self.inner.events.report(GatewayEvent::Destroyed, None);
            }

            for link in state.links.drain(..) {
                self.unsubscribe(&link);
            }

            // Insertion order, deterministically.
            while !state.modules.is_empty() {
                self.remove_module_locked_without_links(&mut state).await;
            }
        }

        self.inner.broker.shutdown().await;
        self.inner.events.destroy().await;
    }

    async fn remove_module_locked_without_links(&self, state: &mut GatewayState) {
        let data = state.modules.remove(0);
        if let Err(error) = self.inner.broker.detach(&data.name).await {
            debug!(module = %data.name, %error, "detach during gateway destroy");
        }
        let ModuleData {
            module,
            library,
            loader,
            ..
        } = data;
        drop(module);
        loader.unload(library);
    }
}
