//! Runtime orchestration: configuration, storage, dispatch and shutdown.
//!
//! ```rust,ignore
//! use herald_runtime::HeraldRuntime;
//!
//! let runtime = HeraldRuntime::builder()
//!     .config_file("config/herald.toml")
//!     .profile("production")
//!     .build(client, router)
//!     .await?;
//!
//! // Runs until Ctrl+C / SIGTERM or until the source is exhausted.
//! runtime.run(updates).await;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use herald_core::{ChatClient, Translator, Update};
use herald_framework::{BotApi, Dispatcher, Router};
use herald_storage::Storage;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigLoader, HeraldConfig, StorageBackend, StorageConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;
use crate::source::UpdateSource;

/// Pulls updates from an [`UpdateSource`] and dispatches each on its own
/// tracked task.
pub struct HeraldRuntime {
    config: HeraldConfig,
    dispatcher: Dispatcher,
    tracker: TaskTracker,
    background: CancellationToken,
    sweepers: Vec<JoinHandle<()>>,
}

impl HeraldRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &HeraldConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Number of dispatches still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Runs until Ctrl+C, SIGTERM or the end of `source`.
    pub async fn run<S: UpdateSource>(self, source: S) {
        info!("Herald runtime is now running. Press Ctrl+C to stop.");
        self.run_until(source, wait_for_shutdown()).await;
    }

    /// Runs until `shutdown` resolves or `source` is exhausted, then waits up
    /// to the configured grace period for in-flight dispatches.
    pub async fn run_until<S, F>(mut self, mut source: S, shutdown: F)
    where
        S: UpdateSource,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                next = source.next_update() => match next {
                    Some(update) => self.spawn_dispatch(update),
                    None => {
                        info!("Update source exhausted");
                        break;
                    }
                },
            }
        }

        self.drain().await;
    }

    fn spawn_dispatch(&self, update: Update) {
        let dispatcher = self.dispatcher.clone();
        self.tracker.spawn(async move {
            let dispatched = dispatcher.dispatch(update).await;
            let update_type = dispatched.update_type;
            let outcomes = dispatched.join().await;
            let faulted = outcomes.iter().filter(|o| o.is_faulted()).count();
            if faulted > 0 {
                warn!(?update_type, faulted, "Dispatch finished with faulted handlers");
            }
        });
    }

    async fn drain(&mut self) {
        self.tracker.close();
        let grace = self.config.dispatch.shutdown_grace();

        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => debug!("All dispatches finished"),
            Err(_) => warn!(
                pending = self.tracker.len(),
                grace_secs = grace.as_secs(),
                "Grace period elapsed, abandoning in-flight dispatches"
            ),
        }

        self.background.cancel();
        for sweeper in self.sweepers.drain(..) {
            if let Err(e) = sweeper.await {
                error!(error = %e, "Storage sweeper ended abnormally");
            }
        }
        info!("Runtime stopped");
    }
}

/// Waits for Ctrl+C or, on unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler, listening for Ctrl+C only");
                ctrl_c().await;
                info!("Received Ctrl+C, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
        info!("Received Ctrl+C, shutting down");
    }
}

async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`HeraldRuntime`].
///
/// ```rust,ignore
/// let runtime = HeraldRuntime::builder()
///     .config_file("config/production.toml")
///     .translator(Arc::new(my_translator))
///     .build(client, router)
///     .await?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    config: Option<HeraldConfig>,
    storage: Option<Storage>,
    translator: Option<Arc<dyn Translator>>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            config: None,
            storage: None,
            translator: None,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration programmatically, below files and environment.
    pub fn merge(mut self, config: HeraldConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Uses `config` as is and skips file and environment loading.
    pub fn with_config(mut self, config: HeraldConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses `storage` instead of building the configured backend.
    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Loads configuration, initializes logging, connects storage and wires
    /// the dispatcher.
    pub async fn build(
        self,
        client: Arc<dyn ChatClient>,
        router: Router,
    ) -> RuntimeResult<HeraldRuntime> {
        let config = match self.config {
            Some(config) => {
                validate_config(&config)?;
                config
            }
            None => self.config_loader.load()?,
        };

        logging::init_from_config(&config.logging);
        logging::install_panic_hook();

        let background = CancellationToken::new();
        let (storage, sweepers) = match self.storage {
            Some(storage) => (storage, Vec::new()),
            None => connect_storage(&config.storage, &background).await?,
        };

        let mut bot = BotApi::new(client, storage).with_settings(config.dispatch.to_settings());
        if let Some(translator) = self.translator {
            bot = bot.with_translator(translator);
        }

        info!(
            log_level = %config.logging.level,
            backend = ?config.storage.backend,
            commands = router.command_names().len(),
            callback_routes = router.callback_route_names().len(),
            "Runtime initialized from configuration"
        );

        Ok(HeraldRuntime {
            dispatcher: Dispatcher::new(router, bot),
            tracker: TaskTracker::new(),
            background,
            sweepers,
            config,
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn connect_storage(
    config: &StorageConfig,
    background: &CancellationToken,
) -> RuntimeResult<(Storage, Vec<JoinHandle<()>>)> {
    match config.backend {
        StorageBackend::Memory => {
            let (storage, backends) = Storage::in_memory();
            let sweepers = backends.spawn_sweepers(config.sweep_interval(), background.clone());
            debug!(interval_secs = config.sweep_interval_secs, "In-memory storage ready");
            Ok((storage, sweepers))
        }
        #[cfg(feature = "redis")]
        StorageBackend::Redis => {
            // Validation guarantees the URL for the redis backend.
            let url = config.redis_url.as_deref().unwrap_or_default();
            let storage = Storage::redis(url).await?;
            debug!("Redis storage ready");
            Ok((storage, Vec::new()))
        }
        #[cfg(not(feature = "redis"))]
        StorageBackend::Redis => Err(crate::error::RuntimeError::BackendUnavailable("redis")),
    }
}
