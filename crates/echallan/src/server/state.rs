use std::sync::{Arc, Mutex};

use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::matcher::FaceMatcher;
use crate::storage::{SeedOptions, Storage};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    storage: Arc<Mutex<Storage>>,
    pub matcher: Arc<FaceMatcher>,
}

impl AppState {
    /// Build state around an opened store.
    ///
    /// Drivers are read once here; the store never mutates them afterwards,
    /// so the matcher is fixed for the lifetime of the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver list cannot be read.
    pub fn new(config: Config, storage: Storage) -> Result<Self> {
        let drivers = storage.driver_summaries()?;
        let matcher = FaceMatcher::new(drivers, &config.matching);

        Ok(Self {
            config: Arc::new(config),
            storage: Arc::new(Mutex::new(storage)),
            matcher: Arc::new(matcher),
        })
    }

    /// Open (and optionally seed) the configured database, then build state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or seeded.
    pub fn from_config(config: Config) -> Result<Self> {
        let storage = Storage::open(config.database_path())?;
        if config.storage.seed_on_open {
            let report = storage.seed(SeedOptions {
                random_drivers: config.storage.random_drivers,
                rng_seed: config.storage.seed_rng,
            })?;
            if !report.is_empty() {
                info!(?report, "Seeded empty tables");
            }
        }
        Self::new(config, storage)
    }

    /// Run `f` against the store on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or an internal error if the lock is
    /// poisoned or the blocking task panics.
    pub async fn with_storage<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let guard = storage
                .lock()
                .map_err(|_| Error::internal("storage lock poisoned"))?;
            f(&guard)
        })
        .await
        .map_err(|e| Error::internal(format!("storage task failed: {e}")))?
    }
}
