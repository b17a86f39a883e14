//! Local filesystem state store
//!
//! Backs the engine's state with a plain directory and treats its absolute
//! path as a `file://` URI. Intended for development and single-machine use.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error};

use galley_core::engine::Engine;

use crate::store::{StateStore, StoreError, StoreResult};

/// Directory-backed state store
pub struct LocalStateStore {
    /// Base directory holding the store folder
    path: PathBuf,
    /// Name of the store folder
    name: String,
    /// Engine logged in and out of the derived URI
    engine: Arc<dyn Engine>,
}

impl LocalStateStore {
    /// Default store folder name
    pub const DEFAULT_STORE_NAME: &'static str = ".statestore";

    /// Create a store under the current directory with the default name.
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self::with_location(".", Self::DEFAULT_STORE_NAME, engine)
    }

    /// Create a store under `path` with the folder `name`. Empty values
    /// fall back to the defaults.
    pub fn with_location(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        engine: Arc<dyn Engine>,
    ) -> Self {
        let mut path = path.into();
        if path.as_os_str().is_empty() {
            path = PathBuf::from(".");
        }

        let mut name = name.into();
        if name.is_empty() {
            name = Self::DEFAULT_STORE_NAME.to_string();
        }

        Self { path, name, engine }
    }

    /// The directory backing this store.
    pub fn store_path(&self) -> PathBuf {
        self.path.join(&self.name)
    }

    fn state_uri(&self) -> StoreResult<String> {
        let abs = std::path::absolute(self.store_path())
            .map_err(|e| StoreError::Io(format!("Failed to resolve store path: {}", e)))?;
        Ok(format!("file://{}", abs.display()))
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn open(&self) -> StoreResult<String> {
        let store_path = self.store_path();
        let uri = self.state_uri()?;

        debug!("opening local state store at {}", store_path.display());

        std::fs::create_dir_all(&store_path).map_err(|e| {
            error!(
                "failed to create state store directory {}: {}",
                store_path.display(),
                e
            );
            StoreError::Io(format!(
                "Failed to create store directory {}: {}",
                store_path.display(),
                e
            ))
        })?;

        self.engine.login(&uri).await?;

        Ok(uri)
    }

    async fn close(&self) -> StoreResult<()> {
        let uri = self.state_uri()?;

        debug!("closing local state store {}", uri);

        self.engine.logout(&uri).await?;

        Ok(())
    }

    async fn delete(&self, force: bool) -> StoreResult<()> {
        self.close().await?;

        let store_path = self.store_path();

        debug!(
            "deleting local state store at {} (force: {})",
            store_path.display(),
            force
        );

        let removed = if force {
            std::fs::remove_dir_all(&store_path)
        } else {
            // Refuses non-empty directories
            std::fs::remove_dir(&store_path)
        };

        removed.map_err(|e| {
            error!(
                "failed to remove state store directory {}: {}",
                store_path.display(),
                e
            );
            StoreError::Io(format!(
                "Failed to remove store directory {}: {}",
                store_path.display(),
                e
            ))
        })
    }
}
