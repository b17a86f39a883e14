//! State store backends

pub mod local;
pub mod s3;

pub use local::LocalStateStore;
pub use s3::{S3Credentials, S3StateStore, S3StoreConfig};

use std::path::PathBuf;
use std::sync::Arc;

use galley_core::engine::Engine;

use crate::store::{StateStore, StoreResult};

/// Local filesystem store behind the [`StateStore`] interface
///
/// Empty `path` or `name` fall back to the defaults ("." and ".statestore").
pub fn local_store(
    path: impl Into<PathBuf>,
    name: impl Into<String>,
    engine: Arc<dyn Engine>,
) -> Box<dyn StateStore> {
    Box::new(LocalStateStore::with_location(path, name, engine))
}

/// S3 bucket store behind the [`StateStore`] interface
pub async fn s3_store(
    config: S3StoreConfig,
    engine: Arc<dyn Engine>,
) -> StoreResult<Box<dyn StateStore>> {
    let store = S3StateStore::connect(config, engine).await?;
    Ok(Box::new(store))
}

#[cfg(test)]
pub(crate) mod test_engine {
    //! Recording engine shared by the backend tests

    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use galley_core::engine::{Engine, EngineResult, Outputs, StackRef, UpdateSummary};
    use galley_core::ingredient::SharedIngredient;

    #[derive(Default)]
    pub struct RecordingEngine {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingEngine {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Engine for RecordingEngine {
        async fn login(&self, uri: &str) -> EngineResult<()> {
            self.calls.lock().unwrap().push(format!("login {}", uri));
            Ok(())
        }

        async fn logout(&self, uri: &str) -> EngineResult<()> {
            self.calls.lock().unwrap().push(format!("logout {}", uri));
            Ok(())
        }

        async fn up(
            &self,
            _stack: &StackRef,
            _program: &[SharedIngredient],
        ) -> EngineResult<Outputs> {
            Ok(Outputs::new())
        }

        async fn preview(
            &self,
            _stack: &StackRef,
            _program: &[SharedIngredient],
        ) -> EngineResult<()> {
            Ok(())
        }

        async fn destroy(&self, _stack: &StackRef) -> EngineResult<()> {
            Ok(())
        }

        async fn remove(&self, _stack: &StackRef, _force: bool) -> EngineResult<()> {
            Ok(())
        }

        async fn refresh(&self, _stack: &StackRef) -> EngineResult<()> {
            Ok(())
        }

        async fn outputs(&self, _stack: &StackRef) -> EngineResult<Outputs> {
            Ok(Outputs::new())
        }

        async fn history(&self, _stack: &StackRef) -> EngineResult<Vec<UpdateSummary>> {
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_store_behind_interface() {
        let dir = tempdir().unwrap();
        let engine = test_engine::RecordingEngine::new();

        let store = local_store(dir.path(), "state", engine.clone());
        let uri = store.open().await.unwrap();
        assert!(uri.starts_with("file://"));

        store.delete(false).await.unwrap();
        assert!(!dir.path().join("state").exists());
    }
}
