//! Galley State Store Management
//!
//! This crate provisions and tears down the durable backend the external
//! IaC engine uses to persist the state of a deployed stack. Two backends
//! are provided: a local filesystem directory (`file://` URI) and an S3
//! bucket (`s3://` URI).
//!
//! The bucket backend owns the failure-prone part of the system: idempotent
//! provisioning with security defaults applied on first creation, and a
//! complete version-aware forced deletion. A versioned bucket cannot be
//! deleted while any object version or delete marker remains, and listings
//! are paginated, so the purge drains two independent listings in full
//! before the bucket delete is issued.
//!
//! # Example
//!
//! ```ignore
//! use std::collections::HashMap;
//! use galley_core::naming::{state_store_name, Application, Environment};
//! use galley_state::{S3StateStore, S3StoreConfig, StateStore};
//!
//! let app = Application::new("My App!");
//! let base = state_store_name(&app, Environment::Production); // "my-app-prd"
//!
//! let config = S3StoreConfig::from_env(base, HashMap::new());
//! let store = S3StateStore::connect(config, engine).await?;
//!
//! let uri = store.open().await?; // "s3://my-app-prd-state"
//! // ... bind a Chef to `uri`, deploy ...
//! store.close().await?;
//!
//! // Tear down: purge every object version and delete marker, then the
//! // bucket itself.
//! store.delete(true).await?;
//! ```

pub mod objects;
pub mod store;
pub mod stores;

// Re-export main types for convenience
pub use objects::{
    ObjectPage, ObjectStorage, ObjectVersionRef, S3ObjectStorage, VersionMarker, VersionPage,
};
pub use store::{StateStore, StoreError, StoreResult};
pub use stores::{
    LocalStateStore, S3Credentials, S3StateStore, S3StoreConfig, local_store, s3_store,
};
