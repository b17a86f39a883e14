//! Engine - interface to the external IaC engine
//!
//! The engine itself is opaque: this layer only decides where it stores its
//! state (the login/logout URI) and which ingredients it is handed (the
//! flattened program). Engine failures are propagated verbatim; this layer
//! adds no interpretation and never retries.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ingredient::SharedIngredient;

/// Error from an engine invocation
#[derive(Debug)]
pub struct EngineError {
    /// The engine operation that failed ("login", "up", ...)
    pub operation: String,
    pub message: String,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "engine {} failed: {}", self.operation, self.message)
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl EngineError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Stack outputs keyed by export name.
pub type Outputs = HashMap<String, Value>;

/// Identifies the stack an engine verb operates on: the project name plus
/// the state URI the engine is currently logged in to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRef {
    pub project_name: String,
    pub state_uri: String,
}

/// One historical deployment of a stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSummary {
    /// The verb that ran ("up", "destroy", "refresh", ...)
    pub operation: String,
    /// Terminal result as reported by the engine
    pub result: String,
    /// Optional engine-provided message
    #[serde(default)]
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Execution context handed to each ingredient while a program runs.
///
/// Engine implementations construct one per run, apply the program's
/// ingredients in sequence, and read the exports back as stack outputs.
#[derive(Debug)]
pub struct StackContext {
    project_name: String,
    exports: Outputs,
}

impl StackContext {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            exports: Outputs::new(),
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Export a stack-level output value under `key`. A later export under
    /// the same key replaces the earlier one.
    pub fn export(&mut self, key: impl Into<String>, value: Value) {
        self.exports.insert(key.into(), value);
    }

    pub fn exports(&self) -> &Outputs {
        &self.exports
    }

    pub fn into_outputs(self) -> Outputs {
        self.exports
    }
}

/// Interface to the external IaC engine
///
/// `login`/`logout` are idempotent side effects keyed by a state URI. The
/// stack verbs are scoped by a [`StackRef`]; where a program is required it
/// is the full ordered ingredient list, flattened by the caller.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Log in to the state store at `uri`
    async fn login(&self, uri: &str) -> EngineResult<()>;

    /// Log out of the state store at `uri`
    async fn logout(&self, uri: &str) -> EngineResult<()>;

    /// Create or update the stack from the ordered program
    async fn up(&self, stack: &StackRef, program: &[SharedIngredient]) -> EngineResult<Outputs>;

    /// Preview the creation or update of the stack without applying it
    async fn preview(&self, stack: &StackRef, program: &[SharedIngredient]) -> EngineResult<()>;

    /// Delete all resources of the stack
    async fn destroy(&self, stack: &StackRef) -> EngineResult<()>;

    /// Remove the stack record itself; `force` removes it even when
    /// resources are still tracked
    async fn remove(&self, stack: &StackRef, force: bool) -> EngineResult<()>;

    /// Reconcile tracked resource state with what actually exists at the
    /// provider
    async fn refresh(&self, stack: &StackRef) -> EngineResult<()>;

    /// Current outputs of the stack
    async fn outputs(&self, stack: &StackRef) -> EngineResult<Outputs>;

    /// Past deployments of the stack, oldest first
    async fn history(&self, stack: &StackRef) -> EngineResult<Vec<UpdateSummary>>;
}
