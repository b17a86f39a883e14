//! Galley Core
//!
//! Core library for the Galley deployment tool. It provides the composition
//! model for declarative infrastructure (Ingredient / Recipe / Chef), the
//! interface to the external IaC engine, and the naming utilities used to
//! derive store and bucket names.
//!
//! # Overview
//!
//! - **Ingredient**: the smallest declarative unit; applied within an
//!   execution context, it exposes a result other ingredients may depend on
//! - **Recipe**: a named, ordered, append-only group of ingredients
//! - **Chef**: one deployable stack; flattens its recipes into a single
//!   ordered program and delegates lifecycle verbs to the engine
//! - **Engine**: the external IaC engine, consumed as an opaque collaborator
//!   (login/logout keyed by a state URI, plus the stack verbs)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use galley_core::{Chef, Recipe};
//!
//! let mut web = Recipe::new("web");
//! web.append([load_balancer.clone(), web_server.clone()]);
//!
//! let mut chef = Chef::new("my-app-prd", state_uri, engine);
//! chef.append([web]);
//!
//! let outputs = chef.up().await?;
//! ```

pub mod chef;
pub mod engine;
pub mod ingredient;
pub mod naming;
pub mod recipe;

// Re-export main types for convenience
pub use chef::Chef;
pub use engine::{Engine, EngineError, EngineResult, Outputs, StackContext, StackRef, UpdateSummary};
pub use ingredient::{Dependency, Ingredient, IngredientError, IngredientResult, SharedIngredient};
pub use naming::{Application, Environment, state_store_name};
pub use recipe::Recipe;
