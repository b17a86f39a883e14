//! Ingredient - the smallest declarative unit handed to the engine

use std::sync::Arc;

use serde_json::Value;

use crate::engine::StackContext;

/// Error raised by an ingredient while it is applied, or by a dependency
/// resolved before its referent has run
#[derive(Debug)]
pub struct IngredientError {
    pub message: String,
    /// Name of the offending ingredient, when known
    pub ingredient: Option<String>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for IngredientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref name) = self.ingredient {
            write!(f, "[{}] {}", name, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for IngredientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl IngredientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ingredient: None,
            cause: None,
        }
    }

    pub fn for_ingredient(mut self, name: impl Into<String>) -> Self {
        self.ingredient = Some(name.into());
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

/// Result type for ingredient operations
pub type IngredientResult<T> = Result<T, IngredientError>;

/// The smallest declarative unit consumed by the engine
///
/// An ingredient owns no children. `apply` runs within the execution context
/// the engine provides; once it has run, `result` exposes an arbitrary value
/// other ingredients may depend on. This layer enforces no ordering beyond
/// sequence position within a recipe; expressing a dependency between
/// ingredients is the caller's responsibility, optionally through a
/// [`Dependency`].
pub trait Ingredient: Send + Sync {
    /// Apply this ingredient within the given execution context
    fn apply(&self, ctx: &mut StackContext) -> IngredientResult<()>;

    /// The value produced by `apply`, or `None` while unapplied
    ///
    /// Implementations record the value with interior mutability so shared
    /// handles observe it after application.
    fn result(&self) -> Option<Value>;
}

/// Shared handle to an ingredient
///
/// Recipes hold clones of this handle; the caller keeps ownership and may
/// hand the same ingredient to several recipes (avoiding duplicates is the
/// caller's responsibility).
pub type SharedIngredient = Arc<dyn Ingredient>;

/// Deferred reference to another ingredient's result
///
/// Resolution is lazy: it succeeds only once the referent has been applied
/// and fails fast otherwise.
#[derive(Clone)]
pub struct Dependency {
    source: SharedIngredient,
}

impl Dependency {
    /// Capture a reference to `source`'s eventual result.
    pub fn on(source: &SharedIngredient) -> Self {
        Self {
            source: Arc::clone(source),
        }
    }

    /// The referent's result, or an error when it has not been applied yet.
    pub fn resolve(&self) -> IngredientResult<Value> {
        self.source.result().ok_or_else(|| {
            IngredientError::new("dependency resolved before its ingredient was applied")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct NamedValue {
        name: String,
        value: Value,
        applied: Mutex<Option<Value>>,
    }

    impl NamedValue {
        fn shared(name: &str, value: Value) -> SharedIngredient {
            Arc::new(Self {
                name: name.to_string(),
                value,
                applied: Mutex::new(None),
            })
        }
    }

    impl Ingredient for NamedValue {
        fn apply(&self, ctx: &mut StackContext) -> IngredientResult<()> {
            ctx.export(self.name.clone(), self.value.clone());
            *self.applied.lock().unwrap() = Some(self.value.clone());
            Ok(())
        }

        fn result(&self) -> Option<Value> {
            self.applied.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_result_none_until_applied() {
        let ingredient = NamedValue::shared("db", serde_json::json!("postgres://db"));
        assert!(ingredient.result().is_none());

        let mut ctx = StackContext::new("proj");
        ingredient.apply(&mut ctx).unwrap();

        assert_eq!(ingredient.result(), Some(serde_json::json!("postgres://db")));
        assert_eq!(
            ctx.exports().get("db"),
            Some(&serde_json::json!("postgres://db"))
        );
    }

    #[test]
    fn test_dependency_fails_fast_before_apply() {
        let ingredient = NamedValue::shared("db", serde_json::json!("postgres://db"));
        let dependency = Dependency::on(&ingredient);

        let err = dependency.resolve().unwrap_err();
        assert!(err.to_string().contains("before its ingredient was applied"));
    }

    #[test]
    fn test_dependency_resolves_after_apply() {
        let ingredient = NamedValue::shared("db", serde_json::json!("postgres://db"));
        let dependency = Dependency::on(&ingredient);

        let mut ctx = StackContext::new("proj");
        ingredient.apply(&mut ctx).unwrap();

        assert_eq!(dependency.resolve().unwrap(), serde_json::json!("postgres://db"));
    }

    #[test]
    fn test_ingredient_error_display() {
        let error = IngredientError::new("apply failed").for_ingredient("db");
        assert_eq!(error.to_string(), "[db] apply failed");

        let error = IngredientError::new("apply failed");
        assert_eq!(error.to_string(), "apply failed");
    }
}
