//! Chef - stack-level coordinator
//!
//! A chef represents one deployable stack. It owns recipes, flattens their
//! ingredients into a single ordered program, and delegates every lifecycle
//! verb to the engine bound to its project name and state URI.

use std::sync::Arc;

use log::debug;

use crate::engine::{Engine, EngineResult, Outputs, StackRef, UpdateSummary};
use crate::ingredient::SharedIngredient;
use crate::recipe::Recipe;

/// One deployable stack: a project name, the URI of an opened state store,
/// and the recipes that make up the stack's program.
///
/// The chef is the sole caller of the engine for its stack. It never touches
/// the state store itself; store lifetime is managed by the caller through
/// `StateStore::delete`, not implicitly tied to stack destruction.
pub struct Chef {
    project_name: String,
    state_uri: String,
    engine: Arc<dyn Engine>,
    recipes: Vec<Recipe>,
}

impl Chef {
    /// Bind a chef to a project and the URI returned by an opened state
    /// store.
    pub fn new(
        project_name: impl Into<String>,
        state_uri: impl Into<String>,
        engine: Arc<dyn Engine>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            state_uri: state_uri.into(),
            engine,
            recipes: Vec::new(),
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn state_uri(&self) -> &str {
        &self.state_uri
    }

    /// Append recipes to the stack, preserving order.
    pub fn append<I>(&mut self, recipes: I)
    where
        I: IntoIterator<Item = Recipe>,
    {
        self.recipes.extend(recipes);
    }

    fn stack(&self) -> StackRef {
        StackRef {
            project_name: self.project_name.clone(),
            state_uri: self.state_uri.clone(),
        }
    }

    /// All ingredients across all recipes: recipe-append order, then
    /// per-recipe insertion order.
    fn program(&self) -> Vec<SharedIngredient> {
        self.recipes
            .iter()
            .flat_map(|recipe| recipe.ingredients().iter().cloned())
            .collect()
    }

    /// Create or update the stack.
    pub async fn up(&self) -> EngineResult<Outputs> {
        let program = self.program();
        debug!(
            "chef up: project={} ingredients={}",
            self.project_name,
            program.len()
        );
        self.engine.up(&self.stack(), &program).await
    }

    /// Preview the creation or update of the stack.
    pub async fn preview(&self) -> EngineResult<()> {
        let program = self.program();
        debug!(
            "chef preview: project={} ingredients={}",
            self.project_name,
            program.len()
        );
        self.engine.preview(&self.stack(), &program).await
    }

    /// Delete all of the stack's resources.
    pub async fn down(&self) -> EngineResult<()> {
        debug!("chef down: project={}", self.project_name);
        self.engine.destroy(&self.stack()).await
    }

    /// Delete the stack's resources, then remove the stack record itself.
    /// `force` removes the record even when resources are still tracked.
    /// The bound state store is left untouched.
    pub async fn destroy(&self, force: bool) -> EngineResult<()> {
        debug!(
            "chef destroy: project={} force={}",
            self.project_name, force
        );
        self.engine.destroy(&self.stack()).await?;
        self.engine.remove(&self.stack(), force).await
    }

    /// Reconcile tracked resource state with what actually exists at the
    /// provider.
    pub async fn refresh(&self) -> EngineResult<()> {
        debug!("chef refresh: project={}", self.project_name);
        self.engine.refresh(&self.stack()).await
    }

    /// Current stack outputs.
    pub async fn results(&self) -> EngineResult<Outputs> {
        self.engine.outputs(&self.stack()).await
    }

    /// Deployment history of the stack.
    pub async fn history(&self) -> EngineResult<Vec<UpdateSummary>> {
        self.engine.history(&self.stack()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::StackContext;
    use crate::ingredient::{Ingredient, IngredientResult};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Engine that applies programs in order and records every call.
    struct RecordingEngine {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingEngine {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn run(&self, stack: &StackRef, program: &[SharedIngredient]) -> Outputs {
            let mut ctx = StackContext::new(stack.project_name.clone());
            for ingredient in program {
                ingredient.apply(&mut ctx).unwrap();
            }
            ctx.into_outputs()
        }
    }

    #[async_trait]
    impl Engine for RecordingEngine {
        async fn login(&self, uri: &str) -> EngineResult<()> {
            self.record(format!("login {}", uri));
            Ok(())
        }

        async fn logout(&self, uri: &str) -> EngineResult<()> {
            self.record(format!("logout {}", uri));
            Ok(())
        }

        async fn up(&self, stack: &StackRef, program: &[SharedIngredient]) -> EngineResult<Outputs> {
            self.record(format!("up {} @ {}", stack.project_name, stack.state_uri));
            Ok(self.run(stack, program))
        }

        async fn preview(
            &self,
            stack: &StackRef,
            program: &[SharedIngredient],
        ) -> EngineResult<()> {
            self.record(format!("preview {}", stack.project_name));
            self.run(stack, program);
            Ok(())
        }

        async fn destroy(&self, stack: &StackRef) -> EngineResult<()> {
            self.record(format!("destroy {}", stack.project_name));
            Ok(())
        }

        async fn remove(&self, stack: &StackRef, force: bool) -> EngineResult<()> {
            self.record(format!("remove {} force={}", stack.project_name, force));
            Ok(())
        }

        async fn refresh(&self, stack: &StackRef) -> EngineResult<()> {
            self.record(format!("refresh {}", stack.project_name));
            Ok(())
        }

        async fn outputs(&self, stack: &StackRef) -> EngineResult<Outputs> {
            self.record(format!("outputs {}", stack.project_name));
            Ok(Outputs::new())
        }

        async fn history(&self, stack: &StackRef) -> EngineResult<Vec<UpdateSummary>> {
            self.record(format!("history {}", stack.project_name));
            Ok(Vec::new())
        }
    }

    /// Ingredient that logs its label when applied.
    struct Tracked {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Ingredient for Tracked {
        fn apply(&self, ctx: &mut StackContext) -> IngredientResult<()> {
            self.log.lock().unwrap().push(self.label.to_string());
            ctx.export(self.label, Value::Bool(true));
            Ok(())
        }

        fn result(&self) -> Option<Value> {
            None
        }
    }

    fn tracked(label: &'static str, log: &Arc<Mutex<Vec<String>>>) -> SharedIngredient {
        Arc::new(Tracked {
            label,
            log: Arc::clone(log),
        })
    }

    #[tokio::test]
    async fn test_up_flattens_recipes_in_order() {
        let applied = Arc::new(Mutex::new(Vec::<String>::new()));
        let engine = RecordingEngine::new();

        let mut first = Recipe::new("first");
        first.append([tracked("a", &applied), tracked("b", &applied)]);
        let mut second = Recipe::new("second");
        second.append([tracked("c", &applied)]);

        let mut chef = Chef::new("my-app-prd", "s3://my-app-prd-state", engine.clone());
        chef.append([first, second]);

        let outputs = chef.up().await.unwrap();

        assert_eq!(*applied.lock().unwrap(), ["a", "b", "c"]);
        assert_eq!(outputs.len(), 3);
        assert_eq!(
            engine.calls(),
            ["up my-app-prd @ s3://my-app-prd-state"]
        );
    }

    #[tokio::test]
    async fn test_destroy_removes_stack_after_resources() {
        let applied = Arc::new(Mutex::new(Vec::<String>::new()));
        let engine = RecordingEngine::new();

        let chef = Chef::new("my-app-prd", "s3://my-app-prd-state", engine.clone());
        chef.destroy(true).await.unwrap();

        assert_eq!(
            engine.calls(),
            ["destroy my-app-prd", "remove my-app-prd force=true"]
        );
    }

    #[tokio::test]
    async fn test_verbs_delegate_scoped_by_project() {
        let applied = Arc::new(Mutex::new(Vec::<String>::new()));
        let engine = RecordingEngine::new();

        let chef = Chef::new("billing-int", "file:///tmp/state", engine.clone());
        assert_eq!(chef.project_name(), "billing-int");
        assert_eq!(chef.state_uri(), "file:///tmp/state");

        chef.preview().await.unwrap();
        chef.refresh().await.unwrap();
        chef.down().await.unwrap();
        chef.results().await.unwrap();
        chef.history().await.unwrap();

        assert_eq!(
            engine.calls(),
            [
                "preview billing-int",
                "refresh billing-int",
                "destroy billing-int",
                "outputs billing-int",
                "history billing-int"
            ]
        );
    }
}
