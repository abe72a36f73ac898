//! Execution context: immutable variable scope threaded through a
//! template execution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::extensions::ProcessorResolver;
use crate::value::Value;

/// Immutable execution context: the resolver handle plus a layered
/// variable scope.
///
/// Execution-scoped variables are set once at creation and shared by
/// reference; node-local variables accumulate in a copy-on-extend overlay
/// created at explicit [`derive_with`](Context::derive_with) points. The
/// original context is never mutated.
#[derive(Clone)]
pub struct Context {
    resolver: Arc<dyn ProcessorResolver>,
    variables: Arc<HashMap<String, Value>>,
    local_variables: HashMap<String, Value>,
}

impl Context {
    pub fn new(resolver: Arc<dyn ProcessorResolver>) -> Self {
        Self {
            resolver,
            variables: Arc::new(HashMap::new()),
            local_variables: HashMap::new(),
        }
    }

    pub fn with_variables(
        resolver: Arc<dyn ProcessorResolver>,
        variables: HashMap<String, Value>,
    ) -> Self {
        Self {
            resolver,
            variables: Arc::new(variables),
            local_variables: HashMap::new(),
        }
    }

    pub fn resolver(&self) -> &Arc<dyn ProcessorResolver> {
        &self.resolver
    }

    /// Derive a new context layering `bindings` over the current scope.
    /// New bindings win on name collision; `self` is left untouched.
    pub fn derive_with(&self, bindings: HashMap<String, Value>) -> Context {
        let mut local_variables = self.local_variables.clone();
        local_variables.extend(bindings);
        Context {
            resolver: Arc::clone(&self.resolver),
            variables: Arc::clone(&self.variables),
            local_variables,
        }
    }

    pub fn has_local_variables(&self) -> bool {
        !self.local_variables.is_empty()
    }

    pub fn local_variables(&self) -> &HashMap<String, Value> {
        &self.local_variables
    }

    /// Look up a variable; node-local overlays shadow execution-scoped
    /// variables.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.local_variables
            .get(name)
            .or_else(|| self.variables.get(name))
    }
}
