use std::collections::HashMap;
use std::sync::Arc;

use flowrag_graph::ComponentCatalog;
use tracing::debug;

use crate::builtin::{Knowledgebase, LlmEngine, Output, UserQuery};
use crate::component::Component;

/// Maps component-type tags to runnable implementations.
///
/// Built once at process start via [`RegistryBuilder`] and immutable
/// afterwards; runs only read from it.
pub struct ComponentRegistry {
  components: HashMap<String, Arc<dyn Component>>,
}

impl ComponentRegistry {
  pub fn builder() -> RegistryBuilder {
    RegistryBuilder {
      components: HashMap::new(),
    }
  }

  /// A registry populated with the built-in component set.
  pub fn builtin() -> Self {
    Self::builder()
      .register("user_query", UserQuery)
      .register("knowledgebase", Knowledgebase)
      .register("llm_engine", LlmEngine)
      .register("output", Output)
      .build()
  }

  /// Resolve a component implementation by its type tag.
  pub fn get(&self, component_type: &str) -> Option<Arc<dyn Component>> {
    self.components.get(component_type).cloned()
  }

  /// Registered type tags, sorted.
  pub fn component_types(&self) -> Vec<&str> {
    let mut types: Vec<&str> = self.components.keys().map(|k| k.as_str()).collect();
    types.sort_unstable();
    types
  }
}

impl ComponentCatalog for ComponentRegistry {
  fn contains(&self, component_type: &str) -> bool {
    self.components.contains_key(component_type)
  }
}

/// Builder for a [`ComponentRegistry`].
///
/// Later registrations under the same tag replace earlier ones, so callers
/// can override a built-in with their own implementation.
pub struct RegistryBuilder {
  components: HashMap<String, Arc<dyn Component>>,
}

impl RegistryBuilder {
  pub fn register(
    mut self,
    component_type: impl Into<String>,
    component: impl Component + 'static,
  ) -> Self {
    let component_type = component_type.into();
    debug!(component_type = %component_type, "registering component");
    self.components.insert(component_type, Arc::new(component));
    self
  }

  pub fn build(self) -> ComponentRegistry {
    ComponentRegistry {
      components: self.components,
    }
  }
}
