use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::adapter::ToolSpec;
use crate::catalog::{self, CatalogError};
use crate::schema::{check_schema, SchemaValidationError};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{0}' is registered twice")]
    Duplicate(String),

    #[error("tool '{name}' has an invalid input schema: {source}")]
    Schema {
        name: String,
        #[source]
        source: SchemaValidationError,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Tool name → spec. Listing order is by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<ToolSpec>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the named catalogs, or every catalog for `None`.
    pub fn from_catalogs(names: Option<&[String]>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for spec in catalog::select(names)? {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, spec: ToolSpec) -> Result<(), RegistryError> {
        if self.tools.contains_key(&spec.name) {
            return Err(RegistryError::Duplicate(spec.name));
        }
        check_schema(&spec.input_schema()).map_err(|source| RegistryError::Schema {
            name: spec.name.clone(),
            source,
        })?;
        self.tools.insert(spec.name.clone(), Arc::new(spec));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<ToolSpec>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// `tools/list` entries.
    pub fn descriptors(&self) -> Vec<Value> {
        self.tools
            .values()
            .map(|spec| {
                json!({
                    "name": spec.name,
                    "description": spec.description,
                    "inputSchema": spec.input_schema()
                })
            })
            .collect()
    }
}
