//! Function catalog — resolved deployment template contents.
//!
//! The catalog is the read-only mapping from logical function identifier to
//! its specification. It is built once at startup from the deployment
//! template and is safe for concurrent reads from any number of tasks; the
//! server never mutates it.

pub mod function;
pub mod template;

pub use function::{DebugConfig, FunctionSpec};
pub use template::{load_template, TemplateOptions};

use crate::error::TemplateError;
use crate::protocol::extract_function_name;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Read-only catalog of invocable functions.
pub struct FunctionCatalog {
    functions: HashMap<String, Arc<FunctionSpec>>,
}

impl FunctionCatalog {
    /// Load the catalog from a deployment template.
    ///
    /// Fails fast: any template or env-vars-file problem is returned before
    /// the server binds its socket.
    pub fn load(template_path: &Path, options: &TemplateOptions) -> Result<Self, TemplateError> {
        let specs = load_template(template_path, options)?;
        Ok(Self::from_specs(specs))
    }

    /// Build a catalog directly from specifications.
    pub fn from_specs(specs: Vec<FunctionSpec>) -> Self {
        let mut functions = HashMap::with_capacity(specs.len());
        for spec in specs {
            let name = spec.name.clone();
            if functions.insert(name.clone(), Arc::new(spec)).is_some() {
                warn!(function = %name, "Duplicate function identifier; keeping the last definition");
            }
        }
        Self { functions }
    }

    /// Resolve a function by identifier. Accepts a bare name or a full
    /// ARN-style identifier.
    pub fn resolve(&self, identifier: &str) -> Option<Arc<FunctionSpec>> {
        self.functions
            .get(extract_function_name(identifier))
            .cloned()
    }

    /// Number of functions in the catalog.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the catalog holds no functions.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Function identifiers, sorted for stable output.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn spec(name: &str) -> FunctionSpec {
        FunctionSpec {
            name: name.to_string(),
            handler: "app.handler".to_string(),
            runtime: "python3.12".to_string(),
            memory_mb: 128,
            timeout_secs: 3,
            env_vars: BTreeMap::new(),
            code_uri: ".".to_string(),
            debug: None,
        }
    }

    #[test]
    fn test_resolve_by_name() {
        let catalog = FunctionCatalog::from_specs(vec![spec("HelloWorld")]);
        assert!(catalog.resolve("HelloWorld").is_some());
        assert!(catalog.resolve("Missing").is_none());
    }

    #[test]
    fn test_resolve_by_arn() {
        let catalog = FunctionCatalog::from_specs(vec![spec("HelloWorld")]);
        let arn = "arn:aws:lambda:us-east-1:012345678901:function:HelloWorld";
        assert!(catalog.resolve(arn).is_some());
    }

    #[test]
    fn test_duplicate_identifiers_keep_last() {
        let mut second = spec("Fn");
        second.memory_mb = 512;
        let catalog = FunctionCatalog::from_specs(vec![spec("Fn"), second]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.resolve("Fn").unwrap().memory_mb, 512);
    }

    #[test]
    fn test_names_sorted() {
        let catalog = FunctionCatalog::from_specs(vec![spec("Zeta"), spec("Alpha")]);
        assert_eq!(catalog.names(), vec!["Alpha".to_string(), "Zeta".to_string()]);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = FunctionCatalog::from_specs(Vec::new());
        assert!(catalog.is_empty());
    }
}
