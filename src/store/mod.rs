//! Module store trait and implementations
//!
//! A store persists the files of a new module. GitHub (through the REST
//! contents API) and a local directory are supported.

mod error;
mod github;
mod local;

pub use error::StoreError;
pub use github::{parse_repo_string, GitHubModuleStore};
pub use local::LocalModuleStore;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{Config, StoreBackend};

/// Everything a store needs to create one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateModuleRequest {
    pub module_name: String,
    pub algorithm_type: String,
    pub module_category: String,
    /// File contents keyed by file name
    pub files: BTreeMap<String, String>,
}

impl CreateModuleRequest {
    /// Commit message used by version-controlled stores
    pub fn commit_message(&self) -> String {
        let mut details = Vec::new();
        if !self.module_category.trim().is_empty() {
            details.push(self.module_category.trim());
        }
        if !self.algorithm_type.trim().is_empty() {
            details.push(self.algorithm_type.trim());
        }

        if details.is_empty() {
            format!("Add module {}", self.module_name)
        } else {
            format!("Add module {} ({})", self.module_name, details.join(", "))
        }
    }
}

/// Trait for module stores (GitHub repository, local directory)
#[async_trait]
pub trait ModuleStore: Send + Sync {
    /// Get the store name (e.g., "github", "local")
    fn name(&self) -> &str;

    /// Persist all files of a new module. Fails if the module already exists.
    async fn create(&self, request: &CreateModuleRequest) -> Result<(), StoreError>;

    /// Names of the modules already stored
    async fn list(&self) -> Result<Vec<String>, StoreError>;
}

/// Reject names that would escape the module directory
pub(crate) fn ensure_plain_name(store: &str, module_name: &str) -> Result<(), StoreError> {
    let invalid = module_name.trim().is_empty()
        || module_name == "."
        || module_name == ".."
        || module_name.contains(['/', '\\']);
    if invalid {
        Err(StoreError::invalid_module_name(store, module_name))
    } else {
        Ok(())
    }
}

/// Build the store selected in the configuration
pub fn from_config(config: &Config) -> Result<Arc<dyn ModuleStore>, StoreError> {
    match config.store.backend {
        StoreBackend::GitHub => {
            let store = GitHubModuleStore::from_config(&config.store.github)?;
            tracing::info!(repo = %config.store.github.repo, "Using GitHub module store");
            Ok(Arc::new(store))
        }
        StoreBackend::Local => {
            let root = config.local_store_path();
            tracing::info!(path = %root.display(), "Using local module store");
            Ok(Arc::new(LocalModuleStore::new(root)))
        }
    }
}
