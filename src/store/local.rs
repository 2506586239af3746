//! Module store backed by a local directory

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{ensure_plain_name, CreateModuleRequest, ModuleStore, StoreError};

const STORE_NAME: &str = "local";

/// Writes each module to `{root}/{module_name}/`
pub struct LocalModuleStore {
    root: PathBuf,
}

impl LocalModuleStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn io_error(e: std::io::Error) -> StoreError {
        StoreError::io(STORE_NAME, e)
    }
}

#[async_trait]
impl ModuleStore for LocalModuleStore {
    fn name(&self) -> &str {
        STORE_NAME
    }

    async fn create(&self, request: &CreateModuleRequest) -> Result<(), StoreError> {
        ensure_plain_name(STORE_NAME, &request.module_name)?;
        for file_name in request.files.keys() {
            ensure_plain_name(STORE_NAME, file_name)?;
        }

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(Self::io_error)?;

        let module_dir = self.root.join(&request.module_name);
        match tokio::fs::create_dir(&module_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::already_exists(
                    STORE_NAME,
                    &request.module_name,
                ));
            }
            Err(e) => return Err(Self::io_error(e)),
        }

        if let Err(e) = write_files(&module_dir, request).await {
            // A half-written module would block every retry with the same name
            if let Err(cleanup) = tokio::fs::remove_dir_all(&module_dir).await {
                tracing::warn!(
                    path = %module_dir.display(),
                    error = %cleanup,
                    "Failed to remove partially written module"
                );
            }
            return Err(Self::io_error(e));
        }

        tracing::info!(
            module = %request.module_name,
            path = %module_dir.display(),
            files = request.files.len(),
            "Module written"
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::io_error(e)),
        };

        let mut modules = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(Self::io_error)? {
            let file_type = entry.file_type().await.map_err(Self::io_error)?;
            if file_type.is_dir() {
                modules.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        modules.sort();
        Ok(modules)
    }
}

async fn write_files(module_dir: &Path, request: &CreateModuleRequest) -> std::io::Result<()> {
    for (file_name, content) in &request.files {
        tokio::fs::write(module_dir.join(file_name), content).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn request(name: &str) -> CreateModuleRequest {
        CreateModuleRequest {
            module_name: name.to_string(),
            algorithm_type: "perturbation".to_string(),
            module_category: "numeric".to_string(),
            files: BTreeMap::from([
                (format!("{name}.py"), "@app.route".to_string()),
                (format!("{name}.json"), "{}".to_string()),
                ("Dockerfile".to_string(), "FROM python:3.11".to_string()),
                ("requirements.txt".to_string(), "flask".to_string()),
            ]),
        }
    }

    #[tokio::test]
    async fn test_create_writes_all_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalModuleStore::new(temp_dir.path().join("modules"));

        store.create(&request("Foo")).await.unwrap();

        let module_dir = temp_dir.path().join("modules").join("Foo");
        assert_eq!(
            std::fs::read_to_string(module_dir.join("Foo.py")).unwrap(),
            "@app.route"
        );
        assert_eq!(
            std::fs::read_to_string(module_dir.join("Dockerfile")).unwrap(),
            "FROM python:3.11"
        );
        assert!(module_dir.join("Foo.json").exists());
        assert!(module_dir.join("requirements.txt").exists());
    }

    #[tokio::test]
    async fn test_create_refuses_existing_module() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalModuleStore::new(temp_dir.path());

        store.create(&request("Foo")).await.unwrap();
        let err = store.create(&request("Foo")).await.unwrap_err();

        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_module_behind() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalModuleStore::new(temp_dir.path());

        // Longer than any filesystem's name limit, so the write fails
        // after the module directory was created
        let mut broken = request("Foo");
        broken
            .files
            .insert(format!("{}.json", "x".repeat(300)), "{}".to_string());

        let err = store.create(&broken).await.unwrap_err();

        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!temp_dir.path().join("Foo").exists());
        assert!(store.list().await.unwrap().is_empty());

        // Same name goes through once the files are valid
        store.create(&request("Foo")).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["Foo"]);
    }

    #[tokio::test]
    async fn test_create_rejects_path_like_names() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalModuleStore::new(temp_dir.path());

        let err = store.create(&request("../escape")).await.unwrap_err();

        assert!(matches!(err, StoreError::InvalidModuleName { .. }));
        assert!(!temp_dir.path().join("..").join("escape").exists());
    }

    #[tokio::test]
    async fn test_list_returns_sorted_module_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalModuleStore::new(temp_dir.path());

        store.create(&request("zeta")).await.unwrap();
        store.create(&request("alpha")).await.unwrap();
        std::fs::write(temp_dir.path().join("README.md"), "not a module").unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_list_missing_root_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalModuleStore::new(temp_dir.path().join("missing"));

        assert!(store.list().await.unwrap().is_empty());
    }
}
