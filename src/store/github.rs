//! GitHub module store using the repository contents API

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::env;

use super::{ensure_plain_name, CreateModuleRequest, ModuleStore, StoreError};
use crate::config::GitHubStoreConfig;

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const STORE_NAME: &str = "github";

/// Environment variables checked for the API token, in order
pub const TOKEN_ENV_VARS: &[&str] = &["MODULE_WIZARD_GITHUB_TOKEN", "GITHUB_TOKEN"];

/// Stores each module under `{root}/{module_name}/` in a GitHub repository
pub struct GitHubModuleStore {
    token: String,
    client: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
    branch: String,
    root: String,
}

#[derive(Debug, Serialize)]
struct PutContentRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

impl GitHubModuleStore {
    /// Create a store for `owner/repo` on `branch`, placing modules under `root`
    pub fn new(
        token: impl Into<String>,
        repo: &str,
        branch: impl Into<String>,
        root: &str,
    ) -> Result<Self, StoreError> {
        let (owner, repo) = parse_repo_string(repo).ok_or_else(|| {
            StoreError::not_configured(
                STORE_NAME,
                format!("invalid repository '{repo}', expected owner/name"),
            )
        })?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("module-wizard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::network(STORE_NAME, e.to_string()))?;

        Ok(Self {
            token: token.into(),
            client,
            base_url: GITHUB_API_BASE.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.into(),
            root: root.trim_matches('/').to_string(),
        })
    }

    /// Create a store from configuration, reading the token from the environment
    pub fn from_config(config: &GitHubStoreConfig) -> Result<Self, StoreError> {
        let token = token_from_env().ok_or_else(|| {
            StoreError::not_configured(
                STORE_NAME,
                format!("set {} with a repository token", TOKEN_ENV_VARS[0]),
            )
        })?;

        Ok(Self::new(token, &config.repo, config.branch.clone(), &config.root)?
            .with_base_url(config.api_url.clone()))
    }

    /// Point the store at a different API base URL (GitHub Enterprise, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Contents API URL for a repository path; every segment is
    /// percent-encoded so names with `#`, `?` or `%` stay one segment
    fn contents_url(&self, path: &str) -> String {
        let base = format!(
            "{}/repos/{}/{}/contents",
            self.base_url,
            urlencoding::encode(&self.owner),
            urlencoding::encode(&self.repo)
        );
        if path.is_empty() {
            return base;
        }

        let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
        format!("{base}/{}", encoded.join("/"))
    }

    fn module_path(&self, module_name: &str) -> String {
        if self.root.is_empty() {
            module_name.to_string()
        } else {
            format!("{}/{}", self.root, module_name)
        }
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }

    /// Whether anything exists at `path` on the configured branch
    async fn path_exists(&self, path: &str) -> Result<bool, StoreError> {
        let response = self
            .request(reqwest::Method::GET, &self.contents_url(path))
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::network(STORE_NAME, e.to_string()))?;

        match response.status().as_u16() {
            200..=299 => Ok(true),
            404 => Ok(false),
            _ => Err(error_from_response(response).await),
        }
    }

    async fn put_file(
        &self,
        module_name: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        let body = PutContentRequest {
            message,
            content: STANDARD.encode(content),
            branch: &self.branch,
        };

        let response = self
            .request(reqwest::Method::PUT, &self.contents_url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::network(STORE_NAME, e.to_string()))?;

        match response.status().as_u16() {
            200..=299 => {
                tracing::debug!(path, "Uploaded module file");
                Ok(())
            }
            // GitHub answers 422 when the file exists and no sha was given
            409 | 422 => Err(StoreError::already_exists(STORE_NAME, module_name)),
            _ => Err(error_from_response(response).await),
        }
    }
}

#[async_trait]
impl ModuleStore for GitHubModuleStore {
    fn name(&self) -> &str {
        STORE_NAME
    }

    async fn create(&self, request: &CreateModuleRequest) -> Result<(), StoreError> {
        ensure_plain_name(STORE_NAME, &request.module_name)?;

        let module_path = self.module_path(&request.module_name);
        if self.path_exists(&module_path).await? {
            return Err(StoreError::already_exists(
                STORE_NAME,
                &request.module_name,
            ));
        }

        for file_name in request.files.keys() {
            ensure_plain_name(STORE_NAME, file_name)?;
        }

        let message = request.commit_message();
        let mut committed: Vec<&str> = Vec::new();
        for (file_name, content) in &request.files {
            let path = format!("{module_path}/{file_name}");
            if let Err(e) = self
                .put_file(&request.module_name, &path, content, &message)
                .await
            {
                // Earlier commits stay on the branch
                if !committed.is_empty() {
                    tracing::warn!(
                        module = %request.module_name,
                        path = %module_path,
                        committed = ?committed,
                        failed = %file_name,
                        "Module partially committed"
                    );
                }
                return Err(e);
            }
            committed.push(file_name);
        }

        tracing::info!(
            module = %request.module_name,
            repo = %format!("{}/{}", self.owner, self.repo),
            branch = %self.branch,
            "Module committed"
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, &self.contents_url(&self.root))
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::network(STORE_NAME, e.to_string()))?;

        match response.status().as_u16() {
            200..=299 => {}
            404 => return Ok(Vec::new()),
            _ => return Err(error_from_response(response).await),
        }

        let entries: Vec<ContentEntry> = response
            .json()
            .await
            .map_err(|e| StoreError::network(STORE_NAME, e.to_string()))?;

        let mut modules: Vec<String> = entries
            .into_iter()
            .filter(|e| e.kind == "dir")
            .map(|e| e.name)
            .collect();
        modules.sort();
        Ok(modules)
    }
}

/// First non-empty token from [`TOKEN_ENV_VARS`]
pub fn token_from_env() -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|token| !token.is_empty())
}

/// Parse repo string into (owner, repo) tuple
pub fn parse_repo_string(repo_str: &str) -> Option<(&str, &str)> {
    let parts: Vec<&str> = repo_str.split('/').collect();
    match parts.as_slice() {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() => Some((*owner, *repo)),
        _ => None,
    }
}

/// Map a non-success response to a store error
async fn error_from_response(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let header_u64 = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
    };
    let rate_limit_exhausted = header_u64("x-ratelimit-remaining") == Some(0);
    let retry_after = header_u64("retry-after");

    match status {
        401 => StoreError::unauthorized(STORE_NAME),
        403 if rate_limit_exhausted || retry_after.is_some() => {
            StoreError::rate_limited(STORE_NAME, retry_after)
        }
        403 => StoreError::forbidden(STORE_NAME),
        429 => StoreError::rate_limited(STORE_NAME, retry_after),
        status => {
            let body = response.text().await.unwrap_or_default();
            StoreError::http(STORE_NAME, status, body)
        }
    }
}
