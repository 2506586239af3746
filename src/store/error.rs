//! Module store error types

use thiserror::Error;

/// Errors that can occur while persisting or listing modules
#[derive(Debug, Error)]
pub enum StoreError {
    /// A module with this name is already stored
    #[error("{store}: module '{module}' already exists")]
    AlreadyExists { store: String, module: String },

    /// Module name cannot be used as a single path segment
    #[error("{store}: invalid module name '{module}'")]
    InvalidModuleName { store: String, module: String },

    /// 401 Unauthorized - token invalid or expired
    #[error("{store}: Unauthorized (401) - check the API token")]
    Unauthorized { store: String },

    /// 403 Forbidden - token lacks required permissions
    #[error("{store}: Forbidden (403) - insufficient permissions")]
    Forbidden { store: String },

    /// 403/429 with exhausted rate limit
    #[error("{store}: Rate limited")]
    RateLimited {
        store: String,
        retry_after_secs: Option<u64>,
    },

    /// Store cannot be used with the current configuration
    #[error("{store}: Not configured ({reason})")]
    NotConfigured { store: String, reason: String },

    /// Network or timeout error
    #[error("{store}: Network error - {message}")]
    Network { store: String, message: String },

    /// Other HTTP errors
    #[error("{store}: HTTP {status} - {message}")]
    Http {
        store: String,
        status: u16,
        message: String,
    },

    /// Filesystem error
    #[error("{store}: I/O error - {source}")]
    Io {
        store: String,
        #[source]
        source: std::io::Error,
    },

    /// The store call ended without producing a result
    #[error("{store}: Interrupted - {message}")]
    Interrupted { store: String, message: String },
}

impl StoreError {
    pub fn already_exists(store: impl Into<String>, module: impl Into<String>) -> Self {
        StoreError::AlreadyExists {
            store: store.into(),
            module: module.into(),
        }
    }

    pub fn invalid_module_name(store: impl Into<String>, module: impl Into<String>) -> Self {
        StoreError::InvalidModuleName {
            store: store.into(),
            module: module.into(),
        }
    }

    pub fn unauthorized(store: impl Into<String>) -> Self {
        StoreError::Unauthorized {
            store: store.into(),
        }
    }

    pub fn forbidden(store: impl Into<String>) -> Self {
        StoreError::Forbidden {
            store: store.into(),
        }
    }

    pub fn rate_limited(store: impl Into<String>, retry_after: Option<u64>) -> Self {
        StoreError::RateLimited {
            store: store.into(),
            retry_after_secs: retry_after,
        }
    }

    pub fn not_configured(store: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::NotConfigured {
            store: store.into(),
            reason: reason.into(),
        }
    }

    pub fn network(store: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Network {
            store: store.into(),
            message: message.into(),
        }
    }

    pub fn http(store: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        StoreError::Http {
            store: store.into(),
            status,
            message: message.into(),
        }
    }

    pub fn io(store: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            store: store.into(),
            source,
        }
    }

    pub fn interrupted(store: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Interrupted {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Check if this is an authentication error (401 or 403)
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            StoreError::Unauthorized { .. } | StoreError::Forbidden { .. }
        )
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }

    /// Get retry-after seconds if rate limited
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            StoreError::RateLimited {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }

    /// Get the store name for this error
    pub fn store_name(&self) -> &str {
        match self {
            StoreError::AlreadyExists { store, .. }
            | StoreError::InvalidModuleName { store, .. }
            | StoreError::Unauthorized { store }
            | StoreError::Forbidden { store }
            | StoreError::RateLimited { store, .. }
            | StoreError::NotConfigured { store, .. }
            | StoreError::Network { store, .. }
            | StoreError::Http { store, .. }
            | StoreError::Io { store, .. }
            | StoreError::Interrupted { store, .. } => store,
        }
    }

    /// What the user can do about this error, when there is something
    /// more specific than retrying with another name
    pub fn hint(&self) -> Option<String> {
        if self.is_auth_error() {
            return Some(format!(
                "The {} store rejected the credentials; check the token and its repository access.",
                self.store_name()
            ));
        }
        match self {
            StoreError::RateLimited { .. } => Some(match self.retry_after() {
                Some(secs) => format!(
                    "The {} store is rate limiting requests; try again in {secs}s.",
                    self.store_name()
                ),
                None => format!(
                    "The {} store is rate limiting requests; try again later.",
                    self.store_name()
                ),
            }),
            StoreError::NotConfigured { reason, .. } => Some(format!(
                "The {} store is not configured: {reason}.",
                self.store_name()
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_auth_error() {
        assert!(StoreError::unauthorized("github").is_auth_error());
        assert!(StoreError::forbidden("github").is_auth_error());
        assert!(!StoreError::rate_limited("github", None).is_auth_error());
        assert!(!StoreError::network("github", "timeout").is_auth_error());
    }

    #[test]
    fn test_retry_after() {
        assert_eq!(
            StoreError::rate_limited("github", Some(30)).retry_after(),
            Some(30)
        );
        assert_eq!(StoreError::forbidden("github").retry_after(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            StoreError::already_exists("local", "Foo").to_string(),
            "local: module 'Foo' already exists"
        );
        assert_eq!(
            StoreError::http("github", 500, "boom").to_string(),
            "github: HTTP 500 - boom"
        );
        assert_eq!(
            StoreError::not_configured("github", "no token").to_string(),
            "github: Not configured (no token)"
        );
    }

    #[test]
    fn test_hint() {
        assert_eq!(
            StoreError::unauthorized("github").hint().unwrap(),
            "The github store rejected the credentials; check the token and its repository access."
        );
        assert_eq!(
            StoreError::rate_limited("github", Some(30)).hint().unwrap(),
            "The github store is rate limiting requests; try again in 30s."
        );
        assert!(StoreError::rate_limited("github", None)
            .hint()
            .unwrap()
            .ends_with("try again later."));
        assert!(StoreError::already_exists("local", "Foo").hint().is_none());
        assert!(StoreError::http("github", 500, "boom").hint().is_none());
    }

    #[test]
    fn test_store_name() {
        let err = StoreError::io(
            "local",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(err.store_name(), "local");
        assert!(err.to_string().contains("disk full"));
    }
}
