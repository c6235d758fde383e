//! Where translation resources come from.
//!
//! A source only knows how to turn a resource name (`en-common.json`,
//! `affiliate-en.json`, ...) into decoded JSON. Layout and merging live in the
//! store.

use crate::i18n::LoadError;
use futures::future::{BoxFuture, FutureExt};
use reqwest::Url;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// A provider of JSON resources.
pub trait BundleSource: Send + Sync {
    fn fetch_json(&self, name: &str) -> BoxFuture<'static, Result<Value, LoadError>>;
}

/// Fetches resources relative to a base URL.
#[derive(Debug, Clone)]
pub struct HttpBundleSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBundleSource {
    /// `base_url` is treated as a directory: a missing trailing slash is added.
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self, LoadError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| LoadError::Fetch {
            resource: base_url.to_string(),
            message: format!("invalid base URL: {}", e),
        })?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl BundleSource for HttpBundleSource {
    fn fetch_json(&self, name: &str) -> BoxFuture<'static, Result<Value, LoadError>> {
        let client = self.client.clone();
        let resource = name.to_string();
        let url = self.base_url.join(name);

        async move {
            let url = url.map_err(|e| LoadError::Fetch {
                resource: resource.clone(),
                message: e.to_string(),
            })?;
            debug!("Fetching translation resource {}", url);

            let response = client.get(url).send().await.map_err(|e| LoadError::Fetch {
                resource: resource.clone(),
                message: e.to_string(),
            })?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(LoadError::NotFound { resource });
            }
            if !response.status().is_success() {
                return Err(LoadError::Status {
                    resource,
                    status: response.status().as_u16(),
                });
            }

            let body = response.text().await.map_err(|e| LoadError::Fetch {
                resource: resource.clone(),
                message: e.to_string(),
            })?;
            parse_json(&resource, &body)
        }
        .boxed()
    }
}

/// Reads resources from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirBundleSource {
    root: PathBuf,
}

impl DirBundleSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BundleSource for DirBundleSource {
    fn fetch_json(&self, name: &str) -> BoxFuture<'static, Result<Value, LoadError>> {
        let path = self.root.join(name);
        let resource = name.to_string();

        async move {
            debug!("Reading translation resource {}", path.display());
            let body = tokio::fs::read_to_string(&path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    LoadError::NotFound {
                        resource: resource.clone(),
                    }
                } else {
                    LoadError::Fetch {
                        resource: resource.clone(),
                        message: e.to_string(),
                    }
                }
            })?;
            parse_json(&resource, &body)
        }
        .boxed()
    }
}

/// Serves resources from memory.
///
/// Counts fetches per resource name, which tests use to observe request
/// de-duplication.
#[derive(Debug, Default, Clone)]
pub struct StaticBundleSource {
    resources: Arc<Mutex<HashMap<String, Value>>>,
    fetches: Arc<Mutex<HashMap<String, usize>>>,
}

impl StaticBundleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, name: &str, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&self, name: &str, value: Value) {
        lock(&self.resources).insert(name.to_string(), value);
    }

    pub fn fetch_count(&self, name: &str) -> usize {
        lock(&self.fetches).get(name).copied().unwrap_or(0)
    }
}

impl BundleSource for StaticBundleSource {
    fn fetch_json(&self, name: &str) -> BoxFuture<'static, Result<Value, LoadError>> {
        *lock(&self.fetches).entry(name.to_string()).or_insert(0) += 1;

        let result = lock(&self.resources)
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                resource: name.to_string(),
            });
        async move {
            // Yield once so concurrent callers observe the load as in flight
            tokio::task::yield_now().await;
            result
        }
        .boxed()
    }
}

fn parse_json(resource: &str, body: &str) -> Result<Value, LoadError> {
    serde_json::from_str(body).map_err(|e| LoadError::Parse {
        resource: resource.to_string(),
        message: e.to_string(),
    })
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
