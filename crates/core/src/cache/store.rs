//! The cache store seam.
//!
//! The engine only talks to storage through [`CacheStore`]; [`CacheDb`]
//! is the production implementation and tests swap in doubles.
//!
//! [`CacheDb`]: super::CacheDb

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::http::{RequestKey, Response, ResponseType};

/// Versioned, named key-value store of responses.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the namespace if it does not exist yet.
    async fn open(&self, namespace: &str) -> Result<(), Error>;

    async fn get(&self, namespace: &str, key: &RequestKey) -> Result<Option<StoredResponse>, Error>;

    /// Insert or overwrite; the namespace is created on demand.
    async fn put(&self, namespace: &str, key: &RequestKey, response: StoredResponse) -> Result<(), Error>;

    async fn delete(&self, namespace: &str, key: &RequestKey) -> Result<bool, Error>;

    async fn keys(&self, namespace: &str) -> Result<Vec<RequestKey>, Error>;

    async fn namespaces(&self) -> Result<Vec<String>, Error>;

    /// Drop a namespace and every entry in it.
    async fn delete_namespace(&self, namespace: &str) -> Result<bool, Error>;
}

/// Persisted snapshot of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub url: Option<String>,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub response_type: ResponseType,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl StoredResponse {
    /// Take ownership of a response (usually a duplicate) for storage.
    pub fn from_response(response: Response) -> Self {
        let url = response.url.as_ref().map(|u| u.to_string());
        let status = response.status;
        let status_text = response.status_text.clone();
        let headers = response.headers.clone();
        let response_type = response.response_type;
        let body = response.into_body().to_vec();

        Self {
            url,
            status,
            status_text,
            headers,
            response_type,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(self.status, self.body)
            .with_status_text(&self.status_text)
            .with_type(self.response_type);
        response.headers = self.headers;
        response.url = self.url.and_then(|u| url::Url::parse(&u).ok());
        response
    }
}

/// Scoped handle on one namespace of a store.
#[derive(Clone)]
pub struct Namespace {
    store: Arc<dyn CacheStore>,
    name: String,
}

impl Namespace {
    /// Open (creating if needed) the named namespace.
    pub async fn open(store: Arc<dyn CacheStore>, name: &str) -> Result<Self, Error> {
        store.open(name).await?;
        Ok(Self { store, name: name.to_string() })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn lookup(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        Ok(self
            .store
            .get(&self.name, key)
            .await?
            .map(StoredResponse::into_response))
    }

    /// Persist a response. Callers that still need the response pass a
    /// [`Response::duplicate`].
    pub async fn store(&self, key: &RequestKey, response: Response) -> Result<(), Error> {
        self.store
            .put(&self.name, key, StoredResponse::from_response(response))
            .await
    }

    pub async fn remove(&self, key: &RequestKey) -> Result<bool, Error> {
        self.store.delete(&self.name, key).await
    }

    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        self.store.keys(&self.name).await
    }
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace").field("name", &self.name).finish()
    }
}
