//! Test doubles for the store and fetcher seams.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use url::Url;

use crate::Error;
use crate::cache::{CacheDb, CacheStore, StoredResponse};
use crate::error::NetworkError;
use crate::fetcher::NetworkFetcher;
use crate::http::{Request, RequestKey, Response, ResponseType};

pub const ORIGIN: &str = "https://app.test";

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub body: Bytes,
    pub response_type: ResponseType,
    pub content_type: Option<String>,
}

impl Canned {
    pub fn ok(body: &'static [u8]) -> Self {
        Self { status: 200, body: Bytes::from_static(body), response_type: ResponseType::Basic, content_type: None }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn typed(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}

/// Fetcher answering from a script keyed by URL. Unscripted URLs fail as
/// offline.
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, Result<Canned, NetworkError>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn respond(&self, url: &Url, canned: Canned) {
        self.routes.lock().await.insert(url.to_string(), Ok(canned));
    }

    pub async fn fail(&self, url: &Url, error: NetworkError) {
        self.routes.lock().await.insert(url.to_string(), Err(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkFetcher for ScriptedFetcher {
    async fn issue(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let routes = self.routes.lock().await;
        match routes.get(request.url.as_str()) {
            Some(Ok(canned)) => {
                let mut response = Response::new(canned.status, canned.body.clone())
                    .with_url(request.url.clone())
                    .with_type(canned.response_type);
                if let Some(ct) = &canned.content_type {
                    response = response.with_header("content-type", ct);
                }
                Ok(response)
            }
            Some(Err(e)) => Err(e.clone()),
            None => Err(NetworkError::Offline(request.url.to_string())),
        }
    }
}

/// Real in-memory store that counts every call.
pub struct CountingStore {
    inner: CacheDb,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
}

impl CountingStore {
    pub async fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: CacheDb::open_in_memory().await.unwrap(),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        })
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for CountingStore {
    async fn open(&self, namespace: &str) -> Result<(), Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.open(namespace).await
    }

    async fn get(&self, namespace: &str, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(namespace, key).await
    }

    async fn put(&self, namespace: &str, key: &RequestKey, response: StoredResponse) -> Result<(), Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put(namespace, key, response).await
    }

    async fn delete(&self, namespace: &str, key: &RequestKey) -> Result<bool, Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(namespace, key).await
    }

    async fn keys(&self, namespace: &str) -> Result<Vec<RequestKey>, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.keys(namespace).await
    }

    async fn namespaces(&self) -> Result<Vec<String>, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.namespaces().await
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<bool, Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_namespace(namespace).await
    }
}

/// Store where every operation fails, like a full or unavailable disk.
pub struct BrokenStore;

fn quota() -> Error {
    Error::CorruptEntry("quota exceeded".into())
}

#[async_trait]
impl CacheStore for BrokenStore {
    async fn open(&self, _namespace: &str) -> Result<(), Error> {
        Err(quota())
    }

    async fn get(&self, _namespace: &str, _key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        Err(quota())
    }

    async fn put(&self, _namespace: &str, _key: &RequestKey, _response: StoredResponse) -> Result<(), Error> {
        Err(quota())
    }

    async fn delete(&self, _namespace: &str, _key: &RequestKey) -> Result<bool, Error> {
        Err(quota())
    }

    async fn keys(&self, _namespace: &str) -> Result<Vec<RequestKey>, Error> {
        Err(quota())
    }

    async fn namespaces(&self) -> Result<Vec<String>, Error> {
        Err(quota())
    }

    async fn delete_namespace(&self, _namespace: &str) -> Result<bool, Error> {
        Err(quota())
    }
}
