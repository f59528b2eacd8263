//! HTTP fetcher backing live requests.
//!
//! ### Behaviour
//! - Any HTTP status is a successful fetch; only transport failures error
//! - Max redirects: 5 (configurable)
//! - Max body bytes: 5MB (configurable), checked before and after reading
//! - Responses from the configured origin are `basic`, all others `cors`

pub mod error;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method};
use url::Url;

use swproxy_core::canonical::{parse_origin, same_origin};
use swproxy_core::{AppConfig, Error, NetworkError, NetworkFetcher, Request, Response, ResponseType};

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "swproxy/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Transport-level timeout; unbounded when None.
    pub timeout: Option<Duration>,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Origin whose responses count as same-origin.
    pub origin: Url,
}

impl FetchConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.network_timeout(),
            max_redirects: config.max_redirects,
            origin,
        })
    }
}

/// [`NetworkFetcher`] over a shared reqwest client.
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| NetworkError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn too_large(&self, url: &Url, len: usize) -> NetworkError {
        NetworkError::TooLarge(format!("{url}: {len} bytes exceeds {}", self.config.max_bytes))
    }
}

#[async_trait]
impl NetworkFetcher for HttpFetcher {
    async fn issue(&self, request: &Request) -> Result<Response, NetworkError> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| NetworkError::Other(format!("invalid method {}: {e}", request.method)))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| error::classify(&e, request.url.as_str()))?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(self.too_large(&request.url, len as usize));
        }

        let status = response.status();
        let final_url = response.url().clone();

        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let Ok(value) = value.to_str() else { continue };
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| error::classify(&e, request.url.as_str()))?;

        if bytes.len() > self.config.max_bytes {
            return Err(self.too_large(&request.url, bytes.len()));
        }

        let response_type =
            if same_origin(&final_url, &self.config.origin) { ResponseType::Basic } else { ResponseType::Cors };

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            final_url = %final_url,
            status = status.as_u16(),
            bytes = bytes.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched"
        );

        let mut out = Response::new(status.as_u16(), bytes)
            .with_url(final_url)
            .with_status_text(status.canonical_reason().unwrap_or(""))
            .with_type(response_type);
        for (name, value) in &headers {
            out = out.with_header(name, value);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP server answering every connection with `raw`.
    async fn serve(raw: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(raw.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    fn fetcher(origin: &Url) -> HttpFetcher {
        HttpFetcher::new(FetchConfig {
            user_agent: "swproxy-test".into(),
            max_bytes: 1024,
            timeout: Some(Duration::from_secs(5)),
            max_redirects: 5,
            origin: origin.clone(),
        })
        .unwrap()
    }

    #[test]
    fn test_from_app_config() {
        let config = FetchConfig::from_app_config(&AppConfig::default()).unwrap();
        assert_eq!(config.user_agent, "swproxy/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.max_redirects, 5);
        assert!(config.timeout.is_none());
        assert_eq!(config.origin.as_str(), "http://localhost:5000/");
    }

    #[tokio::test]
    async fn test_same_origin_is_basic() {
        let base =
            serve("HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello")
                .await;
        let response = fetcher(&base).issue(&Request::get(base.join("index.html").unwrap())).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert_eq!(response.response_type, ResponseType::Basic);
        assert_eq!(response.content_type(), Some("text/html"));
        assert_eq!(response.body().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_cross_origin_is_cors() {
        let base = serve("HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok").await;
        let other = Url::parse("https://app.test").unwrap();
        let response = fetcher(&other).issue(&Request::get(base)).await.unwrap();
        assert_eq!(response.response_type, ResponseType::Cors);
    }

    #[tokio::test]
    async fn test_error_status_is_not_a_failure() {
        let base = serve("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let response = fetcher(&base).issue(&Request::get(base.join("missing").unwrap())).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_ok());
    }

    #[tokio::test]
    async fn test_body_limit() {
        let base = serve("HTTP/1.1 200 OK\r\nContent-Length: 2048\r\nConnection: close\r\n\r\n").await;
        let err = fetcher(&base).issue(&Request::get(base)).await.unwrap_err();
        assert!(matches!(err, NetworkError::TooLarge(_)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_offline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/")).unwrap();
        let err = fetcher(&url).issue(&Request::get(url.clone())).await.unwrap_err();
        assert!(matches!(err, NetworkError::Offline(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let url = Url::parse(&format!("http://{addr}/")).unwrap();
        let mut config = fetcher(&url).config().clone();
        config.timeout = Some(Duration::from_millis(100));
        let err = HttpFetcher::new(config).unwrap().issue(&Request::get(url)).await.unwrap_err();
        assert!(matches!(err, NetworkError::Timeout(_)));
    }
}
