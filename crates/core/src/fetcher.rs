//! Network fetcher seam.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::NetworkError;
use crate::http::{Request, Response};

/// Issues a request to the network.
///
/// Any HTTP status is a successful fetch; only transport failures are errors.
#[async_trait]
pub trait NetworkFetcher: Send + Sync {
    async fn issue(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// Run a fetch under an optional deadline. An elapsed deadline is reported
/// as [`NetworkError::Timeout`].
pub async fn issue_with_timeout(
    fetcher: &dyn NetworkFetcher, request: &Request, timeout: Option<Duration>,
) -> Result<Response, NetworkError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fetcher.issue(request))
            .await
            .map_err(|_| NetworkError::Timeout(format!("{} after {}ms", request.url, limit.as_millis())))?,
        None => fetcher.issue(request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    struct Slow;

    #[async_trait]
    impl NetworkFetcher for Slow {
        async fn issue(&self, _request: &Request) -> Result<Response, NetworkError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(Response::new(200, "late"))
        }
    }

    fn request() -> Request {
        Request::get(Url::parse("https://app.test/slow").unwrap())
    }

    #[tokio::test]
    async fn test_no_timeout_waits_for_slow_network() {
        let response = issue_with_timeout(&Slow, &request(), None).await.unwrap();
        assert_eq!(response.body().as_ref(), b"late");
    }

    #[tokio::test]
    async fn test_timeout_is_network_failure() {
        let result = issue_with_timeout(&Slow, &request(), Some(Duration::from_millis(10))).await;
        assert!(matches!(result, Err(NetworkError::Timeout(_))));
    }
}
