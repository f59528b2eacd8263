//! Mapping reqwest failures onto [`NetworkError`].

use std::error::Error as StdError;

use swproxy_core::NetworkError;

/// Classify a transport failure for `url`.
///
/// Connect failures whose cause chain mentions DNS are reported as lookup
/// failures; every other connect failure means the host is unreachable.
pub fn classify(err: &reqwest::Error, url: &str) -> NetworkError {
    if err.is_timeout() {
        return NetworkError::Timeout(url.to_string());
    }
    if err.is_redirect() {
        return NetworkError::Other(format!("{url}: too many redirects"));
    }
    if err.is_connect() {
        let chain = cause_chain(err);
        if chain.to_ascii_lowercase().contains("dns") {
            return NetworkError::Dns(format!("{url}: {chain}"));
        }
        return NetworkError::Offline(format!("{url}: {chain}"));
    }
    NetworkError::Other(format!("{url}: {}", cause_chain(err)))
}

fn cause_chain(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}
