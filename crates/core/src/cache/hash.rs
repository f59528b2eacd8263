//! Request identity hashing for cache keys.

use sha2::{Digest, Sha256};

/// Compute the storage hash for a request identity.
///
/// Callers pass the upper-cased method and the canonical URL; the same pair
/// always yields the same 64-char hex digest.
pub fn compute_request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_request_key("GET", "https://app.test/");
        let hash2 = compute_request_key("GET", "https://app.test/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_method() {
        let get = compute_request_key("GET", "https://app.test/api/order");
        let post = compute_request_key("POST", "https://app.test/api/order");
        assert_ne!(get, post);
    }

    #[test]
    fn test_hash_different_query() {
        let a = compute_request_key("GET", "https://app.test/?v=1");
        let b = compute_request_key("GET", "https://app.test/?v=2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_request_key("GET", "https://app.test/logo.png");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
