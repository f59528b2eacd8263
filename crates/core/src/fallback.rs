//! Fallback chains tried after both the network and the exact cache lookup
//! have failed. Earlier steps take precedence.

use bytes::Bytes;
use url::Url;

use crate::Error;
use crate::cache::Namespace;
use crate::canonical::{canonicalize, parse_origin};
use crate::classify::StrategyBucket;
use crate::config::AppConfig;
use crate::http::{Destination, RequestKey, Response, ResponseType};

const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="300" viewBox="0 0 400 300"><rect width="400" height="300" fill="#667eea"/><text x="50%" y="50%" font-family="Arial" font-size="20" fill="white" text-anchor="middle" dy=".3em">Image unavailable offline</text></svg>"##;

/// A response synthesized without touching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: String,
    pub body: Bytes,
}

impl InlineResponse {
    /// Inline SVG standing in for an unreachable image.
    pub fn image_placeholder() -> Self {
        Self {
            status: 200,
            status_text: "OK".into(),
            content_type: "image/svg+xml".into(),
            body: Bytes::from_static(PLACEHOLDER_SVG.as_bytes()),
        }
    }

    /// Plain-text `503` for an unreachable non-image asset.
    pub fn unavailable(text: &str) -> Self {
        Self {
            status: 503,
            status_text: "Service Unavailable".into(),
            content_type: "text/plain".into(),
            body: Bytes::copy_from_slice(text.as_bytes()),
        }
    }

    fn to_response(&self) -> Response {
        Response::new(self.status, self.body.clone())
            .with_status_text(&self.status_text)
            .with_header("content-type", &self.content_type)
            .with_type(ResponseType::Basic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// A GET entry expected in the current namespace.
    Cached(Url),
    Inline(InlineResponse),
}

/// Ordered alternatives; the first that resolves wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackChain {
    steps: Vec<Fallback>,
}

impl FallbackChain {
    pub fn new(steps: Vec<Fallback>) -> Self {
        Self { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Fallback] {
        &self.steps
    }

    /// Walk the chain. Storage failures count as a miss for that step.
    pub async fn resolve(&self, namespace: Option<&Namespace>) -> Option<Response> {
        for step in &self.steps {
            match step {
                Fallback::Cached(url) => {
                    let Some(ns) = namespace else { continue };
                    match ns.lookup(&RequestKey::get(url.clone())).await {
                        Ok(Some(response)) => return Some(response),
                        Ok(None) => tracing::debug!(url = %url, "fallback entry not cached"),
                        Err(e) => tracing::warn!(url = %url, error = %e, "fallback lookup failed"),
                    }
                }
                Fallback::Inline(inline) => return Some(inline.to_response()),
            }
        }
        None
    }
}

/// Chains per kind of request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fallbacks {
    pub navigation: FallbackChain,
    pub image: FallbackChain,
    pub asset: FallbackChain,
}

impl Fallbacks {
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let resolve = |raw: &str| canonicalize(&origin, raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")));

        let navigation = FallbackChain::new(vec![Fallback::Cached(resolve(&config.offline_url)?)]);

        let mut image = Vec::new();
        if let Some(placeholder) = &config.image_placeholder_url {
            image.push(Fallback::Cached(resolve(placeholder)?));
        }
        if config.inline_image_placeholder {
            image.push(Fallback::Inline(InlineResponse::image_placeholder()));
        }

        let asset = config
            .asset_unavailable_text
            .as_deref()
            .map(|text| vec![Fallback::Inline(InlineResponse::unavailable(text))])
            .unwrap_or_default();

        Ok(Self { navigation, image: FallbackChain::new(image), asset: FallbackChain::new(asset) })
    }

    /// Chain for a request that exhausted network and cache. `Default` and
    /// `RemoteService` have none.
    pub fn chain_for(&self, bucket: StrategyBucket, destination: Destination) -> Option<&FallbackChain> {
        match bucket {
            StrategyBucket::Navigation => Some(&self.navigation),
            StrategyBucket::StaticAsset if destination == Destination::Image => Some(&self.image),
            StrategyBucket::StaticAsset => Some(&self.asset),
            StrategyBucket::RemoteService | StrategyBucket::Default => None,
        }
        .filter(|chain| !chain.is_empty())
    }
}
