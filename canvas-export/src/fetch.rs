//! Remote image prefetch.
//!
//! The exporter only resolves inline sources, so every `http(s)` image a
//! document references is downloaded here first. Downloads run one after
//! another; a failure is logged and the source is left out, which makes the
//! exporter fall back to its placeholder (or white, for backgrounds).

use canvas_renderer::PreloadedAssets;
use reqwest::Client;
use url::Url;

use crate::error::{HostError, HostResult};

/// Download `sources` sequentially into a [`PreloadedAssets`] set.
pub async fn prefetch<S: AsRef<str>>(client: &Client, sources: &[S]) -> PreloadedAssets {
    let mut assets = PreloadedAssets::new();
    for source in sources {
        let source = source.as_ref();
        match fetch_one(client, source).await {
            Ok(bytes) => {
                tracing::debug!("Prefetched {source} ({} bytes)", bytes.len());
                assets.insert(source, bytes);
            }
            Err(e) => tracing::warn!("Failed to prefetch {source}: {e}"),
        }
    }
    assets
}

async fn fetch_one(client: &Client, source: &str) -> HostResult<Vec<u8>> {
    let url = Url::parse(source).map_err(|e| HostError::InvalidUrl(format!("{source}: {e}")))?;
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}
