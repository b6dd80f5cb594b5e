//! Origin banner rendering service client

use async_trait::async_trait;

use crate::banner::BannerTarget;
use crate::error::FetchError;

pub mod origin;

pub use origin::OriginClient;

/// Fetches rendered banner images from the origin service
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download the raw image bytes for a banner
    async fn fetch(&self, target: &BannerTarget) -> Result<Vec<u8>, FetchError>;
}

/// Direct origin URL for a banner: `{origin_base}/server_info/{address}:{port}/{image_name}`
pub fn origin_url(origin_base: &str, target: &BannerTarget) -> String {
    format!(
        "{}/server_info/{}:{}/{}",
        origin_base.trim_end_matches('/'),
        target.address,
        target.port,
        target.image_name
    )
}
