//! Cache key derivation for banner blobs

use std::fmt;

use crate::error::{Error, Result};

/// Object store key for one banner: `{address}_{port}_{image_name}`.
///
/// Addresses are IP literals or DNS hostnames and ports are digits, so the
/// `_` separators cannot be confused with input characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the cache key for a server banner.
pub fn derive_key(address: &str, port: u16, image_name: &str) -> CacheKey {
    CacheKey(format!("{}_{}_{}", address, port, image_name))
}

/// A game server banner to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerTarget {
    pub address: String,
    pub port: u16,
    pub image_name: String,
}

impl BannerTarget {
    /// Build a target, rejecting inputs that would break the key format.
    pub fn new(address: &str, port: u16, image_name: &str) -> Result<Self> {
        if address.is_empty() {
            return Err(Error::InvalidTarget("address is empty".to_string()));
        }
        if address.contains(['_', '/']) {
            return Err(Error::InvalidTarget(format!(
                "address '{}' contains '_' or '/'",
                address
            )));
        }
        if port == 0 {
            return Err(Error::InvalidTarget("port must be non-zero".to_string()));
        }
        if image_name.is_empty() {
            return Err(Error::InvalidTarget("image name is empty".to_string()));
        }
        if image_name.contains('/') {
            return Err(Error::InvalidTarget(format!(
                "image name '{}' contains '/'",
                image_name
            )));
        }

        Ok(Self {
            address: address.to_string(),
            port,
            image_name: image_name.to_string(),
        })
    }

    /// Parse `address:port` plus an image name.
    pub fn parse(server: &str, image_name: &str) -> Result<Self> {
        let (address, port) = server
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidTarget(format!("'{}' is not address:port", server)))?;
        let port: u16 = port
            .parse()
            .map_err(|_| Error::InvalidTarget(format!("invalid port '{}'", port)))?;
        Self::new(address, port, image_name)
    }

    pub fn key(&self) -> CacheKey {
        derive_key(&self.address, self.port, &self.image_name)
    }
}

impl fmt::Display for BannerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.address, self.port, self.image_name)
    }
}
