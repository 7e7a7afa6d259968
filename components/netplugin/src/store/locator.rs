// Local crates
use crate::error::ConfigurationError;

// External crates
use serde::Serialize;

const SCHEME_SEPARATOR: &str = "://";

/// State driver selection derived from the cluster store URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSelector {
    /// Text before the first `://`, e.g. `etcd`
    pub scheme: String,
    /// The URL as given, handed to the store client untouched
    pub raw_url: String,
}

/// Split the store URL on `://` and keep the scheme as the state driver.
pub fn locate(url: &str) -> Result<StoreSelector, ConfigurationError> {
    match url.split_once(SCHEME_SEPARATOR) {
        Some((scheme, _)) => Ok(StoreSelector {
            scheme: scheme.to_string(),
            raw_url: url.to_string(),
        }),
        None => Err(ConfigurationError::InvalidStoreUrl(url.to_string())),
    }
}
