use std::time::Duration;

use catalog_core::AccessPolicy;

use crate::error::ConfigError;

/// Listing-level configuration.
///
/// Controls page size, free-tier limits, cache bounds, and the store call
/// timeout applied by the store pipeline.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// Number of items requested per page.
    pub page_size: usize,
    /// Free-tier page and row limits.
    pub access: AccessPolicy,
    /// Maximum number of fetched windows kept per filter version.
    pub window_cache_pages: usize,
    /// Per-call store timeout. `None` disables the timeout layer.
    pub store_timeout: Option<Duration>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            access: AccessPolicy::default(),
            window_cache_pages: 32,
            store_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl ListingConfig {
    /// Checks that the configuration can drive a listing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero page size or zero window cache.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.window_cache_pages == 0 {
            return Err(ConfigError::ZeroWindowCache);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_config_defaults() {
        let config = ListingConfig::default();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.access.free_page_limit, 3);
        assert_eq!(config.access.free_row_limit, 50);
        assert_eq!(config.window_cache_pages, 32);
        assert_eq!(config.store_timeout, Some(Duration::from_secs(10)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let config = ListingConfig {
            page_size: 0,
            ..ListingConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPageSize));

        let config = ListingConfig {
            window_cache_pages: 0,
            ..ListingConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroWindowCache));
    }
}
