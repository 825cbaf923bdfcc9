//! Engine configuration
//!
//! [`Config`] carries the knobs for one [`Tagbase`](crate::database::Tagbase)
//! instance. All fields have working defaults; custom configurations are
//! validated when the database is constructed.

use tagbase_core::{Error, Result};

/// Configuration for a Tagbase database
#[derive(Debug, Clone)]
pub struct Config {
    /// Global key prefix shared by every key this database derives
    /// (default: empty)
    pub key_prefix: String,

    /// Default expiration applied to saved entries when the caller gives
    /// none (default: no expiration)
    pub default_ttl_secs: Option<u64>,

    /// Expiration for computed union/intersection aggregate tags
    /// (default: 10 seconds)
    pub aggregate_ttl_secs: u64,

    /// Remaining-TTL threshold below which an aggregate tag is recomputed
    /// instead of reused, in seconds (default: 0.1)
    pub aggregate_ttl_buffer: f64,

    /// Number of entries deleted per page during `clear`
    /// (default: 2000)
    pub deletion_page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            key_prefix: String::new(),
            default_ttl_secs: None,
            aggregate_ttl_secs: 10,
            aggregate_ttl_buffer: 0.1,
            deletion_page_size: 2000,
        }
    }
}

impl Config {
    /// Validate the configuration
    ///
    /// Both the default entry TTL and the aggregate TTL must respect the
    /// store's one-second minimum.
    pub fn validate(&self) -> Result<()> {
        if let Some(ttl) = self.default_ttl_secs {
            validate_ttl(ttl)?;
        }
        validate_ttl(self.aggregate_ttl_secs)?;
        Ok(())
    }
}

/// Reject expirations below the store's one-second granularity
pub(crate) fn validate_ttl(ttl_secs: u64) -> Result<u64> {
    if ttl_secs < 1 {
        return Err(Error::InvalidTtl(ttl_secs));
    }
    Ok(ttl_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.key_prefix, "");
        assert_eq!(config.default_ttl_secs, None);
        assert_eq!(config.aggregate_ttl_secs, 10);
        assert!((config.aggregate_ttl_buffer - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.deletion_page_size, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        assert!(matches!(validate_ttl(0), Err(Error::InvalidTtl(0))));
        assert_eq!(validate_ttl(1).unwrap(), 1);
    }

    #[test]
    fn test_validate_rejects_zero_default_ttl() {
        let config = Config {
            default_ttl_secs: Some(0),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_aggregate_ttl() {
        let config = Config {
            aggregate_ttl_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
