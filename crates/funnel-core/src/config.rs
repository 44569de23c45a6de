//! Funnel configuration
//!
//! Every key is optional; missing keys fall back to the values the funnel
//! has always shipped with.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default remote collection name
pub const DEFAULT_COLLECTION: &str = "LandingPageUserSubmissions";

/// Default checkout page for the payment handoff
pub const DEFAULT_PAYMENT_URL: &str = "https://checkout.nztrustee.co.nz/b/fZe01x8WBczTbx63ch";

/// Funnel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelConfig {
    /// Remote collection holding Submissions
    pub collection: String,
    /// Delay between a successful remote write and navigation
    pub settle_delay_ms: u64,
    /// External checkout page opened after the last page
    pub payment_url: String,
    /// Page routes
    pub routes: RouteTable,
}

impl FunnelConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With settle delay
    #[inline]
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With payment URL
    #[inline]
    #[must_use]
    pub fn with_payment_url(mut self, url: impl Into<String>) -> Self {
        self.payment_url = url.into();
        self
    }

    /// With collection name
    #[inline]
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Settle delay as a duration
    #[inline]
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Parse configuration from TOML
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for unusable values.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`FunnelConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check values that deserialization alone cannot
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection.trim().is_empty() {
            return Err(ConfigError::Invalid("collection must not be empty".into()));
        }
        url::Url::parse(&self.payment_url).map_err(|e| {
            ConfigError::Invalid(format!("payment_url '{}': {e}", self.payment_url))
        })?;
        for (name, route) in self.routes.iter() {
            if !route.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "route '{name}' must start with '/': {route}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            settle_delay_ms: 300,
            payment_url: DEFAULT_PAYMENT_URL.to_string(),
            routes: RouteTable::default(),
        }
    }
}

/// Relative routes of the funnel pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    /// Page 1
    pub trust_name: String,
    /// Page 2
    pub primary_contact: String,
    /// Page 3
    pub contact_details: String,
    /// Page 4
    pub secondary_contact: String,
}

impl RouteTable {
    /// Routes with their config names, in page order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("trust_name", self.trust_name.as_str()),
            ("primary_contact", self.primary_contact.as_str()),
            ("contact_details", self.contact_details.as_str()),
            ("secondary_contact", self.secondary_contact.as_str()),
        ]
        .into_iter()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            trust_name: "/signup-Zba".to_string(),
            primary_contact: "/signup-Zba1".to_string(),
            contact_details: "/signup-Zba2".to_string(),
            secondary_contact: "/signup-Zba3".to_string(),
        }
    }
}
