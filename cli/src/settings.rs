use std::path::Path;

use anyhow::{Context, Result};
use astro_booking_core::{BookingConfig, ConfigKey};
use url::Url;

/// Values taken from flags or environment variables. They win over the
/// config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub recipient: Option<String>,
    pub deadline_ms: Option<u64>,
    pub redirect_delay_ms: Option<u64>,
}

pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<BookingConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str::<BookingConfig>(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => BookingConfig::default(),
    };
    let mut config = config
        .with_override(ConfigKey::Endpoint, overrides.endpoint.as_deref())
        .with_override(ConfigKey::Recipient, overrides.recipient.as_deref());
    if let Some(deadline_ms) = overrides.deadline_ms {
        config.delivery_deadline_ms = deadline_ms;
    }
    if let Some(delay_ms) = overrides.redirect_delay_ms {
        config.redirect_delay_ms = delay_ms;
    }
    Ok(config)
}

/// Joins a relative endpoint such as `/api/bookings` onto `base_url`.
/// Absolute endpoints are used as they are.
pub fn resolve_endpoint(base_url: &str, endpoint: &str) -> Result<Url, url::ParseError> {
    match Url::parse(endpoint) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base_url)?.join(endpoint),
        Err(err) => Err(err),
    }
}
