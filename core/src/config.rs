use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "/api/bookings";
pub const DEFAULT_TICKET_PATH: &str = "ticket.html";
pub const DEFAULT_FORM_PATH: &str = "index.html";
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 1_000;
pub const DEFAULT_DELIVERY_DEADLINE_MS: u64 = 30_000;
pub const DEFAULT_RECIPIENT: &str = "94752582482";
pub const DEFAULT_PROVIDER_NAME: &str = "SAMITHA SALGADO";
pub const DEFAULT_PROVIDER_GREETING: &str = "Samitha";
pub const DEFAULT_TAGLINE: &str = "PROFESSIONAL VEDIC ASTROLOGY";
pub const DEFAULT_MAX_WIDTH: u32 = 1200;
pub const DEFAULT_QUALITY: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NormalizerSettings {
    pub max_width: u32,
    pub quality: u8,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            quality: DEFAULT_QUALITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub endpoint: String,
    pub ticket_path: String,
    pub form_path: String,
    pub redirect_delay_ms: u64,
    pub delivery_deadline_ms: u64,
    pub recipient: String,
    pub provider_name: String,
    pub provider_greeting: String,
    pub tagline: String,
    pub normalizer: NormalizerSettings,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            ticket_path: DEFAULT_TICKET_PATH.to_string(),
            form_path: DEFAULT_FORM_PATH.to_string(),
            redirect_delay_ms: DEFAULT_REDIRECT_DELAY_MS,
            delivery_deadline_ms: DEFAULT_DELIVERY_DEADLINE_MS,
            recipient: DEFAULT_RECIPIENT.to_string(),
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
            provider_greeting: DEFAULT_PROVIDER_GREETING.to_string(),
            tagline: DEFAULT_TAGLINE.to_string(),
            normalizer: NormalizerSettings::default(),
        }
    }
}

impl BookingConfig {
    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    pub fn delivery_deadline(&self) -> Duration {
        Duration::from_millis(self.delivery_deadline_ms)
    }

    /// Applies a non-empty override, ignoring blank values.
    pub fn with_override(mut self, key: ConfigKey, value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
            return self;
        };
        match key {
            ConfigKey::Endpoint => self.endpoint = value.to_string(),
            ConfigKey::Recipient => self.recipient = value.to_string(),
            ConfigKey::TicketPath => self.ticket_path = value.to_string(),
            ConfigKey::FormPath => self.form_path = value.to_string(),
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Endpoint,
    Recipient,
    TicketPath,
    FormPath,
}
