use astro_booking_core::{BookingConfig, ConfigKey};
use astro_booking_image::NormalizerConfig;

/// Build-time overrides, read the same way for `trunk serve` and release
/// builds.
pub(crate) fn booking_config() -> BookingConfig {
    BookingConfig::default()
        .with_override(
            ConfigKey::Endpoint,
            option_env!("ASTRO_BOOKING_ENDPOINT").or(option_env!("TRUNK_PUBLIC_BOOKING_ENDPOINT")),
        )
        .with_override(
            ConfigKey::Recipient,
            option_env!("ASTRO_BOOKING_RECIPIENT").or(option_env!("TRUNK_PUBLIC_BOOKING_RECIPIENT")),
        )
}

pub(crate) fn normalizer_config(config: &BookingConfig) -> NormalizerConfig {
    NormalizerConfig {
        max_width: config.normalizer.max_width,
        quality: config.normalizer.quality,
    }
}

pub(crate) fn current_path() -> String {
    web_sys::window()
        .and_then(|window| window.location().pathname().ok())
        .unwrap_or_default()
}

pub(crate) fn current_query() -> String {
    web_sys::window()
        .and_then(|window| window.location().search().ok())
        .unwrap_or_default()
}

/// The ticket page is served from the same bundle; the path decides which
/// page renders.
pub(crate) fn is_ticket_path(path: &str, ticket_path: &str) -> bool {
    let stem = ticket_path
        .trim_start_matches('/')
        .trim_end_matches(".html");
    !stem.is_empty()
        && path
            .rsplit('/')
            .next()
            .is_some_and(|last| last.trim_end_matches(".html") == stem)
}
