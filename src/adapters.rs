use std::time::Duration;

use astro_booking_core::{
    BookingRecord, DeliveryClient, DeliveryOutcome, ImageNormalizer, Navigator, NormalizeError,
    NormalizedImage, SessionStore, StorageError, Timer,
};
use astro_booking_image::{is_large_source, NormalizerConfig, PipelineError};
use gloo::net::http::Request;
use gloo::storage::{SessionStorage, Storage};
use gloo::timers::future::TimeoutFuture;
use web_sys::File;

pub(crate) async fn read_file_bytes(file: &File) -> Result<Vec<u8>, String> {
    let buffer = wasm_bindgen_futures::JsFuture::from(file.array_buffer())
        .await
        .map_err(|_| format!("failed to read {}", file.name()))?;
    let array = js_sys::Uint8Array::new(&buffer);
    Ok(array.to_vec())
}

/// Reads a selected file and runs it through the image pipeline.
pub(crate) struct WebNormalizer {
    config: NormalizerConfig,
}

impl WebNormalizer {
    pub(crate) fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }
}

impl ImageNormalizer for WebNormalizer {
    type Source = File;

    async fn normalize(&self, file: &File) -> Result<NormalizedImage, NormalizeError> {
        let bytes = read_file_bytes(file)
            .await
            .map_err(|err| NormalizeError(PipelineError::Read(err).to_string()))?;
        if is_large_source(bytes.len()) {
            gloo::console::warn!("large image, compression may take a while", file.name());
        }
        // Let the busy label paint before the pipeline blocks the thread.
        TimeoutFuture::new(0).await;
        let normalized = astro_booking_image::normalize(&bytes, &self.config).map_err(|err| {
            gloo::console::error!("image normalization failed", file.name(), err.to_string());
            NormalizeError(err.to_string())
        })?;
        gloo::console::log!("image compressed", file.name(), normalized.size_summary());
        Ok(NormalizedImage {
            data_url: normalized.data_url,
            width: normalized.width,
            height: normalized.height,
            source_len: normalized.source_len,
        })
    }
}

pub(crate) struct GlooDelivery {
    endpoint: String,
}

impl GlooDelivery {
    pub(crate) fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl DeliveryClient for GlooDelivery {
    async fn deliver(&self, record: &BookingRecord) -> DeliveryOutcome {
        let body = match serde_json::to_string(record) {
            Ok(body) => body,
            Err(err) => return DeliveryOutcome::unreachable(format!("encode failed: {err}")),
        };
        gloo::console::log!("sending booking", record.id.to_string(), format!("{} bytes", body.len()));
        let request = match Request::post(&self.endpoint)
            .header("Content-Type", "application/json")
            .body(body)
        {
            Ok(request) => request,
            Err(err) => return DeliveryOutcome::unreachable(err.to_string()),
        };
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                gloo::console::error!("booking request failed", err.to_string());
                return DeliveryOutcome::unreachable(err.to_string());
            }
        };
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let outcome = DeliveryOutcome::from_response(status, &text);
        if outcome.is_delivered() {
            gloo::console::log!("booking saved", outcome.to_string());
        } else {
            gloo::console::error!("booking server error", outcome.to_string());
        }
        outcome
    }
}

pub(crate) struct BrowserSessionStore;

impl SessionStore for BrowserSessionStore {
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        SessionStorage::raw().set_item(key, value).map_err(|err| {
            gloo::console::warn!("session storage write failed", key.to_string(), err.clone());
            StorageError(format!("{err:?}"))
        })
    }

    fn get_item(&self, key: &str) -> Option<String> {
        SessionStorage::raw().get_item(key).ok().flatten()
    }
}

pub(crate) struct LocationNavigator;

impl Navigator for LocationNavigator {
    fn navigate(&self, url: &str) {
        navigate_to(url);
    }
}

pub(crate) fn navigate_to(url: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if window.location().set_href(url).is_err() {
        gloo::console::warn!("navigation failed", url.to_string());
    }
}

pub(crate) struct GlooTimer;

impl Timer for GlooTimer {
    async fn sleep(&self, duration: Duration) {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        TimeoutFuture::new(millis).await;
    }
}
