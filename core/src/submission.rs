//! Booking submission flow.
//!
//! The controller drives one submission from validation to redirect. It only
//! talks to the page through [`FormView`] and to the outside world through the
//! port traits, so the same flow runs in the browser and in the CLI.

use std::time::Duration;

use futures_util::future::{select, Either};
use futures_util::pin_mut;
use tracing::{debug, info, warn};

use crate::booking_id::BookingId;
use crate::config::BookingConfig;
use crate::delivery::{DeliveryClient, DeliveryOutcome, DeliveryPolicy, DeliveryVerdict, FatalDelivery};
use crate::handoff::{HandoffEnvelope, SessionStore, StorageError};
use crate::record::{BookingRecord, FormFields, MissingPaymentSlipData};

pub const MISSING_SLIP_MESSAGE: &str = "Please upload your payment slip before confirming.";
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Payload too large - please use smaller images";
pub const CONSOLE_HINT: &str = "Check the browser console (F12) for details.";
pub const BUSY_LABEL: &str = "Processing...";
pub const IDLE_LABEL: &str = "Confirm & Generate Ticket";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Validating,
    Normalizing,
    Assembling,
    Delivering,
    Persisting,
    Redirecting,
    Failed,
}

impl SubmissionPhase {
    pub fn label(self) -> &'static str {
        match self {
            SubmissionPhase::Idle => "idle",
            SubmissionPhase::Validating => "validating",
            SubmissionPhase::Normalizing => "normalizing images",
            SubmissionPhase::Assembling => "assembling booking",
            SubmissionPhase::Delivering => "sending booking",
            SubmissionPhase::Persisting => "saving images",
            SubmissionPhase::Redirecting => "redirecting",
            SubmissionPhase::Failed => "failed",
        }
    }
}

/// An image after resize and re-encode, ready to embed in a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    pub source_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct NormalizeError(pub String);

#[allow(async_fn_in_trait)]
pub trait ImageNormalizer {
    type Source;

    async fn normalize(&self, source: &Self::Source) -> Result<NormalizedImage, NormalizeError>;
}

impl<N: ImageNormalizer + ?Sized> ImageNormalizer for &N {
    type Source = N::Source;

    async fn normalize(&self, source: &Self::Source) -> Result<NormalizedImage, NormalizeError> {
        (**self).normalize(source).await
    }
}

/// Logical form state as seen by the controller.
pub trait FormView {
    fn fields(&self) -> FormFields;
    fn set_busy(&self, busy: bool);
    fn show_error(&self, message: &str);
    fn hide_error(&self);
    fn set_phase(&self, _phase: SubmissionPhase) {}
}

pub trait Navigator {
    fn navigate(&self, url: &str);
}

impl<G: Navigator + ?Sized> Navigator for &G {
    fn navigate(&self, url: &str) {
        (**self).navigate(url)
    }
}

#[allow(async_fn_in_trait)]
pub trait Timer {
    async fn sleep(&self, duration: Duration);
}

impl<T: Timer + ?Sized> Timer for &T {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await
    }
}

#[derive(Debug, Clone)]
pub struct Attachments<F> {
    pub payment_slip: Option<F>,
    pub horoscope: Option<F>,
}

impl<F> Default for Attachments<F> {
    fn default() -> Self {
        Self {
            payment_slip: None,
            horoscope: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("payment slip is required")]
    MissingPaymentSlip,
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    MissingPaymentSlipData(#[from] MissingPaymentSlipData),
    #[error("Payload too large - please use smaller images")]
    PayloadTooLarge,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SubmitError {
    /// Text shown in the form's error region.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::MissingPaymentSlip => MISSING_SLIP_MESSAGE.to_string(),
            other => format!("{other}. {CONSOLE_HINT}"),
        }
    }
}

impl From<FatalDelivery> for SubmitError {
    fn from(fatal: FatalDelivery) -> Self {
        match fatal {
            FatalDelivery::PayloadTooLarge => SubmitError::PayloadTooLarge,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub booking_id: BookingId,
    pub outcome: DeliveryOutcome,
    pub redirect_url: String,
}

pub struct SubmissionController<N, D, S, G, T> {
    normalizer: N,
    delivery: D,
    store: S,
    navigator: G,
    timer: T,
    policy: DeliveryPolicy,
    config: BookingConfig,
}

impl<N, D, S, G, T> SubmissionController<N, D, S, G, T>
where
    N: ImageNormalizer,
    D: DeliveryClient,
    S: SessionStore,
    G: Navigator,
    T: Timer,
{
    pub fn new(normalizer: N, delivery: D, store: S, navigator: G, timer: T) -> Self {
        Self {
            normalizer,
            delivery,
            store,
            navigator,
            timer,
            policy: DeliveryPolicy,
            config: BookingConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BookingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    pub async fn submit<V: FormView>(
        &self,
        view: &V,
        attachments: &Attachments<N::Source>,
    ) -> Result<SubmissionReport, SubmitError> {
        view.set_phase(SubmissionPhase::Validating);
        let Some(payment_slip) = attachments.payment_slip.as_ref() else {
            view.show_error(MISSING_SLIP_MESSAGE);
            view.set_phase(SubmissionPhase::Idle);
            return Err(SubmitError::MissingPaymentSlip);
        };
        view.hide_error();
        view.set_busy(true);
        info!("starting booking submission");

        match self
            .run(view, payment_slip, attachments.horoscope.as_ref())
            .await
        {
            Ok(report) => Ok(report),
            Err(err) => {
                warn!(error = %err, "booking submission failed");
                view.set_phase(SubmissionPhase::Failed);
                view.set_busy(false);
                view.show_error(&err.user_message());
                view.set_phase(SubmissionPhase::Idle);
                Err(err)
            }
        }
    }

    async fn run<V: FormView>(
        &self,
        view: &V,
        payment_slip: &N::Source,
        horoscope: Option<&N::Source>,
    ) -> Result<SubmissionReport, SubmitError> {
        view.set_phase(SubmissionPhase::Normalizing);
        debug!("normalizing payment slip");
        let payment_slip = self.normalizer.normalize(payment_slip).await?;
        let horoscope = match horoscope {
            Some(source) => {
                debug!("normalizing horoscope image");
                Some(self.normalizer.normalize(source).await?)
            }
            None => None,
        };

        view.set_phase(SubmissionPhase::Assembling);
        let id = BookingId::generate(&mut rand::thread_rng());
        let record = BookingRecord::new(
            id,
            view.fields(),
            payment_slip.data_url,
            horoscope.map(|image| image.data_url),
        )?;

        view.set_phase(SubmissionPhase::Delivering);
        info!(id = %record.id, name = %record.full_name, "sending booking");
        let outcome = self.deliver_with_deadline(&record).await;
        match &outcome {
            DeliveryOutcome::Delivered { .. } => info!(%outcome, "booking saved"),
            _ => warn!(%outcome, "booking delivery failed, continuing with ticket"),
        }
        if let DeliveryVerdict::Abort(fatal) = self.policy.verdict(&outcome) {
            return Err(fatal.into());
        }

        view.set_phase(SubmissionPhase::Persisting);
        let envelope = HandoffEnvelope::from_record(&record);
        envelope.persist_images(&self.store, &record)?;

        view.set_phase(SubmissionPhase::Redirecting);
        let redirect_url = envelope.ticket_url(&self.config.ticket_path);
        self.timer.sleep(self.config.redirect_delay()).await;
        self.navigator.navigate(&redirect_url);

        Ok(SubmissionReport {
            booking_id: record.id,
            outcome,
            redirect_url,
        })
    }

    async fn deliver_with_deadline(&self, record: &BookingRecord) -> DeliveryOutcome {
        let deadline = self.config.delivery_deadline();
        let delivery = self.delivery.deliver(record);
        let expiry = self.timer.sleep(deadline);
        pin_mut!(delivery);
        pin_mut!(expiry);
        match select(delivery, expiry).await {
            Either::Left((outcome, _)) => outcome,
            Either::Right(((), _)) => DeliveryOutcome::deadline_exceeded(deadline.as_millis()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_appends_console_hint() {
        let err = SubmitError::Normalize(NormalizeError("image decode failed: bad".into()));
        assert_eq!(
            err.user_message(),
            "image decode failed: bad. Check the browser console (F12) for details."
        );
        assert_eq!(
            SubmitError::PayloadTooLarge.user_message(),
            format!("{PAYLOAD_TOO_LARGE_MESSAGE}. {CONSOLE_HINT}")
        );
        assert_eq!(
            SubmitError::MissingPaymentSlip.user_message(),
            MISSING_SLIP_MESSAGE
        );
    }
}
