use std::fmt;

use crate::record::BookingRecord;

pub const STATUS_PAYLOAD_TOO_LARGE: u16 = 413;

/// Classified result of one attempt to send a booking record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { status: u16 },
    Rejected { status: u16, reason: String },
    Unreachable { reason: String },
}

impl DeliveryOutcome {
    /// Maps an HTTP status and response body to an outcome.
    pub fn from_response(status: u16, body: &str) -> Self {
        if (200..300).contains(&status) {
            DeliveryOutcome::Delivered { status }
        } else {
            let reason = body.trim();
            let reason = if reason.is_empty() {
                format!("status {status}")
            } else {
                reason.to_string()
            };
            DeliveryOutcome::Rejected { status, reason }
        }
    }

    pub fn unreachable(reason: impl Into<String>) -> Self {
        DeliveryOutcome::Unreachable {
            reason: reason.into(),
        }
    }

    pub fn deadline_exceeded(deadline_ms: u128) -> Self {
        Self::unreachable(format!("no response within {deadline_ms} ms"))
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryOutcome::Delivered { status } | DeliveryOutcome::Rejected { status, .. } => {
                Some(*status)
            }
            DeliveryOutcome::Unreachable { .. } => None,
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Delivered { status } => write!(f, "delivered ({status})"),
            DeliveryOutcome::Rejected { status, reason } => {
                write!(f, "rejected ({status}): {reason}")
            }
            DeliveryOutcome::Unreachable { reason } => write!(f, "unreachable: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalDelivery {
    PayloadTooLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryVerdict {
    Continue,
    Abort(FatalDelivery),
}

/// Decides which delivery outcomes stop the submission.
///
/// Only an oversized-payload rejection is fatal. Every other failure still
/// yields a ticket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryPolicy;

impl DeliveryPolicy {
    pub fn verdict(&self, outcome: &DeliveryOutcome) -> DeliveryVerdict {
        match outcome {
            DeliveryOutcome::Rejected {
                status: STATUS_PAYLOAD_TOO_LARGE,
                ..
            } => DeliveryVerdict::Abort(FatalDelivery::PayloadTooLarge),
            DeliveryOutcome::Delivered { .. }
            | DeliveryOutcome::Rejected { .. }
            | DeliveryOutcome::Unreachable { .. } => DeliveryVerdict::Continue,
        }
    }
}

/// Transport that submits a record to the booking service.
///
/// Implementations never fail; every error is folded into the outcome.
#[allow(async_fn_in_trait)]
pub trait DeliveryClient {
    async fn deliver(&self, record: &BookingRecord) -> DeliveryOutcome;
}

impl<D: DeliveryClient + ?Sized> DeliveryClient for &D {
    async fn deliver(&self, record: &BookingRecord) -> DeliveryOutcome {
        (**self).deliver(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_are_delivered() {
        assert!(DeliveryOutcome::from_response(200, "{}").is_delivered());
        assert!(DeliveryOutcome::from_response(201, "").is_delivered());
        assert!(!DeliveryOutcome::from_response(302, "").is_delivered());
    }

    #[test]
    fn rejection_reason_falls_back_to_status() {
        assert_eq!(
            DeliveryOutcome::from_response(500, "  "),
            DeliveryOutcome::Rejected {
                status: 500,
                reason: "status 500".to_string()
            }
        );
    }

    #[test]
    fn only_payload_too_large_is_fatal() {
        let policy = DeliveryPolicy;
        assert_eq!(
            policy.verdict(&DeliveryOutcome::from_response(413, "too big")),
            DeliveryVerdict::Abort(FatalDelivery::PayloadTooLarge)
        );
        for outcome in [
            DeliveryOutcome::from_response(200, "{}"),
            DeliveryOutcome::from_response(400, "bad"),
            DeliveryOutcome::from_response(500, "boom"),
            DeliveryOutcome::unreachable("connection refused"),
            DeliveryOutcome::deadline_exceeded(30_000),
        ] {
            assert_eq!(policy.verdict(&outcome), DeliveryVerdict::Continue, "{outcome}");
        }
    }
}
