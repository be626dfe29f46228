pub mod booking_id;
pub mod config;
pub mod deep_link;
pub mod delivery;
pub mod handoff;
pub mod record;
pub mod submission;
pub mod ticket;

pub use booking_id::{is_valid_booking_id, BookingId, BookingIdError};
pub use config::{BookingConfig, ConfigKey, NormalizerSettings};
pub use deep_link::messaging_link;
pub use delivery::{DeliveryClient, DeliveryOutcome, DeliveryPolicy, DeliveryVerdict, FatalDelivery};
pub use handoff::{
    HandoffEnvelope, HandoffError, ImageRefs, MemorySessionStore, SessionStore, StorageError,
    StoredImages, TicketViewModel, HOROSCOPE_KEY, PAYMENT_SLIP_KEY,
};
pub use record::{BookingRecord, FormFields, MissingPaymentSlipData};
pub use submission::{
    Attachments, FormView, ImageNormalizer, Navigator, NormalizeError, NormalizedImage,
    SubmissionController, SubmissionPhase, SubmissionReport, SubmitError, Timer,
};
pub use ticket::{
    layout_ticket, prepare_ticket, run_ticket_page, DrawOp, LayoutPolicy, PreparedTicket,
    RenderFailure, TicketError, TicketHost, TicketRenderer,
};
