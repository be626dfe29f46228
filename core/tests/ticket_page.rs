use std::cell::RefCell;

use astro_booking_core::ticket::PRECONDITION_ALERT;
use astro_booking_core::{
    run_ticket_page, BookingConfig, BookingId, BookingRecord, DrawOp, FormFields,
    HandoffEnvelope, MemorySessionStore, RenderFailure, SessionStore, TicketError, TicketHost,
    TicketRenderer, TicketViewModel, HOROSCOPE_KEY, PAYMENT_SLIP_KEY,
};

#[derive(Default)]
struct RecordingHost {
    alerts: RefCell<Vec<String>>,
    visited: RefCell<Vec<String>>,
    saved: RefCell<Vec<(String, usize)>>,
    link: RefCell<Option<String>>,
}

impl TicketHost for RecordingHost {
    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }

    fn navigate(&self, url: &str) {
        self.visited.borrow_mut().push(url.to_string());
    }

    fn save(&self, file_name: &str, bytes: &[u8]) {
        self.saved
            .borrow_mut()
            .push((file_name.to_string(), bytes.len()));
    }

    fn set_messaging_link(&self, url: &str) {
        *self.link.borrow_mut() = Some(url.to_string());
    }
}

struct CountingRenderer {
    available: bool,
    fail: bool,
}

impl TicketRenderer for CountingRenderer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn render(&self, ops: &[DrawOp], _title: &str) -> Result<Vec<u8>, RenderFailure> {
        if self.fail {
            return Err(RenderFailure("font table missing".to_string()));
        }
        Ok(vec![0u8; ops.len()])
    }
}

const WORKING: CountingRenderer = CountingRenderer {
    available: true,
    fail: false,
};

fn record(fields: FormFields) -> BookingRecord {
    BookingRecord::new(
        BookingId::parse("BK-70707").expect("id"),
        fields,
        "data:image/jpeg;base64,AAAA".to_string(),
        None,
    )
    .expect("record")
}

#[test]
fn empty_query_alerts_and_returns_to_form() {
    let host = RecordingHost::default();
    let config = BookingConfig::default();

    let result = run_ticket_page(&host, &WORKING, "", &config);

    assert!(matches!(result, Err(TicketError::Precondition(_))));
    assert_eq!(host.alerts.borrow().as_slice(), &[PRECONDITION_ALERT.to_string()]);
    assert_eq!(host.visited.borrow().as_slice(), &["index.html".to_string()]);
    assert!(host.saved.borrow().is_empty());
    assert!(host.link.borrow().is_none());
}

#[test]
fn unavailable_renderer_is_a_precondition_failure() {
    let host = RecordingHost::default();
    let renderer = CountingRenderer {
        available: false,
        fail: false,
    };

    let result = run_ticket_page(&host, &renderer, "fullName=Ruwan", &BookingConfig::default());

    assert_eq!(result.err(), Some(TicketError::RendererUnavailable));
    assert_eq!(host.alerts.borrow().len(), 1);
    assert_eq!(host.visited.borrow().len(), 1);
}

#[test]
fn render_failure_sends_user_back() {
    let host = RecordingHost::default();
    let renderer = CountingRenderer {
        available: true,
        fail: true,
    };

    let result = run_ticket_page(&host, &renderer, "fullName=Ruwan", &BookingConfig::default());

    assert!(matches!(result, Err(TicketError::Render(_))));
    assert_eq!(host.visited.borrow().as_slice(), &["index.html".to_string()]);
}

#[test]
fn valid_handoff_saves_ticket_and_sets_link() {
    let fields = FormFields {
        full_name: "Tharushi Silva".to_string(),
        whatsapp: "0712345678".to_string(),
        dob: "2001-07-19".to_string(),
        tob: "08:00".to_string(),
        pob: "Matara".to_string(),
        service: "Horoscope Reading".to_string(),
        question: String::new(),
    };
    let envelope = HandoffEnvelope::from_record(&record(fields));
    let host = RecordingHost::default();

    let ticket = run_ticket_page(&host, &WORKING, &envelope.query(), &BookingConfig::default())
        .expect("ticket");

    assert_eq!(ticket.view, envelope.ticket);
    let saved = host.saved.borrow();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "Ticket_Tharushi Silva.pdf");
    assert!(saved[0].1 > 0);
    let link = host.link.borrow().clone().expect("link");
    assert!(link.starts_with("https://wa.me/94752582482?text="));
    assert!(link.contains("BK-70707"));
    assert!(host.alerts.borrow().is_empty());
    assert!(host.visited.borrow().is_empty());
}

#[test]
fn scalar_fields_survive_the_url_verbatim() {
    let samples = [
        "plain",
        "with space",
        "a&b=c?d#e",
        "100% + more",
        "line\nbreak",
        "ශ්‍රී ලංකා",
        "emoji \u{1F31F}",
        "  padded  ",
    ];
    for sample in samples {
        let fields = FormFields {
            full_name: format!("Name {sample}"),
            whatsapp: sample.to_string(),
            dob: sample.to_string(),
            tob: sample.to_string(),
            pob: sample.to_string(),
            service: sample.to_string(),
            question: sample.to_string(),
        };
        let envelope = HandoffEnvelope::from_record(&record(fields.clone()));
        let url = envelope.ticket_url("ticket.html");
        let (_, query) = url.split_once('?').expect("query");

        let view = TicketViewModel::from_query(query).expect("view");

        assert_eq!(view.full_name, fields.full_name, "{sample:?}");
        assert_eq!(view.whatsapp, fields.whatsapp, "{sample:?}");
        assert_eq!(view.dob, fields.dob, "{sample:?}");
        assert_eq!(view.tob, fields.tob, "{sample:?}");
        assert_eq!(view.pob, fields.pob, "{sample:?}");
        assert_eq!(view.service, fields.service, "{sample:?}");
        assert_eq!(view.question, fields.question, "{sample:?}");
        assert_eq!(view.id, "BK-70707");
    }
}

#[test]
fn images_are_recovered_by_key_not_by_url() {
    let store = MemorySessionStore::new();
    let booking = record(FormFields {
        full_name: "Ishara".to_string(),
        ..FormFields::default()
    });
    let envelope = HandoffEnvelope::from_record(&booking);
    envelope.persist_images(&store, &booking).expect("persist");

    let received = HandoffEnvelope::from_query(&envelope.query()).expect("received");
    let images = received.load_images(&store);

    assert_eq!(images.payment_slip.as_deref(), Some("data:image/jpeg;base64,AAAA"));
    assert_eq!(images.horoscope, None);
    assert_eq!(store.get_item(HOROSCOPE_KEY).as_deref(), Some(""));
    assert!(store.get_item(PAYMENT_SLIP_KEY).is_some());
    assert!(!envelope.query().contains("AAAA"));
}
