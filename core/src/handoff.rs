//! State carried from the form page to the ticket page.
//!
//! Scalars travel in the ticket page query string. Image strings stay in
//! session storage under fixed keys and only the keys are part of the
//! envelope.

use std::cell::RefCell;
use std::collections::HashMap;

use url::form_urlencoded;

use crate::record::BookingRecord;

pub const PAYMENT_SLIP_KEY: &str = "paymentSlipData";
pub const HOROSCOPE_KEY: &str = "horoscopeData";

pub const KEY_ID: &str = "id";
pub const KEY_FULL_NAME: &str = "fullName";
pub const KEY_WHATSAPP: &str = "whatsapp";
pub const KEY_DOB: &str = "dob";
pub const KEY_TOB: &str = "tob";
pub const KEY_POB: &str = "pob";
pub const KEY_SERVICE: &str = "service";
pub const KEY_QUESTION: &str = "question";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandoffError {
    #[error("booking data is missing the client name")]
    MissingName,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("session storage write failed: {0}")]
pub struct StorageError(pub String);

/// Tab-scoped key/value storage shared by the two pages.
pub trait SessionStore {
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn get_item(&self, key: &str) -> Option<String>;
}

impl<S: SessionStore + ?Sized> SessionStore for &S {
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }
}

/// Display fields of a booking as read back on the ticket page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketViewModel {
    pub id: String,
    pub full_name: String,
    pub whatsapp: String,
    pub dob: String,
    pub tob: String,
    pub pob: String,
    pub service: String,
    pub question: String,
}

impl TicketViewModel {
    pub fn from_record(record: &BookingRecord) -> Self {
        Self {
            id: record.id.to_string(),
            full_name: record.full_name.clone(),
            whatsapp: record.whatsapp.clone(),
            dob: record.dob.clone(),
            tob: record.tob.clone(),
            pob: record.pob.clone(),
            service: record.service.clone(),
            question: record.question.clone(),
        }
    }

    /// Reads the eight scalar keys; the first occurrence of a key wins and
    /// missing keys read as empty strings. Fails only when the name is
    /// missing or blank.
    pub fn from_query(query: &str) -> Result<Self, HandoffError> {
        let query = query.trim().trim_start_matches('?');
        let mut view = TicketViewModel::default();
        let mut seen: Vec<String> = Vec::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if seen.iter().any(|known| known.as_str() == key.as_ref()) {
                continue;
            }
            let slot = match key.as_ref() {
                KEY_ID => &mut view.id,
                KEY_FULL_NAME => &mut view.full_name,
                KEY_WHATSAPP => &mut view.whatsapp,
                KEY_DOB => &mut view.dob,
                KEY_TOB => &mut view.tob,
                KEY_POB => &mut view.pob,
                KEY_SERVICE => &mut view.service,
                KEY_QUESTION => &mut view.question,
                _ => continue,
            };
            *slot = value.into_owned();
            seen.push(key.into_owned());
        }
        if view.full_name.trim().is_empty() {
            return Err(HandoffError::MissingName);
        }
        Ok(view)
    }

    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair(KEY_ID, &self.id)
            .append_pair(KEY_FULL_NAME, &self.full_name)
            .append_pair(KEY_WHATSAPP, &self.whatsapp)
            .append_pair(KEY_DOB, &self.dob)
            .append_pair(KEY_TOB, &self.tob)
            .append_pair(KEY_POB, &self.pob)
            .append_pair(KEY_SERVICE, &self.service)
            .append_pair(KEY_QUESTION, &self.question)
            .finish()
    }
}

/// Session storage keys under which the normalized images are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRefs {
    pub payment_slip: &'static str,
    pub horoscope: &'static str,
}

impl Default for ImageRefs {
    fn default() -> Self {
        Self {
            payment_slip: PAYMENT_SLIP_KEY,
            horoscope: HOROSCOPE_KEY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredImages {
    pub payment_slip: Option<String>,
    pub horoscope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffEnvelope {
    pub ticket: TicketViewModel,
    pub images: ImageRefs,
}

impl HandoffEnvelope {
    pub fn from_record(record: &BookingRecord) -> Self {
        Self {
            ticket: TicketViewModel::from_record(record),
            images: ImageRefs::default(),
        }
    }

    pub fn from_query(query: &str) -> Result<Self, HandoffError> {
        Ok(Self {
            ticket: TicketViewModel::from_query(query)?,
            images: ImageRefs::default(),
        })
    }

    pub fn query(&self) -> String {
        self.ticket.to_query()
    }

    pub fn ticket_url(&self, ticket_path: &str) -> String {
        format!("{ticket_path}?{}", self.query())
    }

    /// Writes both image strings. An absent horoscope is stored as "".
    pub fn persist_images<S: SessionStore>(
        &self,
        store: &S,
        record: &BookingRecord,
    ) -> Result<(), StorageError> {
        store.set_item(self.images.payment_slip, &record.payment_slip_data)?;
        store.set_item(self.images.horoscope, &record.horoscope_data)?;
        Ok(())
    }

    pub fn load_images<S: SessionStore>(&self, store: &S) -> StoredImages {
        let read = |key: &str| store.get_item(key).filter(|value| !value.is_empty());
        StoredImages {
            payment_slip: read(self.images.payment_slip),
            horoscope: read(self.images.horoscope),
        }
    }
}
