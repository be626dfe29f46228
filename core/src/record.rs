use serde::{Deserialize, Serialize};

use crate::booking_id::BookingId;

/// Scalar values collected from the booking form, one per logical field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFields {
    pub full_name: String,
    pub whatsapp: String,
    pub dob: String,
    pub tob: String,
    pub pob: String,
    pub service: String,
    pub question: String,
}

/// One consultation request as sent to the booking endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: BookingId,
    pub full_name: String,
    pub whatsapp: String,
    pub dob: String,
    pub tob: String,
    pub pob: String,
    pub service: String,
    pub question: String,
    pub payment_slip_data: String,
    pub horoscope_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("payment slip image data is empty")]
pub struct MissingPaymentSlipData;

impl BookingRecord {
    /// Fails when `payment_slip_data` is empty; the horoscope image may be.
    pub fn new(
        id: BookingId,
        fields: FormFields,
        payment_slip_data: String,
        horoscope_data: Option<String>,
    ) -> Result<Self, MissingPaymentSlipData> {
        if payment_slip_data.is_empty() {
            return Err(MissingPaymentSlipData);
        }
        let FormFields {
            full_name,
            whatsapp,
            dob,
            tob,
            pob,
            service,
            question,
        } = fields;
        Ok(Self {
            id,
            full_name,
            whatsapp,
            dob,
            tob,
            pob,
            service,
            question,
            payment_slip_data,
            horoscope_data: horoscope_data.unwrap_or_default(),
        })
    }

    pub fn fields(&self) -> FormFields {
        FormFields {
            full_name: self.full_name.clone(),
            whatsapp: self.whatsapp.clone(),
            dob: self.dob.clone(),
            tob: self.tob.clone(),
            pob: self.pob.clone(),
            service: self.service.clone(),
            question: self.question.clone(),
        }
    }

    pub fn has_horoscope(&self) -> bool {
        !self.horoscope_data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> FormFields {
        FormFields {
            full_name: "Nimal Perera".to_string(),
            whatsapp: "+94 77 123 4567".to_string(),
            dob: "1990-04-14".to_string(),
            tob: "06:45".to_string(),
            pob: "Kandy".to_string(),
            service: "Horoscope Reading".to_string(),
            question: "Career?".to_string(),
        }
    }

    #[test]
    fn record_requires_payment_slip() {
        let id = BookingId::parse("BK-12345").expect("id");
        assert_eq!(
            BookingRecord::new(id, fields(), String::new(), None),
            Err(MissingPaymentSlipData)
        );
    }

    #[test]
    fn record_serializes_with_camel_case_keys() {
        let id = BookingId::parse("BK-12345").expect("id");
        let record = BookingRecord::new(id, fields(), "data:image/jpeg;base64,AA".into(), None)
            .expect("record");
        let json = serde_json::to_value(&record).expect("json");
        assert_eq!(json["id"], "BK-12345");
        assert_eq!(json["fullName"], "Nimal Perera");
        assert_eq!(json["paymentSlipData"], "data:image/jpeg;base64,AA");
        assert_eq!(json["horoscopeData"], "");
        assert!(!record.has_horoscope());
        assert_eq!(record.fields(), fields());
    }
}
