use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const BOOKING_ID_PREFIX: &str = "BK-";
pub const BOOKING_ID_DIGITS: usize = 5;
pub const BOOKING_ID_MIN: u32 = 10_000;
pub const BOOKING_ID_MAX: u32 = 99_999;

pub fn is_valid_booking_id(value: &str) -> bool {
    BookingId::parse(value).is_ok()
}

/// Client-generated booking reference, `BK-` followed by five digits.
///
/// Uniqueness is not checked anywhere; two submissions can collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookingId(String);

impl BookingId {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let number = rng.gen_range(BOOKING_ID_MIN..=BOOKING_ID_MAX);
        Self(format!("{BOOKING_ID_PREFIX}{number}"))
    }

    pub fn parse(value: &str) -> Result<Self, BookingIdError> {
        let Some(digits) = value.strip_prefix(BOOKING_ID_PREFIX) else {
            return Err(BookingIdError::InvalidPrefix);
        };
        if digits.len() != BOOKING_ID_DIGITS {
            return Err(BookingIdError::InvalidLength {
                expected: BOOKING_ID_DIGITS,
                found: digits.len(),
            });
        }
        for (idx, ch) in digits.chars().enumerate() {
            if !ch.is_ascii_digit() {
                return Err(BookingIdError::InvalidDigit {
                    ch,
                    index: idx + BOOKING_ID_PREFIX.len(),
                });
            }
        }
        if digits.starts_with('0') {
            return Err(BookingIdError::InvalidDigit {
                ch: '0',
                index: BOOKING_ID_PREFIX.len(),
            });
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn number(&self) -> u32 {
        self.0[BOOKING_ID_PREFIX.len()..].parse().unwrap_or_default()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for BookingId {
    type Err = BookingIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for BookingId {
    type Error = BookingIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BookingId> for String {
    fn from(id: BookingId) -> Self {
        id.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingIdError {
    #[error("booking id must start with BK-")]
    InvalidPrefix,
    #[error("booking id must have {expected} digits, got {found}")]
    InvalidLength { expected: usize, found: usize },
    #[error("invalid character '{ch}' at position {index}")]
    InvalidDigit { ch: char, index: usize },
}
