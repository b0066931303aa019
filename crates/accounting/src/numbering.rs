//! Human-readable journal entry numbers: `JE-YYYY-MM-NNNN`.
//!
//! The sequence restarts at 1 for every company and calendar month. The string
//! format is a compatibility contract with existing data.

use core::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, ValueObject};

/// Calendar month an entry number belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryPeriod {
    pub year: i32,
    pub month: u32,
}

impl EntryPeriod {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// `JE-YYYY-MM-`, the prefix shared by every number in this period.
    pub fn prefix(&self) -> String {
        format!("JE-{:04}-{:02}-", self.year, self.month)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryNumber {
    period: EntryPeriod,
    sequence: u32,
}

impl ValueObject for EntryNumber {}

impl EntryNumber {
    pub fn new(period: EntryPeriod, sequence: u32) -> Result<Self, DomainError> {
        if sequence == 0 {
            return Err(DomainError::validation("entry sequence starts at 1"));
        }
        if !(1..=12).contains(&period.month) {
            return Err(DomainError::validation(format!("invalid month {}", period.month)));
        }
        Ok(Self { period, sequence })
    }

    /// Next number after the highest existing sequence in `period` (1 when none).
    pub fn next(period: EntryPeriod, last_sequence: Option<u32>) -> Result<Self, DomainError> {
        let sequence = match last_sequence {
            Some(last) => last
                .checked_add(1)
                .ok_or_else(|| DomainError::invariant("entry sequence overflow"))?,
            None => 1,
        };
        Self::new(period, sequence)
    }

    pub fn period(&self) -> EntryPeriod {
        self.period
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl core::fmt::Display for EntryNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{:04}", self.period.prefix(), self.sequence)
    }
}

impl FromStr for EntryNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::invalid_id(format!("EntryNumber: {s}"));

        let rest = s.strip_prefix("JE-").ok_or_else(invalid)?;
        let mut parts = rest.splitn(3, '-');
        let (Some(year), Some(month), Some(sequence)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let digits = |p: &str, min_len: usize| p.len() >= min_len && p.bytes().all(|b| b.is_ascii_digit());
        if !(digits(year, 4) && year.len() == 4 && digits(month, 2) && month.len() == 2 && digits(sequence, 4)) {
            return Err(invalid());
        }

        let period = EntryPeriod {
            year: year.parse().map_err(|_| invalid())?,
            month: month.parse().map_err(|_| invalid())?,
        };
        let sequence = sequence.parse().map_err(|_| invalid())?;
        Self::new(period, sequence).map_err(|_| invalid())
    }
}

impl TryFrom<String> for EntryNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntryNumber> for String {
    fn from(value: EntryNumber) -> Self {
        value.to_string()
    }
}
