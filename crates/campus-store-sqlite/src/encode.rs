//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`,
//! money as decimal strings, and enums as their snake_case names. UUIDs are
//! stored as hyphenated lowercase strings.

use std::{collections::BTreeSet, str::FromStr};

use campus_core::{
  book::Book,
  feedback::Feedback,
  loan::Loan,
  room::Room,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

pub fn decode_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

pub fn encode_decimal(d: Decimal) -> String { d.round_dp(2).to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

/// Decode any strum-backed enum from its stored name.
pub fn decode_enum<T: FromStr>(what: &str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

pub fn decode_count(what: &str, n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Decode(format!("{what} out of range: {n}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const ROOM_COLUMNS: &str = "number, capacity, purpose, created_at";

/// Raw values read from a `rooms` row plus its occupants.
pub struct RawRoom {
  pub number:     i64,
  pub capacity:   i64,
  pub purpose:    String,
  pub created_at: String,
  pub occupants:  Vec<String>,
}

impl RawRoom {
  /// Read the `ROOM_COLUMNS` of `row`; occupants are filled in separately.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      number:     row.get(0)?,
      capacity:   row.get(1)?,
      purpose:    row.get(2)?,
      created_at: row.get(3)?,
      occupants:  Vec::new(),
    })
  }

  pub fn into_room(self) -> Result<Room> {
    let purpose: campus_core::room::RoomPurpose =
      decode_enum("room purpose", &self.purpose)?;
    Ok(Room {
      number: decode_count("room number", self.number)?,
      capacity: decode_count("capacity", self.capacity)?,
      purpose,
      is_special: purpose.is_special(),
      occupant_ids: self.occupants.into_iter().collect::<BTreeSet<_>>(),
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const BOOK_COLUMNS: &str =
  "book_id, title, author, price, total_copies, available_copies, added_at";

/// Raw values read from a `books` row.
pub struct RawBook {
  pub book_id:          String,
  pub title:            String,
  pub author:           String,
  pub price:            String,
  pub total_copies:     i64,
  pub available_copies: i64,
  pub added_at:         String,
}

impl RawBook {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      book_id:          row.get(0)?,
      title:            row.get(1)?,
      author:           row.get(2)?,
      price:            row.get(3)?,
      total_copies:     row.get(4)?,
      available_copies: row.get(5)?,
      added_at:         row.get(6)?,
    })
  }

  pub fn into_book(self) -> Result<Book> {
    Ok(Book {
      book_id:          self.book_id,
      title:            self.title,
      author:           self.author,
      price:            decode_decimal(&self.price)?,
      total_copies:     decode_count("total copies", self.total_copies)?,
      available_copies: decode_count("available copies", self.available_copies)?,
      added_at:         decode_dt(&self.added_at)?,
    })
  }
}

pub const LOAN_COLUMNS: &str = "loan_id, book_id, student_id, issue_date, due_date, \
   actual_return_date, status, fine, lost_at, recovered_at, reminder_sent_at";

/// Raw values read from a `loans` row.
pub struct RawLoan {
  pub loan_id:            String,
  pub book_id:            String,
  pub student_id:         String,
  pub issue_date:         String,
  pub due_date:           String,
  pub actual_return_date: Option<String>,
  pub status:             String,
  pub fine:               String,
  pub lost_at:            Option<String>,
  pub recovered_at:       Option<String>,
  pub reminder_sent_at:   Option<String>,
}

impl RawLoan {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      loan_id:            row.get(0)?,
      book_id:            row.get(1)?,
      student_id:         row.get(2)?,
      issue_date:         row.get(3)?,
      due_date:           row.get(4)?,
      actual_return_date: row.get(5)?,
      status:             row.get(6)?,
      fine:               row.get(7)?,
      lost_at:            row.get(8)?,
      recovered_at:       row.get(9)?,
      reminder_sent_at:   row.get(10)?,
    })
  }

  /// Decode the stored record. The status is the persisted one; resolve it
  /// against a clock with [`Loan::resolved`] before handing it out.
  pub fn into_loan(self) -> Result<Loan> {
    Ok(Loan {
      loan_id:            decode_uuid(&self.loan_id)?,
      book_id:            self.book_id,
      student_id:         self.student_id,
      issue_date:         decode_date(&self.issue_date)?,
      due_date:           decode_date(&self.due_date)?,
      actual_return_date: decode_opt_dt(self.actual_return_date.as_deref())?,
      status:             decode_enum("loan status", &self.status)?,
      fine:               decode_decimal(&self.fine)?,
      lost_at:            decode_opt_dt(self.lost_at.as_deref())?,
      recovered_at:       decode_opt_dt(self.recovered_at.as_deref())?,
      reminder_sent_at:   decode_opt_dt(self.reminder_sent_at.as_deref())?,
    })
  }
}

pub const FEEDBACK_COLUMNS: &str = "feedback_id, student_id, category, rating, comment, \
   anonymous, created_at, response, priority, is_resolved, responded_at, resolved_at";

/// Raw values read from a `feedback` row.
pub struct RawFeedback {
  pub feedback_id:  String,
  pub student_id:   Option<String>,
  pub category:     String,
  pub rating:       i64,
  pub comment:      String,
  pub anonymous:    bool,
  pub created_at:   String,
  pub response:     Option<String>,
  pub priority:     String,
  pub is_resolved:  bool,
  pub responded_at: Option<String>,
  pub resolved_at:  Option<String>,
}

impl RawFeedback {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      feedback_id:  row.get(0)?,
      student_id:   row.get(1)?,
      category:     row.get(2)?,
      rating:       row.get(3)?,
      comment:      row.get(4)?,
      anonymous:    row.get(5)?,
      created_at:   row.get(6)?,
      response:     row.get(7)?,
      priority:     row.get(8)?,
      is_resolved:  row.get(9)?,
      responded_at: row.get(10)?,
      resolved_at:  row.get(11)?,
    })
  }

  pub fn into_feedback(self) -> Result<Feedback> {
    let rating = u8::try_from(self.rating)
      .map_err(|_| Error::Decode(format!("rating out of range: {}", self.rating)))?;
    let mut fb = Feedback {
      feedback_id: decode_uuid(&self.feedback_id)?,
      student_id: self.student_id,
      category: decode_enum("feedback category", &self.category)?,
      rating,
      comment: self.comment,
      anonymous: self.anonymous,
      created_at: decode_dt(&self.created_at)?,
      response: self.response,
      priority: decode_enum("priority", &self.priority)?,
      is_resolved: self.is_resolved,
      responded_at: decode_opt_dt(self.responded_at.as_deref())?,
      resolved_at: decode_opt_dt(self.resolved_at.as_deref())?,
      status: campus_core::feedback::FeedbackStatus::Pending,
    };
    fb.status = fb.derive_status();
    Ok(fb)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_roundtrip_as_iso_strings() {
    let d = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
    assert_eq!(encode_date(d), "2024-01-16");
    assert_eq!(decode_date("2024-01-16").unwrap(), d);
    assert!(decode_date("16/01/2024").is_err());
  }

  #[test]
  fn decimals_keep_two_places() {
    assert_eq!(encode_decimal(Decimal::new(12345, 3)), "12.34");
    assert_eq!(decode_decimal("20").unwrap(), Decimal::from(20));
  }

  #[test]
  fn unknown_enum_names_are_decode_errors() {
    let err = decode_enum::<campus_core::loan::LoanStatus>("loan status", "borrowed")
      .unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
  }
}
