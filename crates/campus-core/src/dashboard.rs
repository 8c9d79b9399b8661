//! Role-scoped dashboard summaries, built from already-listed records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  book::Book,
  loan::{Loan, LoanStatus},
  room::Room,
  triage::FeedbackStats,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
  pub rooms:          usize,
  pub total_capacity: u32,
  pub occupied:       u32,
  pub free_beds:      u32,
  pub full_rooms:     usize,
  pub special_rooms:  usize,
}

impl RoomSummary {
  pub fn from_rooms(rooms: &[Room]) -> Self {
    Self {
      rooms:          rooms.len(),
      total_capacity: rooms.iter().map(|r| r.capacity).sum(),
      occupied:       rooms.iter().map(Room::occupancy).sum(),
      free_beds:      rooms.iter().map(Room::free_beds).sum(),
      full_rooms:     rooms.iter().filter(|r| r.is_full()).count(),
      special_rooms:  rooms.iter().filter(|r| r.is_special).count(),
    }
  }
}

/// `loans` must already be resolved against the same instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CirculationSummary {
  pub titles:            usize,
  pub total_copies:      u32,
  pub available_copies:  u32,
  pub active_loans:      usize,
  pub overdue_loans:     usize,
  pub lost_loans:        usize,
  /// Fines on loans that are still out or lost.
  pub outstanding_fines: Decimal,
}

impl CirculationSummary {
  pub fn from_records(books: &[Book], loans: &[Loan]) -> Self {
    Self {
      titles:            books.len(),
      total_copies:      books.iter().map(|b| b.total_copies).sum(),
      available_copies:  books.iter().map(|b| b.available_copies).sum(),
      active_loans:      loans.iter().filter(|l| l.status.is_active()).count(),
      overdue_loans:     count_status(loans, LoanStatus::Overdue),
      lost_loans:        count_status(loans, LoanStatus::Lost),
      outstanding_fines: outstanding(loans),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
  pub student_id:        String,
  pub room:              Option<Room>,
  pub loans:             Vec<Loan>,
  pub active_loans:      usize,
  pub outstanding_fines: Decimal,
}

impl StudentSummary {
  pub fn new(student_id: impl Into<String>, room: Option<Room>, loans: Vec<Loan>) -> Self {
    let active_loans = loans.iter().filter(|l| l.status.is_active()).count();
    let outstanding_fines = outstanding(&loans);
    Self {
      student_id: student_id.into(),
      room,
      loans,
      active_loans,
      outstanding_fines,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Dashboard {
  Admin {
    rooms:       RoomSummary,
    circulation: CirculationSummary,
    feedback:    FeedbackStats,
  },
  Warden {
    rooms:    RoomSummary,
    feedback: FeedbackStats,
  },
  Student(StudentSummary),
}

fn count_status(loans: &[Loan], status: LoanStatus) -> usize {
  loans.iter().filter(|l| l.status == status).count()
}

fn outstanding(loans: &[Loan]) -> Decimal {
  loans
    .iter()
    .filter(|l| l.status.is_active() || l.status == LoanStatus::Lost)
    .map(|l| l.fine)
    .sum()
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use chrono::{NaiveDate, TimeZone, Utc};

  use super::*;
  use crate::{loan::CirculationPolicy, room::RoomPurpose};

  fn room(number: u32, capacity: u32, occupants: &[&str], purpose: RoomPurpose) -> Room {
    Room {
      number,
      capacity,
      purpose,
      is_special: purpose.is_special(),
      occupant_ids: occupants.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
      created_at: Utc::now(),
    }
  }

  #[test]
  fn room_summary_totals() {
    let rooms = vec![
      room(1, 2, &["a", "b"], RoomPurpose::Regular),
      room(2, 3, &["c"], RoomPurpose::Regular),
      room(3, 1, &[], RoomPurpose::SickBay),
    ];
    let s = RoomSummary::from_rooms(&rooms);
    assert_eq!(s.rooms, 3);
    assert_eq!(s.total_capacity, 6);
    assert_eq!(s.occupied, 3);
    assert_eq!(s.free_beds, 3);
    assert_eq!(s.full_rooms, 1);
    assert_eq!(s.special_rooms, 1);
  }

  #[test]
  fn outstanding_fines_skip_settled_loans() {
    let policy = CirculationPolicy::default();
    let now = Utc.with_ymd_and_hms(2024, 1, 20, 9, 0, 0).unwrap();
    let issued = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let overdue = Loan::issue("B1", "S1", issued, &policy).resolved(now, &policy);
    let mut returned = Loan::issue("B2", "S1", issued, &policy);
    returned.status = LoanStatus::Returned;
    returned.fine = Decimal::from(100);

    let summary = StudentSummary::new("S1", None, vec![overdue, returned]);
    assert_eq!(summary.active_loans, 1);
    assert_eq!(summary.outstanding_fines, Decimal::from(20));
  }
}
