//! Error types for `campus-core`.
//!
//! Every domain failure the engine can report lives in [`Error`]. Callers
//! branch on [`Error::kind`] rather than on individual variants; storage
//! backends wrap their own faults and expose the same classification through
//! [`Classify`].

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  // ── Not found ──────────────────────────────────────────────────────────
  #[error("room {0} not found")]
  RoomNotFound(u32),

  #[error("book {0:?} not found")]
  BookNotFound(String),

  #[error("loan {0} not found")]
  LoanNotFound(Uuid),

  #[error("feedback {0} not found")]
  FeedbackNotFound(Uuid),

  #[error("student {0:?} is not assigned to any room")]
  StudentHasNoRoom(String),

  // ── Capacity ───────────────────────────────────────────────────────────
  #[error("room {number} is full ({capacity}/{capacity})")]
  RoomFull { number: u32, capacity: u32 },

  #[error("no copies of book {0:?} are available")]
  NoCopiesAvailable(String),

  #[error("student {student_id:?} already holds {limit} active loans")]
  LoanLimitExceeded { student_id: String, limit: u32 },

  // ── Invalid state transitions ──────────────────────────────────────────
  #[error("loan {0} is not active")]
  LoanNotActive(Uuid),

  #[error("loan {0} is not marked lost")]
  LoanNotLost(Uuid),

  #[error("room {0} still has occupants")]
  RoomNotEmpty(u32),

  #[error("student {student_id:?} is already assigned to room {room}")]
  AlreadyAssigned { student_id: String, room: u32 },

  #[error("student {student_id:?} is not assigned to room {room}")]
  NotAssigned { student_id: String, room: u32 },

  #[error("room {number} has {occupants} occupants; capacity {requested} is too small")]
  CapacityBelowOccupancy {
    number:    u32,
    occupants: u32,
    requested: u32,
  },

  #[error("book {0:?} has too many copies on loan for that change")]
  CopiesInCirculation(String),

  #[error("book {0:?} still has issued or lost loans")]
  BookInCirculation(String),

  // ── Validation ─────────────────────────────────────────────────────────
  #[error("rating must be between 1 and 5, got {0}")]
  InvalidRating(u8),

  #[error("comment must not be empty")]
  EmptyComment,

  #[error("response must not be empty")]
  EmptyResponse,

  #[error("capacity must be positive")]
  InvalidCapacity,

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("room {0} already exists")]
  DuplicateRoom(u32),

  #[error("book id {0:?} already exists")]
  DuplicateBookId(String),

  // ── Dependencies ───────────────────────────────────────────────────────
  #[error("notification hook failed: {0}")]
  Notification(String),
}

/// Coarse classification of a failure, used to pick an HTTP status and a
/// logging level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Capacity,
  InvalidState,
  Validation,
  Dependency,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::RoomNotFound(_)
      | Self::BookNotFound(_)
      | Self::LoanNotFound(_)
      | Self::FeedbackNotFound(_)
      | Self::StudentHasNoRoom(_) => ErrorKind::NotFound,

      Self::RoomFull { .. }
      | Self::NoCopiesAvailable(_)
      | Self::LoanLimitExceeded { .. } => ErrorKind::Capacity,

      Self::LoanNotActive(_)
      | Self::LoanNotLost(_)
      | Self::RoomNotEmpty(_)
      | Self::AlreadyAssigned { .. }
      | Self::NotAssigned { .. }
      | Self::CapacityBelowOccupancy { .. }
      | Self::CopiesInCirculation(_)
      | Self::BookInCirculation(_) => ErrorKind::InvalidState,

      Self::InvalidRating(_)
      | Self::EmptyComment
      | Self::EmptyResponse
      | Self::InvalidCapacity
      | Self::InvalidInput(_)
      | Self::DuplicateRoom(_)
      | Self::DuplicateBookId(_) => ErrorKind::Validation,

      Self::Notification(_) => ErrorKind::Dependency,
    }
  }
}

/// Implemented by every error type a [`crate::store::CampusStore`] backend
/// returns, so upper layers can classify failures without knowing the
/// backend.
pub trait Classify {
  fn kind(&self) -> ErrorKind;

  /// The domain error behind this failure, if it is one.
  fn domain(&self) -> Option<&Error> { None }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind { Error::kind(self) }

  fn domain(&self) -> Option<&Error> { Some(self) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn capacity_failures_classify_as_capacity() {
    let full = Error::RoomFull { number: 101, capacity: 2 };
    assert_eq!(full.kind(), ErrorKind::Capacity);
    assert_eq!(full.to_string(), "room 101 is full (2/2)");

    let limit = Error::LoanLimitExceeded {
      student_id: "S1".into(),
      limit:      3,
    };
    assert_eq!(limit.kind(), ErrorKind::Capacity);
  }

  #[test]
  fn duplicates_are_validation_failures() {
    assert_eq!(Error::DuplicateRoom(7).kind(), ErrorKind::Validation);
    assert_eq!(
      Error::DuplicateBookId("B1".into()).kind(),
      ErrorKind::Validation
    );
  }

  #[test]
  fn classify_exposes_domain_error() {
    let err = Error::LoanNotActive(Uuid::nil());
    assert_eq!(Classify::kind(&err), ErrorKind::InvalidState);
    assert!(matches!(err.domain(), Some(Error::LoanNotActive(_))));
  }
}
