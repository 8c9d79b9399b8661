//! The `CampusStore` trait: the authoritative ledgers behind every operation.
//!
//! The trait is implemented by storage backends (e.g. `campus-store-sqlite`).
//! Higher layers (`campus-api`, `campus-server`) depend on this abstraction,
//! not on any concrete backend.
//!
//! Every mutating method validates fully and then applies its change
//! atomically: either the whole check-and-mutate happens or nothing does.
//! Methods taking an `at`/`as_of` instant default it to the current time; it
//! exists so callers and tests can pin the clock.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  book::{Book, BookUpdate, NewBook},
  error::Classify,
  feedback::{Feedback, FeedbackResponse, NewFeedback},
  loan::{Loan, LoanQuery},
  room::{NewRoom, Room, RoomUpdate},
};

/// Abstraction over a campus ledger backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CampusStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Room catalog & occupancy ledger ─────────────────────────────────────

  /// Fails with `DuplicateRoom`, `InvalidCapacity`, or `InvalidInput`.
  fn create_room(
    &self,
    input: NewRoom,
  ) -> impl Future<Output = Result<Room, Self::Error>> + Send + '_;

  fn get_room(
    &self,
    number: u32,
  ) -> impl Future<Output = Result<Option<Room>, Self::Error>> + Send + '_;

  /// All rooms, ascending by number.
  fn list_rooms(
    &self,
  ) -> impl Future<Output = Result<Vec<Room>, Self::Error>> + Send + '_;

  /// Change capacity and/or purpose. Never touches occupants.
  fn update_room(
    &self,
    number: u32,
    update: RoomUpdate,
  ) -> impl Future<Output = Result<Room, Self::Error>> + Send + '_;

  /// Delete an empty room and return it. Fails with `RoomNotEmpty` otherwise.
  fn delete_room(
    &self,
    number: u32,
  ) -> impl Future<Output = Result<Room, Self::Error>> + Send + '_;

  /// Fails with `RoomFull` or `AlreadyAssigned`.
  fn assign_student<'a>(
    &'a self,
    number: u32,
    student_id: &'a str,
  ) -> impl Future<Output = Result<Room, Self::Error>> + Send + 'a;

  /// Fails with `NotAssigned` if the student is not in that room.
  fn remove_student<'a>(
    &'a self,
    number: u32,
    student_id: &'a str,
  ) -> impl Future<Output = Result<Room, Self::Error>> + Send + 'a;

  /// The room a student currently occupies, if any.
  fn room_of<'a>(
    &'a self,
    student_id: &'a str,
  ) -> impl Future<Output = Result<Option<Room>, Self::Error>> + Send + 'a;

  /// See [`crate::room::next_available_room_number`].
  fn next_available_room_number(
    &self,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  // ── Inventory catalog ───────────────────────────────────────────────────

  /// Fails with `DuplicateBookId`. All copies start available.
  fn add_book(
    &self,
    input: NewBook,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + '_;

  fn get_book<'a>(
    &'a self,
    book_id: &'a str,
  ) -> impl Future<Output = Result<Option<Book>, Self::Error>> + Send + 'a;

  /// All books, ordered by title.
  fn list_books(
    &self,
  ) -> impl Future<Output = Result<Vec<Book>, Self::Error>> + Send + '_;

  fn update_book<'a>(
    &'a self,
    book_id: &'a str,
    update: BookUpdate,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + 'a;

  /// Remove a title from the catalog. Fails with `BookInCirculation` while any
  /// issued or lost loan references it; closed loans are kept as history.
  fn remove_book<'a>(
    &'a self,
    book_id: &'a str,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + 'a;

  // ── Circulation ledger ──────────────────────────────────────────────────

  /// Issue one copy. Checks, in order: `BookNotFound`, `NoCopiesAvailable`,
  /// `LoanLimitExceeded`. `issue_date` defaults to today (UTC).
  fn issue_book<'a>(
    &'a self,
    book_id: &'a str,
    student_id: &'a str,
    issue_date: Option<NaiveDate>,
  ) -> impl Future<Output = Result<Loan, Self::Error>> + Send + 'a;

  /// Close an active loan, freezing its fine as of `at`.
  fn return_book(
    &self,
    loan_id: Uuid,
    at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Loan, Self::Error>> + Send + '_;

  /// Report an active loan's copy as lost; the copy leaves the catalog.
  fn mark_lost(
    &self,
    loan_id: Uuid,
    at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Loan, Self::Error>> + Send + '_;

  /// Bring a lost copy back into circulation. Fails with `LoanNotLost`.
  fn recover_book(
    &self,
    loan_id: Uuid,
    at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Loan, Self::Error>> + Send + '_;

  /// A loan resolved against `as_of`.
  fn get_loan(
    &self,
    loan_id: Uuid,
    as_of: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Option<Loan>, Self::Error>> + Send + '_;

  /// Loans matching `query`, resolved against `as_of`, newest issue first.
  fn list_loans<'a>(
    &'a self,
    query: &'a LoanQuery,
    as_of: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<Loan>, Self::Error>> + Send + 'a;

  /// Overdue loans as of `as_of`, most days overdue first.
  fn list_overdue(
    &self,
    as_of: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<Loan>, Self::Error>> + Send + '_;

  /// Stamp `reminder_sent_at` on an active loan and return it resolved.
  /// Does not suppress repeats.
  fn record_reminder(
    &self,
    loan_id: Uuid,
    at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Loan, Self::Error>> + Send + '_;

  // ── Feedback triage ─────────────────────────────────────────────────────

  fn submit_feedback(
    &self,
    input: NewFeedback,
  ) -> impl Future<Output = Result<Feedback, Self::Error>> + Send + '_;

  fn get_feedback(
    &self,
    feedback_id: Uuid,
  ) -> impl Future<Output = Result<Option<Feedback>, Self::Error>> + Send + '_;

  /// Every feedback item, newest first.
  fn list_feedback(
    &self,
  ) -> impl Future<Output = Result<Vec<Feedback>, Self::Error>> + Send + '_;

  fn respond(
    &self,
    feedback_id: Uuid,
    input: FeedbackResponse,
    at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Feedback, Self::Error>> + Send + '_;

  fn toggle_resolved(
    &self,
    feedback_id: Uuid,
    resolved: bool,
    at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Feedback, Self::Error>> + Send + '_;
}
