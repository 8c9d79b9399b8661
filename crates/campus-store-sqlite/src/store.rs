//! [`SqliteStore`] — the SQLite implementation of [`CampusStore`].
//!
//! Every mutation runs inside a single `BEGIN IMMEDIATE` transaction on the
//! store's connection thread, so the check and the write it guards can never
//! interleave with another mutation. A rule violation returns early, which
//! drops the transaction and rolls it back.

use std::{collections::BTreeSet, path::Path};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use campus_core::{
  book::{Book, BookUpdate, NewBook},
  feedback::{Feedback, FeedbackResponse, NewFeedback},
  loan::{self, CirculationPolicy, Loan, LoanQuery, LoanStatus},
  room::{self, NewRoom, Room, RoomUpdate},
  store::CampusStore,
};

use crate::{
  encode::{
    encode_date, encode_decimal, encode_dt, encode_uuid, RawBook, RawFeedback, RawLoan,
    RawRoom, BOOK_COLUMNS, FEEDBACK_COLUMNS, LOAN_COLUMNS, ROOM_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

// Inside a `call` closure the outer `Ok` commits to the connection result and
// the inner `Err` carries the rule violation back to the caller.
macro_rules! bail {
  ($e:expr) => {
    return Ok(Err(Error::from($e)))
  };
}

// `?` for crate-level results inside a `call` closure.
macro_rules! check {
  ($e:expr) => {
    match $e {
      Ok(v) => v,
      Err(e) => return Ok(Err(Error::from(e))),
    }
  };
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A campus ledger backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  policy: CirculationPolicy,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, policy: CirculationPolicy::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, policy: CirculationPolicy::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Replace the circulation rules used for due dates, fines and limits.
  pub fn with_policy(mut self, policy: CirculationPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn policy(&self) -> &CirculationPolicy { &self.policy }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn load_room(conn: &Connection, number: u32) -> rusqlite::Result<Option<RawRoom>> {
  let raw = conn
    .query_row(
      &format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE number = ?1"),
      rusqlite::params![number],
      RawRoom::from_row,
    )
    .optional()?;
  let Some(mut raw) = raw else {
    return Ok(None);
  };
  raw.occupants = occupants_of(conn, number)?;
  Ok(Some(raw))
}

fn occupants_of(conn: &Connection, number: u32) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(
    "SELECT student_id FROM room_occupants WHERE room_number = ?1 ORDER BY student_id",
  )?;
  let ids = stmt
    .query_map(rusqlite::params![number], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(ids)
}

fn room_number_of(conn: &Connection, student_id: &str) -> rusqlite::Result<Option<u32>> {
  conn
    .query_row(
      "SELECT room_number FROM room_occupants WHERE student_id = ?1",
      rusqlite::params![student_id],
      |row| row.get(0),
    )
    .optional()
}

fn load_book(conn: &Connection, book_id: &str) -> rusqlite::Result<Option<RawBook>> {
  conn
    .query_row(
      &format!("SELECT {BOOK_COLUMNS} FROM books WHERE book_id = ?1"),
      rusqlite::params![book_id],
      RawBook::from_row,
    )
    .optional()
}

fn load_loan(conn: &Connection, loan_id: &str) -> rusqlite::Result<Option<RawLoan>> {
  conn
    .query_row(
      &format!("SELECT {LOAN_COLUMNS} FROM loans WHERE loan_id = ?1"),
      rusqlite::params![loan_id],
      RawLoan::from_row,
    )
    .optional()
}

fn load_feedback(conn: &Connection, feedback_id: &str) -> rusqlite::Result<Option<RawFeedback>> {
  conn
    .query_row(
      &format!("SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE feedback_id = ?1"),
      rusqlite::params![feedback_id],
      RawFeedback::from_row,
    )
    .optional()
}

fn store_book_counts(conn: &Connection, book: &Book) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE books SET total_copies = ?2, available_copies = ?3 WHERE book_id = ?1",
    rusqlite::params![book.book_id, book.total_copies, book.available_copies],
  )?;
  Ok(())
}

/// Persist the mutable columns of a loan.
fn store_loan(conn: &Connection, loan: &Loan) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE loans SET
       actual_return_date = ?2, status = ?3, fine = ?4,
       lost_at = ?5, recovered_at = ?6, reminder_sent_at = ?7
     WHERE loan_id = ?1",
    rusqlite::params![
      encode_uuid(loan.loan_id),
      loan.actual_return_date.map(encode_dt),
      loan.status.as_ref(),
      encode_decimal(loan.fine),
      loan.lost_at.map(encode_dt),
      loan.recovered_at.map(encode_dt),
      loan.reminder_sent_at.map(encode_dt),
    ],
  )?;
  Ok(())
}

fn store_feedback(conn: &Connection, fb: &Feedback) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE feedback SET
       response = ?2, priority = ?3, is_resolved = ?4,
       responded_at = ?5, resolved_at = ?6
     WHERE feedback_id = ?1",
    rusqlite::params![
      encode_uuid(fb.feedback_id),
      fb.response,
      fb.priority.as_ref(),
      fb.is_resolved,
      fb.responded_at.map(encode_dt),
      fb.resolved_at.map(encode_dt),
    ],
  )?;
  Ok(())
}

/// A loan together with its catalog entry, if the title is still catalogued.
fn circulating_loan(
  conn: &Connection,
  loan_id: Uuid,
) -> rusqlite::Result<Result<(Loan, Option<Book>)>> {
  let Some(raw) = load_loan(conn, &encode_uuid(loan_id))? else {
    return Ok(Err(campus_core::Error::LoanNotFound(loan_id).into()));
  };
  let loan = match raw.into_loan() {
    Ok(loan) => loan,
    Err(e) => return Ok(Err(e)),
  };
  let book = match load_book(conn, &loan.book_id)?.map(RawBook::into_book).transpose() {
    Ok(book) => book,
    Err(e) => return Ok(Err(e)),
  };
  Ok(Ok((loan, book)))
}

// ─── CampusStore impl ────────────────────────────────────────────────────────

impl CampusStore for SqliteStore {
  type Error = Error;

  // ── Rooms ─────────────────────────────────────────────────────────────────

  async fn create_room(&self, input: NewRoom) -> Result<Room> {
    input.validate()?;
    let room = Room {
      number:       input.number,
      capacity:     input.capacity,
      purpose:      input.purpose,
      is_special:   input.purpose.is_special(),
      occupant_ids: BTreeSet::new(),
      created_at:   Utc::now(),
    };

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if load_room(&tx, room.number)?.is_some() {
          bail!(campus_core::Error::DuplicateRoom(room.number));
        }
        tx.execute(
          "INSERT INTO rooms (number, capacity, purpose, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            room.number,
            room.capacity,
            room.purpose.as_ref(),
            encode_dt(room.created_at),
          ],
        )?;
        tx.commit()?;
        Ok(Ok(room))
      })
      .await?
  }

  async fn get_room(&self, number: u32) -> Result<Option<Room>> {
    let raw = self.conn.call(move |conn| Ok(load_room(conn, number)?)).await?;
    raw.map(RawRoom::into_room).transpose()
  }

  async fn list_rooms(&self) -> Result<Vec<Room>> {
    let raws: Vec<RawRoom> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {ROOM_COLUMNS} FROM rooms ORDER BY number"))?;
        let mut rooms = stmt
          .query_map([], RawRoom::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        for room in &mut rooms {
          if let Ok(number) = u32::try_from(room.number) {
            room.occupants = occupants_of(conn, number)?;
          }
        }
        Ok(rooms)
      })
      .await?;

    raws.into_iter().map(RawRoom::into_room).collect()
  }

  async fn update_room(&self, number: u32, update: RoomUpdate) -> Result<Room> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(raw) = load_room(&tx, number)? else {
          bail!(campus_core::Error::RoomNotFound(number));
        };
        let mut room = check!(raw.into_room());
        check!(update.validate(number, room.occupancy()));

        if let Some(capacity) = update.capacity {
          room.capacity = capacity;
        }
        if let Some(purpose) = update.purpose {
          room.purpose = purpose;
          room.is_special = purpose.is_special();
        }
        tx.execute(
          "UPDATE rooms SET capacity = ?2, purpose = ?3 WHERE number = ?1",
          rusqlite::params![number, room.capacity, room.purpose.as_ref()],
        )?;
        tx.commit()?;
        Ok(Ok(room))
      })
      .await?
  }

  async fn delete_room(&self, number: u32) -> Result<Room> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(raw) = load_room(&tx, number)? else {
          bail!(campus_core::Error::RoomNotFound(number));
        };
        let room = check!(raw.into_room());
        if room.occupancy() > 0 {
          bail!(campus_core::Error::RoomNotEmpty(number));
        }
        tx.execute("DELETE FROM rooms WHERE number = ?1", rusqlite::params![number])?;
        tx.commit()?;
        Ok(Ok(room))
      })
      .await?
  }

  async fn assign_student(&self, number: u32, student_id: &str) -> Result<Room> {
    let student_id = student_id.trim().to_owned();
    if student_id.is_empty() {
      return Err(campus_core::Error::InvalidInput("student id must not be empty".into()).into());
    }
    let assigned_at = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(raw) = load_room(&tx, number)? else {
          bail!(campus_core::Error::RoomNotFound(number));
        };
        let mut room = check!(raw.into_room());

        if let Some(current) = room_number_of(&tx, &student_id)? {
          bail!(campus_core::Error::AlreadyAssigned { student_id, room: current });
        }
        if room.is_full() {
          bail!(campus_core::Error::RoomFull { number, capacity: room.capacity });
        }

        tx.execute(
          "INSERT INTO room_occupants (student_id, room_number, assigned_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![student_id, number, assigned_at],
        )?;
        tx.commit()?;
        room.occupant_ids.insert(student_id);
        Ok(Ok(room))
      })
      .await?
  }

  async fn remove_student(&self, number: u32, student_id: &str) -> Result<Room> {
    let student_id = student_id.trim().to_owned();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(raw) = load_room(&tx, number)? else {
          bail!(campus_core::Error::RoomNotFound(number));
        };
        let mut room = check!(raw.into_room());
        if !room.occupant_ids.remove(&student_id) {
          bail!(campus_core::Error::NotAssigned { student_id, room: number });
        }
        tx.execute(
          "DELETE FROM room_occupants WHERE student_id = ?1 AND room_number = ?2",
          rusqlite::params![student_id, number],
        )?;
        tx.commit()?;
        Ok(Ok(room))
      })
      .await?
  }

  async fn room_of(&self, student_id: &str) -> Result<Option<Room>> {
    let student_id = student_id.trim().to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        let Some(number) = room_number_of(conn, &student_id)? else {
          return Ok(None);
        };
        Ok(load_room(conn, number)?)
      })
      .await?;

    raw.map(RawRoom::into_room).transpose()
  }

  async fn next_available_room_number(&self) -> Result<u32> {
    let numbers: Vec<u32> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT number FROM rooms")?;
        let numbers = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(numbers)
      })
      .await?;

    Ok(room::next_available_room_number(&numbers))
  }

  // ── Books ─────────────────────────────────────────────────────────────────

  async fn add_book(&self, input: NewBook) -> Result<Book> {
    input.validate()?;
    let book = Book {
      book_id:          input.book_id.trim().to_owned(),
      title:            input.title.trim().to_owned(),
      author:           input.author.trim().to_owned(),
      price:            input.price.round_dp(2),
      total_copies:     input.total_copies,
      available_copies: input.total_copies,
      added_at:         Utc::now(),
    };

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if load_book(&tx, &book.book_id)?.is_some() {
          bail!(campus_core::Error::DuplicateBookId(book.book_id));
        }
        tx.execute(
          "INSERT INTO books (
             book_id, title, author, price, total_copies, available_copies, added_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            book.book_id,
            book.title,
            book.author,
            encode_decimal(book.price),
            book.total_copies,
            book.available_copies,
            encode_dt(book.added_at),
          ],
        )?;
        tx.commit()?;
        Ok(Ok(book))
      })
      .await?
  }

  async fn get_book(&self, book_id: &str) -> Result<Option<Book>> {
    let book_id = book_id.to_owned();
    let raw = self.conn.call(move |conn| Ok(load_book(conn, &book_id)?)).await?;
    raw.map(RawBook::into_book).transpose()
  }

  async fn list_books(&self) -> Result<Vec<Book>> {
    let raws: Vec<RawBook> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {BOOK_COLUMNS} FROM books ORDER BY title COLLATE NOCASE, book_id"
        ))?;
        let books = stmt
          .query_map([], RawBook::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(books)
      })
      .await?;

    raws.into_iter().map(RawBook::into_book).collect()
  }

  async fn update_book(&self, book_id: &str, update: BookUpdate) -> Result<Book> {
    update.validate()?;
    let book_id = book_id.to_owned();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(raw) = load_book(&tx, &book_id)? else {
          bail!(campus_core::Error::BookNotFound(book_id));
        };
        let mut book = check!(raw.into_book());
        check!(update.apply(&mut book));
        tx.execute(
          "UPDATE books SET
             title = ?2, author = ?3, price = ?4, total_copies = ?5, available_copies = ?6
           WHERE book_id = ?1",
          rusqlite::params![
            book.book_id,
            book.title,
            book.author,
            encode_decimal(book.price),
            book.total_copies,
            book.available_copies,
          ],
        )?;
        tx.commit()?;
        Ok(Ok(book))
      })
      .await?
  }

  async fn remove_book(&self, book_id: &str) -> Result<Book> {
    let book_id = book_id.to_owned();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(raw) = load_book(&tx, &book_id)? else {
          bail!(campus_core::Error::BookNotFound(book_id));
        };
        let book = check!(raw.into_book());
        let open: i64 = tx.query_row(
          "SELECT COUNT(*) FROM loans WHERE book_id = ?1 AND status IN ('issued', 'lost')",
          rusqlite::params![book_id],
          |row| row.get(0),
        )?;
        if open > 0 {
          bail!(campus_core::Error::BookInCirculation(book_id));
        }
        tx.execute("DELETE FROM books WHERE book_id = ?1", rusqlite::params![book_id])?;
        tx.commit()?;
        Ok(Ok(book))
      })
      .await?
  }

  // ── Circulation ───────────────────────────────────────────────────────────

  async fn issue_book(
    &self,
    book_id: &str,
    student_id: &str,
    issue_date: Option<NaiveDate>,
  ) -> Result<Loan> {
    let student_id = student_id.trim().to_owned();
    if student_id.is_empty() {
      return Err(campus_core::Error::InvalidInput("student id must not be empty".into()).into());
    }
    let book_id = book_id.to_owned();
    let policy = self.policy.clone();
    let issue_date = issue_date.unwrap_or_else(|| Utc::now().date_naive());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(raw) = load_book(&tx, &book_id)? else {
          bail!(campus_core::Error::BookNotFound(book_id));
        };
        let mut book = check!(raw.into_book());
        if book.available_copies == 0 {
          bail!(campus_core::Error::NoCopiesAvailable(book_id));
        }

        let active: u32 = tx.query_row(
          "SELECT COUNT(*) FROM loans WHERE student_id = ?1 AND status = 'issued'",
          rusqlite::params![student_id],
          |row| row.get(0),
        )?;
        if active >= policy.max_active_loans {
          bail!(campus_core::Error::LoanLimitExceeded {
            student_id,
            limit: policy.max_active_loans,
          });
        }

        let loan = Loan::issue(book.book_id.clone(), student_id, issue_date, &policy);
        tx.execute(
          &format!("INSERT INTO loans ({LOAN_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
          rusqlite::params![
            encode_uuid(loan.loan_id),
            loan.book_id,
            loan.student_id,
            encode_date(loan.issue_date),
            encode_date(loan.due_date),
            loan.actual_return_date.map(encode_dt),
            loan.status.as_ref(),
            encode_decimal(loan.fine),
            loan.lost_at.map(encode_dt),
            loan.recovered_at.map(encode_dt),
            loan.reminder_sent_at.map(encode_dt),
          ],
        )?;
        book.available_copies -= 1;
        store_book_counts(&tx, &book)?;
        tx.commit()?;
        Ok(Ok(loan.resolved(Utc::now(), &policy)))
      })
      .await?
  }

  async fn return_book(&self, loan_id: Uuid, at: Option<DateTime<Utc>>) -> Result<Loan> {
    let at = at.unwrap_or_else(Utc::now);
    let policy = self.policy.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let (mut loan, book) = check!(circulating_loan(&tx, loan_id)?);
        if !loan.status.is_active() {
          bail!(campus_core::Error::LoanNotActive(loan_id));
        }

        loan.fine = policy.fine(loan.due_date, at.date_naive());
        loan.actual_return_date = Some(at);
        loan.status = LoanStatus::Returned;
        store_loan(&tx, &loan)?;

        // A title removed from the catalog has no counts left to restore.
        if let Some(mut book) = book {
          book.available_copies = (book.available_copies + 1).min(book.total_copies);
          store_book_counts(&tx, &book)?;
        }
        tx.commit()?;
        Ok(Ok(loan))
      })
      .await?
  }

  async fn mark_lost(&self, loan_id: Uuid, at: Option<DateTime<Utc>>) -> Result<Loan> {
    let at = at.unwrap_or_else(Utc::now);
    let policy = self.policy.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let (mut loan, book) = check!(circulating_loan(&tx, loan_id)?);
        if !loan.status.is_active() {
          bail!(campus_core::Error::LoanNotActive(loan_id));
        }

        let price = book.as_ref().map(|b| b.price).unwrap_or_default();
        loan.fine = policy.lost_fine(loan.due_date, at, price);
        loan.lost_at = Some(at);
        loan.status = LoanStatus::Lost;
        store_loan(&tx, &loan)?;

        // The copy was on loan, so only the total shrinks.
        if let Some(mut book) = book {
          book.total_copies = book.total_copies.saturating_sub(1);
          book.available_copies = book.available_copies.min(book.total_copies);
          store_book_counts(&tx, &book)?;
        }
        tx.commit()?;
        Ok(Ok(loan))
      })
      .await?
  }

  async fn recover_book(&self, loan_id: Uuid, at: Option<DateTime<Utc>>) -> Result<Loan> {
    let at = at.unwrap_or_else(Utc::now);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let (mut loan, book) = check!(circulating_loan(&tx, loan_id)?);
        if loan.status != LoanStatus::Lost {
          bail!(campus_core::Error::LoanNotLost(loan_id));
        }

        loan.recovered_at = Some(at);
        loan.status = LoanStatus::Recovered;
        store_loan(&tx, &loan)?;

        if let Some(mut book) = book {
          book.total_copies += 1;
          book.available_copies += 1;
          store_book_counts(&tx, &book)?;
        }
        tx.commit()?;
        Ok(Ok(loan))
      })
      .await?
  }

  async fn get_loan(&self, loan_id: Uuid, as_of: Option<DateTime<Utc>>) -> Result<Option<Loan>> {
    let now = as_of.unwrap_or_else(Utc::now);
    let id = encode_uuid(loan_id);
    let raw = self.conn.call(move |conn| Ok(load_loan(conn, &id)?)).await?;

    raw
      .map(|raw| raw.into_loan().map(|loan| loan.resolved(now, &self.policy)))
      .transpose()
  }

  async fn list_loans(
    &self,
    query: &LoanQuery,
    as_of: Option<DateTime<Utc>>,
  ) -> Result<Vec<Loan>> {
    let now = as_of.unwrap_or_else(Utc::now);
    let student_id = query.student_id.clone();
    let book_id = query.book_id.clone();

    let raws: Vec<RawLoan> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LOAN_COLUMNS} FROM loans
           WHERE (?1 IS NULL OR student_id = ?1) AND (?2 IS NULL OR book_id = ?2)"
        ))?;
        let loans = stmt
          .query_map(rusqlite::params![student_id, book_id], RawLoan::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(loans)
      })
      .await?;

    let mut loans = raws
      .into_iter()
      .map(|raw| raw.into_loan().map(|loan| loan.resolved(now, &self.policy)))
      .collect::<Result<Vec<_>>>()?;
    loans.retain(|loan| query.matches(loan));
    loans.sort_by(loan::newest_first);
    Ok(loans)
  }

  async fn list_overdue(&self, as_of: Option<DateTime<Utc>>) -> Result<Vec<Loan>> {
    let now = as_of.unwrap_or_else(Utc::now);
    let today = encode_date(now.date_naive());

    let raws: Vec<RawLoan> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LOAN_COLUMNS} FROM loans WHERE status = 'issued' AND due_date < ?1"
        ))?;
        let loans = stmt
          .query_map(rusqlite::params![today], RawLoan::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(loans)
      })
      .await?;

    let mut loans = raws
      .into_iter()
      .map(|raw| raw.into_loan().map(|loan| loan.resolved(now, &self.policy)))
      .collect::<Result<Vec<_>>>()?;
    loan::sort_overdue(&mut loans, now);
    Ok(loans)
  }

  async fn record_reminder(&self, loan_id: Uuid, at: Option<DateTime<Utc>>) -> Result<Loan> {
    let at = at.unwrap_or_else(Utc::now);
    let policy = self.policy.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(raw) = load_loan(&tx, &encode_uuid(loan_id))? else {
          bail!(campus_core::Error::LoanNotFound(loan_id));
        };
        let mut loan = check!(raw.into_loan());
        if !loan.status.is_active() {
          bail!(campus_core::Error::LoanNotActive(loan_id));
        }
        loan.reminder_sent_at = Some(at);
        store_loan(&tx, &loan)?;
        tx.commit()?;
        Ok(Ok(loan.resolved(at, &policy)))
      })
      .await?
  }

  // ── Feedback ──────────────────────────────────────────────────────────────

  async fn submit_feedback(&self, input: NewFeedback) -> Result<Feedback> {
    let fb = input.into_feedback(Utc::now())?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO feedback ({FEEDBACK_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
          ),
          rusqlite::params![
            encode_uuid(fb.feedback_id),
            fb.student_id,
            fb.category.as_ref(),
            fb.rating,
            fb.comment,
            fb.anonymous,
            encode_dt(fb.created_at),
            fb.response,
            fb.priority.as_ref(),
            fb.is_resolved,
            fb.responded_at.map(encode_dt),
            fb.resolved_at.map(encode_dt),
          ],
        )?;
        Ok(fb)
      })
      .await
      .map_err(Error::from)
  }

  async fn get_feedback(&self, feedback_id: Uuid) -> Result<Option<Feedback>> {
    let id = encode_uuid(feedback_id);
    let raw = self.conn.call(move |conn| Ok(load_feedback(conn, &id)?)).await?;
    raw.map(RawFeedback::into_feedback).transpose()
  }

  async fn list_feedback(&self) -> Result<Vec<Feedback>> {
    let raws: Vec<RawFeedback> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FEEDBACK_COLUMNS} FROM feedback ORDER BY created_at DESC, feedback_id"
        ))?;
        let items = stmt
          .query_map([], RawFeedback::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
      })
      .await?;

    raws.into_iter().map(RawFeedback::into_feedback).collect()
  }

  async fn respond(
    &self,
    feedback_id: Uuid,
    input: FeedbackResponse,
    at: Option<DateTime<Utc>>,
  ) -> Result<Feedback> {
    input.validate()?;
    let at = at.unwrap_or_else(Utc::now);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(raw) = load_feedback(&tx, &encode_uuid(feedback_id))? else {
          bail!(campus_core::Error::FeedbackNotFound(feedback_id));
        };
        let mut fb = check!(raw.into_feedback());
        fb.respond(&input, at);
        store_feedback(&tx, &fb)?;
        tx.commit()?;
        Ok(Ok(fb))
      })
      .await?
  }

  async fn toggle_resolved(
    &self,
    feedback_id: Uuid,
    resolved: bool,
    at: Option<DateTime<Utc>>,
  ) -> Result<Feedback> {
    let at = at.unwrap_or_else(Utc::now);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(raw) = load_feedback(&tx, &encode_uuid(feedback_id))? else {
          bail!(campus_core::Error::FeedbackNotFound(feedback_id));
        };
        let mut fb = check!(raw.into_feedback());
        fb.set_resolved(resolved, at);
        store_feedback(&tx, &fb)?;
        tx.commit()?;
        Ok(Ok(fb))
      })
      .await?
  }
}
