//! Handlers for `/books` endpoints: the catalog and circulation transitions.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/books` | Ordered by title |
//! | `POST`   | `/books` | Body: `NewBook` |
//! | `GET`    | `/books/:id` | 404 if not found |
//! | `PUT`    | `/books/:id` | Body: `{"title"?, "author"?, "price"?, "totalCopies"?}` |
//! | `DELETE` | `/books/:id` | 409 while copies are issued or lost |
//! | `POST`   | `/books/:id/issue/:student` | Optional body: `{"issueDate":"2024-01-01"}` |
//! | `PUT`    | `/books/return/:loan` | |
//! | `PUT`    | `/books/mark-lost/:loan` | |
//! | `PUT`    | `/books/recover/:loan` | |
//! | `GET`    | `/books/overdue` | Most days overdue first |

use std::sync::Arc;

use axum::{
  Json,
  body::Bytes,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  access::Operation,
  book::{Book, BookUpdate, NewBook},
  loan::Loan,
  store::CampusStore,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{caller::Caller, envelope::Envelope, error::ApiError};

// ─── Catalog ──────────────────────────────────────────────────────────────────

/// `GET /books`
pub async fn list<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
) -> Result<Envelope<Vec<Book>>, ApiError> {
  caller.require(Operation::ViewBooks)?;
  let books = store.list_books().await.map_err(ApiError::from_store)?;
  Ok(Envelope::data(books))
}

/// `POST /books`
pub async fn create<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<NewBook>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Operation::ManageBooks)?;
  let book = store.add_book(body).await.map_err(ApiError::from_store)?;
  tracing::info!(book_id = %book.book_id, copies = book.total_copies, "book added");
  Ok((StatusCode::CREATED, Envelope::data(book)))
}

/// `GET /books/:id`
pub async fn get_one<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(book_id): Path<String>,
) -> Result<Envelope<Book>, ApiError> {
  caller.require(Operation::ViewBooks)?;
  match store.get_book(&book_id).await.map_err(ApiError::from_store)? {
    Some(book) => Ok(Envelope::data(book)),
    None => Err(campus_core::Error::BookNotFound(book_id).into()),
  }
}

/// `PUT /books/:id`
pub async fn update<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(book_id): Path<String>,
  Json(body): Json<BookUpdate>,
) -> Result<Envelope<Book>, ApiError> {
  caller.require(Operation::ManageBooks)?;
  let book = store
    .update_book(&book_id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Envelope::data(book))
}

/// `DELETE /books/:id`
pub async fn remove<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(book_id): Path<String>,
) -> Result<Envelope<()>, ApiError> {
  caller.require(Operation::ManageBooks)?;
  store.remove_book(&book_id).await.map_err(ApiError::from_store)?;
  tracing::info!(%book_id, "book removed");
  Ok(Envelope::message(format!("book {book_id} removed")))
}

// ─── Circulation ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueBody {
  pub issue_date: Option<NaiveDate>,
}

/// `POST /books/:id/issue/:student` — the body is optional.
pub async fn issue<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path((book_id, student_id)): Path<(String, String)>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Operation::Circulate)?;
  let body: IssueBody = if body.iter().all(u8::is_ascii_whitespace) {
    IssueBody::default()
  } else {
    serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
  };

  let loan = store
    .issue_book(&book_id, &student_id, body.issue_date)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(
    loan_id = %loan.loan_id,
    %book_id,
    %student_id,
    due = %loan.due_date,
    "book issued"
  );
  Ok((StatusCode::CREATED, Envelope::data(loan)))
}

/// `PUT /books/return/:loan`
pub async fn return_one<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(loan_id): Path<Uuid>,
) -> Result<Envelope<Loan>, ApiError> {
  caller.require(Operation::Circulate)?;
  let loan = store
    .return_book(loan_id, None)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(%loan_id, fine = %loan.fine, "book returned");
  Ok(Envelope::data(loan))
}

/// `PUT /books/mark-lost/:loan`
pub async fn mark_lost<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(loan_id): Path<Uuid>,
) -> Result<Envelope<Loan>, ApiError> {
  caller.require(Operation::Circulate)?;
  let loan = store.mark_lost(loan_id, None).await.map_err(ApiError::from_store)?;
  tracing::info!(%loan_id, fine = %loan.fine, "copy marked lost");
  Ok(Envelope::data(loan))
}

/// `PUT /books/recover/:loan`
pub async fn recover<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(loan_id): Path<Uuid>,
) -> Result<Envelope<Loan>, ApiError> {
  caller.require(Operation::Circulate)?;
  let loan = store
    .recover_book(loan_id, None)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(%loan_id, "lost copy recovered");
  Ok(Envelope::data(loan))
}

/// `GET /books/overdue`
pub async fn overdue<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
) -> Result<Envelope<Vec<Loan>>, ApiError> {
  caller.require(Operation::ViewAllLoans)?;
  let loans = store.list_overdue(None).await.map_err(ApiError::from_store)?;
  Ok(Envelope::data(loans))
}
