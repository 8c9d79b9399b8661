//! Handlers for `/loans` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/loans` | Optional `?student_id=&book_id=&status=`; `status` is the derived one |
//! | `GET`  | `/loans/:id` | 404 if not found |
//!
//! Students may only list loans with a `student_id` filter.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use campus_core::{
  access::{Operation, Role},
  loan::{Loan, LoanQuery},
  store::CampusStore,
};
use uuid::Uuid;

use crate::{caller::Caller, envelope::Envelope, error::ApiError};

/// `GET /loans[?student_id=&book_id=&status=]`
pub async fn list<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Query(query): Query<LoanQuery>,
) -> Result<Envelope<Vec<Loan>>, ApiError> {
  let own_loans = caller.role == Some(Role::Student) && query.student_id.is_some();
  if !own_loans {
    caller.require(Operation::ViewAllLoans)?;
  }
  let loans = store
    .list_loans(&query, None)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Envelope::data(loans))
}

/// `GET /loans/:id`
pub async fn get_one<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(loan_id): Path<Uuid>,
) -> Result<Envelope<Loan>, ApiError> {
  caller.require(Operation::ViewAllLoans)?;
  match store.get_loan(loan_id, None).await.map_err(ApiError::from_store)? {
    Some(loan) => Ok(Envelope::data(loan)),
    None => Err(campus_core::Error::LoanNotFound(loan_id).into()),
  }
}
