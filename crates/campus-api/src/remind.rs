//! Overdue reminders: the `POST /books/remind/:loan` handler and the sweep
//! the server runs on a timer.
//!
//! The reminder is recorded on the loan first and only then handed to the
//! [`Notifier`]. A delivery failure is logged and never undoes the record.

use axum::extract::{Path, State};
use campus_core::{
  Classify, ErrorKind,
  access::Operation,
  notify::{Notifier, Reminder, reminder_due},
  store::CampusStore,
};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{ApiState, caller::Caller, envelope::Envelope, error::ApiError};

/// Record and dispatch one reminder for an active loan.
pub async fn send_reminder<S, N>(
  store: &S,
  notifier: &N,
  loan_id: Uuid,
  at: DateTime<Utc>,
) -> Result<Reminder, S::Error>
where
  S: CampusStore,
  N: Notifier,
{
  let loan = store.record_reminder(loan_id, Some(at)).await?;
  let title = store.get_book(&loan.book_id).await?.map(|b| b.title);
  let reminder = Reminder::for_loan(&loan, title, at);

  match notifier.send_reminder(&reminder).await {
    Ok(()) => tracing::info!(
      %loan_id,
      student_id = %reminder.student_id,
      days_overdue = reminder.days_overdue,
      "reminder sent"
    ),
    Err(e) => tracing::warn!(%loan_id, error = %e, "reminder delivery failed"),
  }
  Ok(reminder)
}

/// Remind every overdue borrower who is due a reminder at `at`. Returns the
/// number of reminders recorded.
///
/// Loans closed between listing and recording are skipped; only internal
/// store failures abort the sweep.
pub async fn sweep_overdue<S, N>(
  store: &S,
  notifier: &N,
  at: DateTime<Utc>,
  resend_after: Option<Duration>,
) -> Result<usize, S::Error>
where
  S: CampusStore,
  N: Notifier,
{
  let overdue = store.list_overdue(Some(at)).await?;
  let mut sent = 0;
  for loan in overdue.iter().filter(|l| reminder_due(l, at, resend_after)) {
    match send_reminder(store, notifier, loan.loan_id, at).await {
      Ok(_) => sent += 1,
      Err(e) if e.kind() == ErrorKind::Internal => return Err(e),
      Err(e) => tracing::debug!(loan_id = %loan.loan_id, error = %e, "skipped reminder"),
    }
  }
  tracing::info!(overdue = overdue.len(), sent, "overdue sweep finished");
  Ok(sent)
}

/// `POST /books/remind/:loan`
pub async fn send<S, N>(
  State(state): State<ApiState<S, N>>,
  caller: Caller,
  Path(loan_id): Path<Uuid>,
) -> Result<Envelope<()>, ApiError>
where
  S: CampusStore,
  N: Notifier,
{
  caller.require(Operation::SendReminders)?;
  let reminder = send_reminder(&*state.store, &*state.notifier, loan_id, Utc::now())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Envelope::message(format!(
    "reminder recorded for student {}",
    reminder.student_id
  )))
}
