//! The outbound notification hook used for overdue reminders.
//!
//! Delivery is best-effort. Callers record the reminder before handing it to
//! a [`Notifier`] and only log a delivery failure.

use std::future::Future;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::loan::Loan;

/// The payload handed to the email/SMS gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
  pub loan_id:      Uuid,
  pub student_id:   String,
  pub book_id:      String,
  pub title:        Option<String>,
  pub due_date:     NaiveDate,
  pub days_overdue: u32,
  pub fine:         Decimal,
  pub sent_at:      DateTime<Utc>,
}

impl Reminder {
  /// Build from a loan that has been resolved against `sent_at`.
  pub fn for_loan(loan: &Loan, title: Option<String>, sent_at: DateTime<Utc>) -> Self {
    Self {
      loan_id: loan.loan_id,
      student_id: loan.student_id.clone(),
      book_id: loan.book_id.clone(),
      title,
      due_date: loan.due_date,
      days_overdue: loan.days_overdue(sent_at),
      fine: loan.fine,
      sent_at,
    }
  }
}

/// Whether a sweep at `now` should remind the borrower of `loan`: never
/// reminded before, or last reminded at least `resend_after` ago. Without
/// `resend_after` a loan is reminded once.
pub fn reminder_due(loan: &Loan, now: DateTime<Utc>, resend_after: Option<Duration>) -> bool {
  match loan.reminder_sent_at {
    None => true,
    Some(last) => resend_after.is_some_and(|every| last + every <= now),
  }
}

/// An external reminder gateway.
pub trait Notifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send_reminder<'a>(
    &'a self,
    reminder: &'a Reminder,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
