//! Loans — one issuance of a book to a student — and the circulation rules.
//!
//! Only four statuses are ever persisted: `issued`, `returned`, `lost`, and
//! `recovered`. `overdue` is derived from `issued` and the caller's clock by
//! [`derive_status`], the single place that decision is made. Fines for
//! unresolved loans are likewise computed on read; they are persisted only
//! when a loan is returned or marked lost.

use std::cmp::Ordering;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LoanStatus {
  Issued,
  Overdue,
  Returned,
  Lost,
  Recovered,
}

impl LoanStatus {
  /// The copy is out with the student and counts against their loan limit.
  pub fn is_active(self) -> bool { matches!(self, Self::Issued | Self::Overdue) }

  /// No further transition is possible.
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Returned | Self::Recovered)
  }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Library circulation rules. The defaults are the library guideline: 15-day
/// loans, ₹5 per day overdue, at most 3 active loans per student, and the
/// book's price charged when a copy is lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CirculationPolicy {
  pub loan_period_days:     u32,
  pub fine_per_day:         Decimal,
  pub max_active_loans:     u32,
  pub charge_price_on_loss: bool,
}

impl Default for CirculationPolicy {
  fn default() -> Self {
    Self {
      loan_period_days:     15,
      fine_per_day:         Decimal::from(5),
      max_active_loans:     3,
      charge_price_on_loss: true,
    }
  }
}

impl CirculationPolicy {
  pub fn due_date(&self, issue_date: NaiveDate) -> NaiveDate {
    issue_date
      .checked_add_days(Days::new(u64::from(self.loan_period_days)))
      .unwrap_or(NaiveDate::MAX)
  }

  /// Fine owed for a loan due on `due_date` and closed (or viewed) on `end`.
  pub fn fine(&self, due_date: NaiveDate, end: NaiveDate) -> Decimal {
    compute_fine(due_date, end, self.fine_per_day)
  }

  /// Frozen fine for a copy reported lost at `at`: the overdue fine accrued
  /// up to that moment plus, if configured, the book's price.
  pub fn lost_fine(
    &self,
    due_date: NaiveDate,
    at: DateTime<Utc>,
    price: Decimal,
  ) -> Decimal {
    let overdue = self.fine(due_date, at.date_naive());
    if self.charge_price_on_loss {
      (overdue + price).round_dp(2)
    } else {
      overdue
    }
  }
}

// ─── Pure rules ──────────────────────────────────────────────────────────────

/// Whole days strictly after `due_date` up to and including `end`; zero when
/// `end` is on or before the due date.
pub fn days_overdue(due_date: NaiveDate, end: NaiveDate) -> u32 {
  let days = end.signed_duration_since(due_date).num_days();
  u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

/// `max(0, days(due → end)) × per_day`, rounded to 2 decimals.
pub fn compute_fine(due_date: NaiveDate, end: NaiveDate, per_day: Decimal) -> Decimal {
  (per_day * Decimal::from(days_overdue(due_date, end))).round_dp(2)
}

/// The status of `loan` as seen at `now`.
pub fn derive_status(loan: &Loan, now: DateTime<Utc>) -> LoanStatus {
  match loan.status {
    LoanStatus::Issued | LoanStatus::Overdue => {
      if now.date_naive() > loan.due_date {
        LoanStatus::Overdue
      } else {
        LoanStatus::Issued
      }
    }
    other => other,
  }
}

// ─── Loan ────────────────────────────────────────────────────────────────────

/// One issuance event of a book to a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
  pub loan_id:            Uuid,
  pub book_id:            String,
  pub student_id:         String,
  pub issue_date:         NaiveDate,
  pub due_date:           NaiveDate,
  pub actual_return_date: Option<DateTime<Utc>>,
  pub status:             LoanStatus,
  /// Frozen once the loan leaves the active states; otherwise the amount
  /// accrued as of the moment the loan was read.
  pub fine:               Decimal,
  pub lost_at:            Option<DateTime<Utc>>,
  pub recovered_at:       Option<DateTime<Utc>>,
  pub reminder_sent_at:   Option<DateTime<Utc>>,
}

impl Loan {
  /// A freshly issued loan.
  pub fn issue(
    book_id: impl Into<String>,
    student_id: impl Into<String>,
    issue_date: NaiveDate,
    policy: &CirculationPolicy,
  ) -> Self {
    Self {
      loan_id:            Uuid::new_v4(),
      book_id:            book_id.into(),
      student_id:         student_id.into(),
      issue_date,
      due_date:           policy.due_date(issue_date),
      actual_return_date: None,
      status:             LoanStatus::Issued,
      fine:               Decimal::ZERO,
      lost_at:            None,
      recovered_at:       None,
      reminder_sent_at:   None,
    }
  }

  /// Days past due as of `now`; zero for loans that are no longer out.
  pub fn days_overdue(&self, now: DateTime<Utc>) -> u32 {
    if self.status.is_active() {
      days_overdue(self.due_date, now.date_naive())
    } else {
      0
    }
  }

  /// The fine as of `now`: accrued for active loans, stored otherwise.
  pub fn fine_at(&self, now: DateTime<Utc>, policy: &CirculationPolicy) -> Decimal {
    if self.status.is_active() {
      policy.fine(self.due_date, now.date_naive())
    } else {
      self.fine
    }
  }

  /// Resolve derived fields (status and display fine) against `now`.
  pub fn resolved(mut self, now: DateTime<Utc>, policy: &CirculationPolicy) -> Self {
    self.fine = self.fine_at(now, policy);
    self.status = derive_status(&self, now);
    self
  }
}

/// Order overdue loans by days overdue descending, then issue date, then id.
pub fn sort_overdue(loans: &mut [Loan], now: DateTime<Utc>) {
  loans.sort_by(|a, b| {
    b.days_overdue(now)
      .cmp(&a.days_overdue(now))
      .then_with(|| a.issue_date.cmp(&b.issue_date))
      .then_with(|| a.loan_id.cmp(&b.loan_id))
  });
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Filter for [`crate::store::CampusStore::list_loans`]. `status` matches the
/// derived status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoanQuery {
  pub student_id: Option<String>,
  pub book_id:    Option<String>,
  pub status:     Option<LoanStatus>,
}

impl LoanQuery {
  pub fn for_student(student_id: impl Into<String>) -> Self {
    Self { student_id: Some(student_id.into()), ..Default::default() }
  }

  /// Apply to an already-resolved loan.
  pub fn matches(&self, loan: &Loan) -> bool {
    self.student_id.as_deref().is_none_or(|s| s == loan.student_id)
      && self.book_id.as_deref().is_none_or(|b| b == loan.book_id)
      && self.status.is_none_or(|s| s == loan.status)
  }
}

/// Compare loans for stable listing: newest issue first.
pub fn newest_first(a: &Loan, b: &Loan) -> Ordering {
  b.issue_date
    .cmp(&a.issue_date)
    .then_with(|| a.loan_id.cmp(&b.loan_id))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
  }

  fn loan_issued(on: NaiveDate) -> Loan {
    Loan::issue("B1", "X", on, &CirculationPolicy::default())
  }

  #[test]
  fn due_date_is_fifteen_days_after_issue() {
    let loan = loan_issued(date(2024, 1, 1));
    assert_eq!(loan.due_date, date(2024, 1, 16));
    assert_eq!(loan.status, LoanStatus::Issued);
  }

  #[test]
  fn four_days_late_costs_twenty() {
    let fine = compute_fine(date(2024, 1, 16), date(2024, 1, 20), Decimal::from(5));
    assert_eq!(fine, Decimal::from(20));
  }

  #[test]
  fn returning_on_or_before_due_date_is_free() {
    let per_day = Decimal::from(5);
    assert_eq!(compute_fine(date(2024, 1, 16), date(2024, 1, 16), per_day), Decimal::ZERO);
    assert_eq!(compute_fine(date(2024, 1, 16), date(2024, 1, 3), per_day), Decimal::ZERO);
  }

  #[test]
  fn overdue_is_derived_strictly_after_due_date() {
    let loan = loan_issued(date(2024, 1, 1));
    assert_eq!(derive_status(&loan, at(2024, 1, 16)), LoanStatus::Issued);
    assert_eq!(derive_status(&loan, at(2024, 1, 17)), LoanStatus::Overdue);
  }

  #[test]
  fn terminal_statuses_are_never_overdue() {
    let mut loan = loan_issued(date(2024, 1, 1));
    loan.status = LoanStatus::Returned;
    assert_eq!(derive_status(&loan, at(2024, 3, 1)), LoanStatus::Returned);
    loan.status = LoanStatus::Lost;
    assert_eq!(derive_status(&loan, at(2024, 3, 1)), LoanStatus::Lost);
  }

  #[test]
  fn fine_is_monotonic_while_unreturned() {
    let policy = CirculationPolicy::default();
    let loan = loan_issued(date(2024, 1, 1));
    let mut previous = Decimal::ZERO;
    for day in 1..=60 {
      let now = at(2024, 1, 1) + chrono::Duration::days(day);
      let fine = loan.fine_at(now, &policy);
      assert!(fine >= previous, "fine dropped on day {day}");
      previous = fine;
    }
    assert!(previous > Decimal::ZERO);
  }

  #[test]
  fn active_fine_accrues_up_to_now() {
    let policy = CirculationPolicy::default();
    let loan = loan_issued(date(2024, 1, 1));
    assert_eq!(loan.fine_at(at(2024, 1, 20), &policy), Decimal::from(20));
    let view = loan.resolved(at(2024, 1, 26), &policy);
    assert_eq!(view.status, LoanStatus::Overdue);
    assert_eq!(view.fine, Decimal::from(50));
  }

  #[test]
  fn resolved_keeps_frozen_fine_for_closed_loans() {
    let policy = CirculationPolicy::default();
    let mut loan = loan_issued(date(2024, 1, 1));
    loan.status = LoanStatus::Returned;
    loan.fine = Decimal::from(20);
    let view = loan.resolved(at(2024, 6, 1), &policy);
    assert_eq!(view.fine, Decimal::from(20));
    assert_eq!(view.status, LoanStatus::Returned);
  }

  #[test]
  fn lost_fine_adds_price_when_configured() {
    let mut policy = CirculationPolicy::default();
    let due = date(2024, 1, 16);
    let price = Decimal::new(29950, 2);
    assert_eq!(policy.lost_fine(due, at(2024, 1, 18), price), Decimal::new(30950, 2));

    policy.charge_price_on_loss = false;
    assert_eq!(policy.lost_fine(due, at(2024, 1, 18), price), Decimal::from(10));
  }

  #[test]
  fn overdue_sort_puts_most_late_first() {
    let now = at(2024, 3, 1);
    let mut loans = vec![
      loan_issued(date(2024, 2, 1)),
      loan_issued(date(2024, 1, 1)),
      loan_issued(date(2024, 1, 20)),
    ];
    sort_overdue(&mut loans, now);
    let issued: Vec<_> = loans.iter().map(|l| l.issue_date).collect();
    assert_eq!(issued, vec![date(2024, 1, 1), date(2024, 1, 20), date(2024, 2, 1)]);
  }

  #[test]
  fn query_matches_on_derived_status() {
    let now = at(2024, 3, 1);
    let loan = loan_issued(date(2024, 1, 1)).resolved(now, &CirculationPolicy::default());
    let overdue = LoanQuery { status: Some(LoanStatus::Overdue), ..Default::default() };
    let issued = LoanQuery { status: Some(LoanStatus::Issued), ..Default::default() };
    assert!(overdue.matches(&loan));
    assert!(!issued.matches(&loan));
    assert!(LoanQuery::for_student("X").matches(&loan));
    assert!(!LoanQuery::for_student("Y").matches(&loan));
  }
}
