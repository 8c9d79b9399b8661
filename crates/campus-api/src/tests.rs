//! Router-level tests: requests go through the full axum stack against an
//! in-memory SQLite store.

use std::sync::{Arc, Mutex};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use campus_core::{
  notify::{Notifier, Reminder},
  store::CampusStore,
};
use campus_store_sqlite::SqliteStore;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{api_router, remind::sweep_overdue};

// ─── Notifiers ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingNotifier {
  sent: Mutex<Vec<Reminder>>,
}

impl RecordingNotifier {
  fn count(&self) -> usize { self.sent.lock().unwrap().len() }
}

impl Notifier for RecordingNotifier {
  type Error = std::convert::Infallible;

  async fn send_reminder(&self, reminder: &Reminder) -> Result<(), Self::Error> {
    self.sent.lock().unwrap().push(reminder.clone());
    Ok(())
  }
}

struct FailingNotifier;

impl Notifier for FailingNotifier {
  type Error = std::io::Error;

  async fn send_reminder(&self, _reminder: &Reminder) -> Result<(), Self::Error> {
    Err(std::io::Error::other("gateway down"))
  }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

struct Harness<N> {
  store:    Arc<SqliteStore>,
  notifier: Arc<N>,
}

impl<N: Notifier + 'static> Harness<N> {
  async fn new(notifier: N) -> Self {
    let store = SqliteStore::open_in_memory().await.unwrap();
    Self { store: Arc::new(store), notifier: Arc::new(notifier) }
  }

  fn router(&self) -> Router { api_router(self.store.clone(), self.notifier.clone()) }

  async fn call(
    &self,
    method: &str,
    uri: &str,
    role: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(role) = role {
      builder = builder.header("x-campus-role", role);
    }
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    let resp = self.router().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  async fn seed_book(&self, id: &str, copies: u32) {
    let (status, _) = self
      .call(
        "POST",
        "/books",
        None,
        Some(json!({
          "bookId": id,
          "title": format!("Title {id}"),
          "author": "Author",
          "price": 250.0,
          "totalCopies": copies,
        })),
      )
      .await;
    assert_eq!(status, StatusCode::CREATED);
  }

  async fn issue(&self, book: &str, student: &str, on: &str) -> Uuid {
    let (status, body) = self
      .call(
        "POST",
        &format!("/books/{book}/issue/{student}"),
        None,
        Some(json!({ "issueDate": on })),
      )
      .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["loanId"].as_str().unwrap().parse().unwrap()
  }
}

// ─── Rooms ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn room_lifecycle_over_http() {
  let h = Harness::new(RecordingNotifier::default()).await;

  let (status, body) = h
    .call("POST", "/rooms", None, Some(json!({ "number": 101, "capacity": 1 })))
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["success"], true);
  assert_eq!(body["data"]["purpose"], "regular");
  assert_eq!(body["data"]["isSpecial"], false);

  let (status, body) = h.call("POST", "/rooms/number/101/assign/S1", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["occupantIds"], json!(["S1"]));

  let (status, body) = h.call("POST", "/rooms/number/101/assign/S2", None, None).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["success"], false);
  assert!(body["message"].as_str().unwrap().contains("full"));

  let (status, body) = h.call("GET", "/rooms/student/S1", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["number"], 101);

  let (status, _) = h.call("DELETE", "/rooms/number/101", None, None).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, body) = h.call("DELETE", "/rooms/number/101/remove/S1", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["message"].is_string());

  let (status, _) = h.call("DELETE", "/rooms/number/101", None, None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, body) = h.call("GET", "/rooms/number/101", None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["success"], false);
}

#[tokio::test]
async fn next_number_skips_taken_rooms() {
  let h = Harness::new(RecordingNotifier::default()).await;
  for n in [1, 3] {
    h.call("POST", "/rooms", None, Some(json!({ "number": n, "capacity": 2 }))).await;
  }
  let (_, body) = h.call("GET", "/rooms/next-number", None, None).await;
  assert_eq!(body["data"]["number"], 2);
}

#[tokio::test]
async fn roles_gate_operations() {
  let h = Harness::new(RecordingNotifier::default()).await;
  let room = json!({ "number": 5, "capacity": 2 });

  let (status, _) = h.call("POST", "/rooms", Some("student"), Some(room.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = h.call("POST", "/rooms", Some("janitor"), Some(room.clone())).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (status, _) = h.call("POST", "/rooms", Some("Admin"), Some(room)).await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, _) = h.call("POST", "/rooms/number/5/assign/S1", Some("warden"), None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = h.call("GET", "/rooms", Some("student"), None).await;
  assert_eq!(status, StatusCode::OK);
}

// ─── Circulation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn issue_and_return_over_http() {
  let h = Harness::new(RecordingNotifier::default()).await;
  h.seed_book("B1", 1).await;

  let (status, body) = h
    .call("POST", "/books/B1/issue/X", None, Some(json!({ "issueDate": "2024-01-01" })))
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["dueDate"], "2024-01-16");
  assert_eq!(body["data"]["status"], "overdue");
  let loan_id = body["data"]["loanId"].as_str().unwrap().to_owned();

  let (status, _) = h.call("POST", "/books/B1/issue/Y", None, None).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, body) = h.call("GET", "/books/overdue", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"][0]["status"], "overdue");

  let (status, body) = h.call("PUT", &format!("/books/return/{loan_id}"), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["status"], "returned");

  let (status, _) = h.call("PUT", &format!("/books/return/{loan_id}"), None, None).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (_, body) = h.call("GET", "/books/B1", None, None).await;
  assert_eq!(body["data"]["availableCopies"], 1);
}

#[tokio::test]
async fn issue_without_body_uses_today() {
  let h = Harness::new(RecordingNotifier::default()).await;
  h.seed_book("B1", 2).await;

  let (status, body) = h.call("POST", "/books/B1/issue/X", None, None).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["issueDate"], Utc::now().date_naive().to_string());

  let (status, _) = h.call("POST", "/books/missing/issue/X", None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lost_and_recovered_over_http() {
  let h = Harness::new(RecordingNotifier::default()).await;
  h.seed_book("B1", 1).await;
  let loan_id = h.issue("B1", "X", "2024-01-01").await;

  let (status, _) = h.call("PUT", &format!("/books/recover/{loan_id}"), None, None).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, body) = h.call("PUT", &format!("/books/mark-lost/{loan_id}"), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["status"], "lost");
  let (_, book) = h.call("GET", "/books/B1", None, None).await;
  assert_eq!(book["data"]["totalCopies"], 0);

  let (status, body) = h.call("PUT", &format!("/books/recover/{loan_id}"), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["status"], "recovered");
  let (_, book) = h.call("GET", "/books/B1", None, None).await;
  assert_eq!(book["data"]["totalCopies"], 1);
  assert_eq!(book["data"]["availableCopies"], 1);
}

#[tokio::test]
async fn students_list_only_their_own_loans() {
  let h = Harness::new(RecordingNotifier::default()).await;
  h.seed_book("B1", 2).await;
  h.issue("B1", "X", "2024-01-01").await;
  h.issue("B1", "Y", "2024-01-02").await;

  let (status, _) = h.call("GET", "/loans", Some("student"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = h.call("GET", "/loans?student_id=X", Some("student"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"].as_array().unwrap().len(), 1);

  let (_, body) = h.call("GET", "/loans?status=overdue", None, None).await;
  assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

// ─── Reminders ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_delivery_still_records_reminder() {
  let h = Harness::new(FailingNotifier).await;
  h.seed_book("B1", 1).await;
  let loan_id = h.issue("B1", "X", "2024-01-01").await;

  let (status, body) = h.call("POST", &format!("/books/remind/{loan_id}"), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);

  let loan = h.store.get_loan(loan_id, None).await.unwrap().unwrap();
  assert!(loan.reminder_sent_at.is_some());
}

#[tokio::test]
async fn reminder_for_closed_loan_is_rejected() {
  let h = Harness::new(RecordingNotifier::default()).await;
  h.seed_book("B1", 1).await;
  let loan_id = h.issue("B1", "X", "2024-01-01").await;
  h.call("PUT", &format!("/books/return/{loan_id}"), None, None).await;

  let (status, _) = h.call("POST", &format!("/books/remind/{loan_id}"), None, None).await;
  assert_eq!(status, StatusCode::CONFLICT);
  let (status, _) = h.call("POST", &format!("/books/remind/{}", Uuid::new_v4()), None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(h.notifier.count(), 0);
}

#[tokio::test]
async fn sweep_reminds_each_overdue_loan_once() {
  let h = Harness::new(RecordingNotifier::default()).await;
  h.seed_book("B1", 3).await;
  h.issue("B1", "X", "2024-01-01").await;
  h.issue("B1", "Y", "2024-02-01").await;
  h.issue("B1", "Z", &Utc::now().date_naive().to_string()).await;

  let now = Utc::now();
  let sent = sweep_overdue(&*h.store, &*h.notifier, now, None).await.unwrap();
  assert_eq!(sent, 2);
  assert_eq!(h.notifier.count(), 2);

  let sent = sweep_overdue(&*h.store, &*h.notifier, now, None).await.unwrap();
  assert_eq!(sent, 0);

  let later = now + Duration::hours(25);
  let sent = sweep_overdue(&*h.store, &*h.notifier, later, Some(Duration::hours(24)))
    .await
    .unwrap();
  assert_eq!(sent, 2);
}

// ─── Feedback ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feedback_triage_over_http() {
  let h = Harness::new(RecordingNotifier::default()).await;

  let (status, body) = h
    .call(
      "POST",
      "/feedback",
      Some("student"),
      Some(json!({
        "studentId": "S1",
        "category": "mess",
        "rating": 2,
        "comment": "Dinner is always cold",
      })),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["status"], "pending");
  let id = body["data"]["feedbackId"].as_str().unwrap().to_owned();

  h.call(
    "POST",
    "/feedback",
    None,
    Some(json!({ "category": "library", "rating": 5, "comment": "Great", "anonymous": true })),
  )
  .await;

  let (status, _) = h
    .call("POST", "/feedback", None, Some(json!({ "category": "mess", "rating": 7, "comment": "x" })))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, body) = h.call("GET", "/feedback?category=mess&search=COLD", None, None).await;
  assert_eq!(body["data"].as_array().unwrap().len(), 1);

  let (_, body) = h.call("GET", "/feedback?min_rating=3", None, None).await;
  let hits = body["data"].as_array().unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0]["category"], "library");

  let (_, body) = h.call("GET", "/feedback?status=resolved", None, None).await;
  assert!(body["data"].as_array().unwrap().is_empty());

  let (status, _) = h
    .call(
      "POST",
      &format!("/feedback/{id}/respond"),
      Some("student"),
      Some(json!({ "response": "Looking into it" })),
    )
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = h
    .call(
      "POST",
      &format!("/feedback/{id}/respond"),
      Some("warden"),
      Some(json!({ "response": "Looking into it", "priority": "high" })),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["status"], "responded");
  assert_eq!(body["data"]["priority"], "high");

  let (status, body) = h
    .call(
      "PATCH",
      &format!("/feedback/{id}/resolve"),
      Some("warden"),
      Some(json!({ "isResolved": true })),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["status"], "resolved");
  assert!(body["data"]["resolvedAt"].is_string());

  let (_, body) = h.call("GET", "/feedback/stats", None, None).await;
  assert_eq!(body["data"]["total"], 2);
  assert_eq!(body["data"]["resolved"], 1);
  assert_eq!(body["data"]["pending"], 1);
  assert_eq!(body["data"]["averageRating"], 3.5);
}

// ─── Dashboards ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn dashboards_follow_the_role() {
  let h = Harness::new(RecordingNotifier::default()).await;
  h.call("POST", "/rooms", None, Some(json!({ "number": 1, "capacity": 2 }))).await;
  h.call("POST", "/rooms/number/1/assign/X", None, None).await;
  h.seed_book("B1", 1).await;
  h.issue("B1", "X", "2024-01-01").await;

  let (_, body) = h.call("GET", "/dashboard", None, None).await;
  assert_eq!(body["data"]["role"], "admin");
  assert_eq!(body["data"]["rooms"]["occupied"], 1);
  assert_eq!(body["data"]["circulation"]["overdueLoans"], 1);

  let (_, body) = h.call("GET", "/dashboard", Some("warden"), None).await;
  assert_eq!(body["data"]["role"], "warden");
  assert!(body["data"].get("circulation").is_none());

  let (status, _) = h.call("GET", "/dashboard", Some("student"), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = h.call("GET", "/dashboard?student_id=X", Some("student"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["role"], "student");
  assert_eq!(body["data"]["room"]["number"], 1);
  assert_eq!(body["data"]["activeLoans"], 1);
}
