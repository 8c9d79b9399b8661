//! JSON REST API for the campus resource engine.
//!
//! Exposes an axum [`Router`] backed by any [`CampusStore`] and any reminder
//! [`Notifier`]. Authentication, TLS and transport concerns are the caller's
//! responsibility; the caller only declares a role (see [`caller`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", campus_api::api_router(store.clone(), notifier.clone()))
//! ```

pub mod books;
pub mod caller;
pub mod dashboard;
pub mod envelope;
pub mod error;
pub mod feedback;
pub mod loans;
pub mod remind;
pub mod rooms;

use std::sync::Arc;

use axum::{
  Router,
  extract::FromRef,
  routing::{get, patch, post, put},
};
use campus_core::{notify::Notifier, store::CampusStore};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers. Most handlers only need the
/// store and extract `State<Arc<S>>` directly.
pub struct ApiState<S, N> {
  pub store:    Arc<S>,
  pub notifier: Arc<N>,
}

impl<S, N> Clone for ApiState<S, N> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), notifier: self.notifier.clone() }
  }
}

impl<S, N> FromRef<ApiState<S, N>> for Arc<S> {
  fn from_ref(state: &ApiState<S, N>) -> Self { state.store.clone() }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`, sending reminders
/// through `notifier`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(store: Arc<S>, notifier: Arc<N>) -> Router<()>
where
  S: CampusStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    // Rooms
    .route("/rooms", get(rooms::list::<S>).post(rooms::create::<S>))
    .route("/rooms/next-number", get(rooms::next_number::<S>))
    .route(
      "/rooms/number/{number}",
      get(rooms::get_one::<S>)
        .put(rooms::update::<S>)
        .delete(rooms::delete::<S>),
    )
    .route("/rooms/number/{number}/assign/{student_id}", post(rooms::assign::<S>))
    .route(
      "/rooms/number/{number}/remove/{student_id}",
      axum::routing::delete(rooms::remove::<S>),
    )
    .route("/rooms/student/{student_id}", get(rooms::of_student::<S>))
    // Books and circulation
    .route("/books", get(books::list::<S>).post(books::create::<S>))
    .route("/books/overdue", get(books::overdue::<S>))
    .route(
      "/books/{book_id}",
      get(books::get_one::<S>)
        .put(books::update::<S>)
        .delete(books::remove::<S>),
    )
    .route("/books/{book_id}/issue/{student_id}", post(books::issue::<S>))
    .route("/books/return/{loan_id}", put(books::return_one::<S>))
    .route("/books/mark-lost/{loan_id}", put(books::mark_lost::<S>))
    .route("/books/recover/{loan_id}", put(books::recover::<S>))
    .route("/books/remind/{loan_id}", post(remind::send::<S, N>))
    // Loans
    .route("/loans", get(loans::list::<S>))
    .route("/loans/{loan_id}", get(loans::get_one::<S>))
    // Feedback
    .route("/feedback", get(feedback::list::<S>).post(feedback::submit::<S>))
    .route("/feedback/stats", get(feedback::stats::<S>))
    .route("/feedback/{id}", get(feedback::get_one::<S>))
    .route("/feedback/{id}/respond", post(feedback::respond::<S>))
    .route("/feedback/{id}/resolve", patch(feedback::resolve::<S>))
    // Dashboards
    .route("/dashboard", get(dashboard::handler::<S>))
    .with_state(ApiState { store, notifier })
}

#[cfg(test)]
mod tests;
