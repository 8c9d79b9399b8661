//! Handlers for `/feedback` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/feedback` | Body: `NewFeedback` |
//! | `GET`   | `/feedback` | `?category=&status=&rating=&min_rating=&priority=&search=` |
//! | `GET`   | `/feedback/stats` | Aggregate counters |
//! | `GET`   | `/feedback/:id` | 404 if not found |
//! | `POST`  | `/feedback/:id/respond` | Body: `{"response", "priority"?, "isResolved"?}` |
//! | `PATCH` | `/feedback/:id/resolve` | Body: `{"isResolved": bool}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  access::Operation,
  feedback::{Feedback, FeedbackResponse, NewFeedback},
  store::CampusStore,
  triage::{self, FeedbackFilter, FeedbackStats},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{caller::Caller, envelope::Envelope, error::ApiError};

/// `POST /feedback`
pub async fn submit<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<NewFeedback>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Operation::SubmitFeedback)?;
  let fb = store.submit_feedback(body).await.map_err(ApiError::from_store)?;
  tracing::info!(
    feedback_id = %fb.feedback_id,
    category = %fb.category,
    rating = fb.rating,
    "feedback submitted"
  );
  Ok((StatusCode::CREATED, Envelope::data(fb)))
}

/// `GET /feedback[?filters]`
pub async fn list<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Query(filter): Query<FeedbackFilter>,
) -> Result<Envelope<Vec<Feedback>>, ApiError> {
  caller.require(Operation::ViewFeedback)?;
  let items = store.list_feedback().await.map_err(ApiError::from_store)?;
  let hits: Vec<Feedback> = triage::filter(&items, &filter).into_iter().cloned().collect();
  Ok(Envelope::data(hits))
}

/// `GET /feedback/stats`
pub async fn stats<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
) -> Result<Envelope<FeedbackStats>, ApiError> {
  caller.require(Operation::ViewFeedback)?;
  let items = store.list_feedback().await.map_err(ApiError::from_store)?;
  Ok(Envelope::data(FeedbackStats::from_items(&items)))
}

/// `GET /feedback/:id`
pub async fn get_one<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Envelope<Feedback>, ApiError> {
  caller.require(Operation::ViewFeedback)?;
  match store.get_feedback(id).await.map_err(ApiError::from_store)? {
    Some(fb) => Ok(Envelope::data(fb)),
    None => Err(campus_core::Error::FeedbackNotFound(id).into()),
  }
}

/// `POST /feedback/:id/respond`
pub async fn respond<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<FeedbackResponse>,
) -> Result<Envelope<Feedback>, ApiError> {
  caller.require(Operation::TriageFeedback)?;
  let fb = store.respond(id, body, None).await.map_err(ApiError::from_store)?;
  tracing::info!(feedback_id = %id, status = %fb.status, "feedback responded");
  Ok(Envelope::data(fb))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveBody {
  pub is_resolved: bool,
}

/// `PATCH /feedback/:id/resolve`
pub async fn resolve<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<ResolveBody>,
) -> Result<Envelope<Feedback>, ApiError> {
  caller.require(Operation::TriageFeedback)?;
  let fb = store
    .toggle_resolved(id, body.is_resolved, None)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Envelope::data(fb))
}
