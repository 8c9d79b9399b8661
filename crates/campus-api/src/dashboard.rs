//! `GET /dashboard[?student_id=]` — the role-scoped summary.
//!
//! Admins (and callers without a role header) get every aggregate unless they
//! ask for a specific student; wardens get rooms and feedback; students must
//! name themselves with `student_id`.

use std::sync::Arc;

use axum::extract::{Query, State};
use campus_core::{
  access::{Operation, Role},
  dashboard::{CirculationSummary, Dashboard, RoomSummary, StudentSummary},
  loan::LoanQuery,
  store::CampusStore,
  triage::FeedbackStats,
};
use serde::Deserialize;

use crate::{caller::Caller, envelope::Envelope, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
  pub student_id: Option<String>,
}

pub async fn handler<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Query(params): Query<DashboardParams>,
) -> Result<Envelope<Dashboard>, ApiError> {
  caller.require(Operation::ViewDashboard)?;

  let dashboard = match (caller.role, params.student_id) {
    (Some(Role::Student), None) => {
      return Err(ApiError::BadRequest("student dashboard requires student_id".into()));
    }
    (Some(Role::Student) | Some(Role::Admin) | None, Some(student_id)) => {
      let room = store.room_of(&student_id).await.map_err(ApiError::from_store)?;
      let loans = store
        .list_loans(&LoanQuery::for_student(student_id.clone()), None)
        .await
        .map_err(ApiError::from_store)?;
      Dashboard::Student(StudentSummary::new(student_id, room, loans))
    }
    (Some(Role::Warden), _) => {
      let rooms = store.list_rooms().await.map_err(ApiError::from_store)?;
      let feedback = store.list_feedback().await.map_err(ApiError::from_store)?;
      Dashboard::Warden {
        rooms:    RoomSummary::from_rooms(&rooms),
        feedback: FeedbackStats::from_items(&feedback),
      }
    }
    (Some(Role::Admin) | None, None) => {
      let rooms = store.list_rooms().await.map_err(ApiError::from_store)?;
      let books = store.list_books().await.map_err(ApiError::from_store)?;
      let loans = store
        .list_loans(&LoanQuery::default(), None)
        .await
        .map_err(ApiError::from_store)?;
      let feedback = store.list_feedback().await.map_err(ApiError::from_store)?;
      Dashboard::Admin {
        rooms:       RoomSummary::from_rooms(&rooms),
        circulation: CirculationSummary::from_records(&books, &loans),
        feedback:    FeedbackStats::from_items(&feedback),
      }
    }
  };
  Ok(Envelope::data(dashboard))
}
