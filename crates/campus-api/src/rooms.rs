//! Handlers for `/rooms` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/rooms` | Ascending by number |
//! | `POST`   | `/rooms` | Body: `{"number":101,"capacity":2,"purpose":"regular"}` |
//! | `GET`    | `/rooms/next-number` | `{"number":n}` |
//! | `GET`    | `/rooms/number/:n` | 404 if not found |
//! | `PUT`    | `/rooms/number/:n` | Body: `{"capacity"?, "purpose"?}` |
//! | `DELETE` | `/rooms/number/:n` | 409 while occupied |
//! | `POST`   | `/rooms/number/:n/assign/:student` | 409 when full |
//! | `DELETE` | `/rooms/number/:n/remove/:student` | |
//! | `GET`    | `/rooms/student/:student` | 404 if unassigned |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  access::Operation,
  room::{NewRoom, Room, RoomUpdate},
  store::CampusStore,
};
use serde::Serialize;

use crate::{caller::Caller, envelope::Envelope, error::ApiError};

// ─── Catalog ──────────────────────────────────────────────────────────────────

/// `GET /rooms`
pub async fn list<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
) -> Result<Envelope<Vec<Room>>, ApiError> {
  caller.require(Operation::ViewRooms)?;
  let rooms = store.list_rooms().await.map_err(ApiError::from_store)?;
  Ok(Envelope::data(rooms))
}

/// `POST /rooms`
pub async fn create<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<NewRoom>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Operation::ManageRooms)?;
  let room = store.create_room(body).await.map_err(ApiError::from_store)?;
  tracing::info!(number = room.number, capacity = room.capacity, "room created");
  Ok((StatusCode::CREATED, Envelope::data(room)))
}

#[derive(Debug, Serialize)]
pub struct NextNumber {
  pub number: u32,
}

/// `GET /rooms/next-number`
pub async fn next_number<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
) -> Result<Envelope<NextNumber>, ApiError> {
  caller.require(Operation::ViewRooms)?;
  let number = store
    .next_available_room_number()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Envelope::data(NextNumber { number }))
}

/// `GET /rooms/number/:n`
pub async fn get_one<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(number): Path<u32>,
) -> Result<Envelope<Room>, ApiError> {
  caller.require(Operation::ViewRooms)?;
  store
    .get_room(number)
    .await
    .map_err(ApiError::from_store)?
    .map(Envelope::data)
    .ok_or_else(|| campus_core::Error::RoomNotFound(number).into())
}

/// `PUT /rooms/number/:n`
pub async fn update<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(number): Path<u32>,
  Json(body): Json<RoomUpdate>,
) -> Result<Envelope<Room>, ApiError> {
  caller.require(Operation::ManageRooms)?;
  let room = store.update_room(number, body).await.map_err(ApiError::from_store)?;
  Ok(Envelope::data(room))
}

/// `DELETE /rooms/number/:n`
pub async fn delete<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(number): Path<u32>,
) -> Result<Envelope<()>, ApiError> {
  caller.require(Operation::ManageRooms)?;
  store.delete_room(number).await.map_err(ApiError::from_store)?;
  tracing::info!(number, "room deleted");
  Ok(Envelope::message(format!("room {number} deleted")))
}

// ─── Occupancy ────────────────────────────────────────────────────────────────

/// `POST /rooms/number/:n/assign/:student`
pub async fn assign<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path((number, student_id)): Path<(u32, String)>,
) -> Result<Envelope<Room>, ApiError> {
  caller.require(Operation::AssignOccupants)?;
  let room = store
    .assign_student(number, &student_id)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(number, %student_id, occupancy = room.occupancy(), "student assigned");
  Ok(Envelope::data(room))
}

/// `DELETE /rooms/number/:n/remove/:student`
pub async fn remove<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path((number, student_id)): Path<(u32, String)>,
) -> Result<Envelope<()>, ApiError> {
  caller.require(Operation::AssignOccupants)?;
  store
    .remove_student(number, &student_id)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(number, %student_id, "student removed");
  Ok(Envelope::message(format!("student {student_id} removed from room {number}")))
}

/// `GET /rooms/student/:student`
pub async fn of_student<S: CampusStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(student_id): Path<String>,
) -> Result<Envelope<Room>, ApiError> {
  caller.require(Operation::ViewRooms)?;
  match store.room_of(&student_id).await.map_err(ApiError::from_store)? {
    Some(room) => Ok(Envelope::data(room)),
    None => Err(campus_core::Error::StudentHasNoRoom(student_id).into()),
  }
}
