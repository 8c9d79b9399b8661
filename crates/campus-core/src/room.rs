//! Rooms and the occupancy rules that govern them.
//!
//! A room is a fixed-capacity container of student identifiers. The
//! occupancy ledger (the store) is the only writer of `occupant_ids`; the
//! types here only describe and validate.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{Error, Result};

// ─── Purpose ─────────────────────────────────────────────────────────────────

/// What a room is used for. Anything other than [`RoomPurpose::Regular`] is a
/// special-purpose room.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoomPurpose {
  #[default]
  Regular,
  Guest,
  SickBay,
  Staff,
  Storage,
}

impl RoomPurpose {
  pub fn is_special(self) -> bool { !matches!(self, Self::Regular) }
}

// ─── Room ────────────────────────────────────────────────────────────────────

/// A room with its current occupants.
///
/// Invariant: `occupant_ids.len() <= capacity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
  pub number:       u32,
  pub capacity:     u32,
  pub purpose:      RoomPurpose,
  pub is_special:   bool,
  pub occupant_ids: BTreeSet<String>,
  pub created_at:   DateTime<Utc>,
}

impl Room {
  pub fn occupancy(&self) -> u32 { self.occupant_ids.len() as u32 }

  pub fn is_full(&self) -> bool { self.occupancy() >= self.capacity }

  pub fn free_beds(&self) -> u32 {
    self.capacity.saturating_sub(self.occupancy())
  }

  pub fn has_occupant(&self, student_id: &str) -> bool {
    self.occupant_ids.contains(student_id)
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::CampusStore::create_room`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoom {
  pub number:   u32,
  pub capacity: u32,
  #[serde(default)]
  pub purpose:  RoomPurpose,
}

impl NewRoom {
  pub fn new(number: u32, capacity: u32, purpose: RoomPurpose) -> Self {
    Self { number, capacity, purpose }
  }

  pub fn validate(&self) -> Result<()> {
    if self.number == 0 {
      return Err(Error::InvalidInput("room number must be positive".into()));
    }
    if self.capacity == 0 {
      return Err(Error::InvalidCapacity);
    }
    Ok(())
  }
}

/// Partial update accepted by [`crate::store::CampusStore::update_room`].
/// Occupants are never changed through this path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUpdate {
  pub capacity: Option<u32>,
  pub purpose:  Option<RoomPurpose>,
}

impl RoomUpdate {
  /// Check the update against the room's current occupancy.
  pub fn validate(&self, number: u32, occupants: u32) -> Result<()> {
    if let Some(capacity) = self.capacity {
      if capacity == 0 {
        return Err(Error::InvalidCapacity);
      }
      if capacity < occupants {
        return Err(Error::CapacityBelowOccupancy {
          number,
          occupants,
          requested: capacity,
        });
      }
    }
    Ok(())
  }
}

// ─── Numbering ───────────────────────────────────────────────────────────────

/// The number a newly created room should get: the first gap between existing
/// numbers, or one past the highest. `1` when there are no rooms.
pub fn next_available_room_number(existing: &[u32]) -> u32 {
  let mut sorted = existing.to_vec();
  sorted.sort_unstable();
  sorted.dedup();

  for pair in sorted.windows(2) {
    if pair[1] > pair[0] + 1 {
      return pair[0] + 1;
    }
  }
  sorted.last().map_or(1, |max| max.saturating_add(1))
}
