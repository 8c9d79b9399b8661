//! Role-scoped capabilities.
//!
//! Roles gate which operations a caller may invoke. They never change the
//! invariants an operation enforces; an admin and a warden assigning a
//! student go through exactly the same occupancy check.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

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
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
  Admin,
  Warden,
  Student,
}

/// Every operation the engine exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Operation {
  // Rooms
  ViewRooms,
  ManageRooms,
  AssignOccupants,
  // Library
  ViewBooks,
  ManageBooks,
  Circulate,
  ViewAllLoans,
  SendReminders,
  // Feedback
  SubmitFeedback,
  ViewFeedback,
  TriageFeedback,
  // Dashboards
  ViewDashboard,
}

impl Role {
  pub fn permits(self, op: Operation) -> bool {
    use Operation::*;
    match self {
      Role::Admin => true,
      Role::Warden => matches!(
        op,
        ViewRooms
          | AssignOccupants
          | ViewBooks
          | ViewFeedback
          | TriageFeedback
          | SubmitFeedback
          | ViewDashboard
      ),
      Role::Student => {
        matches!(op, ViewRooms | ViewBooks | SubmitFeedback | ViewDashboard)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn admin_can_do_everything() {
    assert!(Operation::iter().all(|op| Role::Admin.permits(op)));
  }

  #[test]
  fn warden_manages_occupancy_and_triage_only() {
    assert!(Role::Warden.permits(Operation::AssignOccupants));
    assert!(Role::Warden.permits(Operation::TriageFeedback));
    assert!(!Role::Warden.permits(Operation::ManageRooms));
    assert!(!Role::Warden.permits(Operation::Circulate));
  }

  #[test]
  fn student_is_read_mostly() {
    assert!(Role::Student.permits(Operation::SubmitFeedback));
    assert!(!Role::Student.permits(Operation::ViewFeedback));
    assert!(!Role::Student.permits(Operation::AssignOccupants));
    assert!(!Role::Student.permits(Operation::ViewAllLoans));
  }

  #[test]
  fn role_header_values_parse_case_insensitively() {
    assert_eq!("Warden".parse::<Role>().unwrap(), Role::Warden);
    assert_eq!("student".parse::<Role>().unwrap(), Role::Student);
    assert!("janitor".parse::<Role>().is_err());
  }
}
