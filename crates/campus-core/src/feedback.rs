//! Feedback items and their triage lifecycle.
//!
//! Feedback is append-only: the engine never deletes an item. Staff actions
//! only set the response, priority, and resolution flag. The status shown to
//! callers is derived from those fields by [`Feedback::status`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// The fixed set of feedback categories offered to students.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeedbackCategory {
  Academic,
  Hostel,
  Mess,
  Library,
  Infrastructure,
  Administration,
  Other,
}

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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
  Urgent,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
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
pub enum FeedbackStatus {
  Pending,
  Responded,
  Resolved,
}

// ─── Feedback ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
  pub feedback_id:  Uuid,
  /// `None` for anonymous submissions.
  pub student_id:   Option<String>,
  pub category:     FeedbackCategory,
  pub rating:       u8,
  pub comment:      String,
  pub anonymous:    bool,
  pub created_at:   DateTime<Utc>,
  pub response:     Option<String>,
  pub priority:     Priority,
  pub is_resolved:  bool,
  pub responded_at: Option<DateTime<Utc>>,
  pub resolved_at:  Option<DateTime<Utc>>,
  /// Derived from the fields above; recomputed on every read.
  pub status:       FeedbackStatus,
}

impl Feedback {
  pub fn derive_status(&self) -> FeedbackStatus {
    if self.is_resolved {
      FeedbackStatus::Resolved
    } else if self.response.is_some() {
      FeedbackStatus::Responded
    } else {
      FeedbackStatus::Pending
    }
  }

  /// Record a staff response. `resolve` sets or clears the resolution.
  pub fn respond(&mut self, input: &FeedbackResponse, at: DateTime<Utc>) {
    self.response = Some(input.response.trim().to_owned());
    self.priority = input.priority;
    self.responded_at = Some(at);
    self.set_resolved(input.is_resolved, at);
  }

  /// Flip only the resolution flag and its timestamp.
  pub fn set_resolved(&mut self, resolved: bool, at: DateTime<Utc>) {
    self.is_resolved = resolved;
    self.resolved_at = resolved.then_some(at);
    self.status = self.derive_status();
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::CampusStore::submit_feedback`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
  pub student_id: Option<String>,
  pub category:   FeedbackCategory,
  pub rating:     u8,
  pub comment:    String,
  #[serde(default)]
  pub anonymous:  bool,
}

impl NewFeedback {
  pub fn validate(&self) -> Result<()> {
    if !(1..=5).contains(&self.rating) {
      return Err(Error::InvalidRating(self.rating));
    }
    if self.comment.trim().is_empty() {
      return Err(Error::EmptyComment);
    }
    Ok(())
  }

  /// Build the stored record. Anonymous submissions never keep the student
  /// id, even when one was supplied.
  pub fn into_feedback(self, at: DateTime<Utc>) -> Result<Feedback> {
    self.validate()?;
    let student_id = if self.anonymous {
      None
    } else {
      self
        .student_id
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
    };
    Ok(Feedback {
      feedback_id: Uuid::new_v4(),
      student_id,
      category: self.category,
      rating: self.rating,
      comment: self.comment.trim().to_owned(),
      anonymous: self.anonymous,
      created_at: at,
      response: None,
      priority: Priority::default(),
      is_resolved: false,
      responded_at: None,
      resolved_at: None,
      status: FeedbackStatus::Pending,
    })
  }
}

/// A staff response accepted by [`crate::store::CampusStore::respond`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
  pub response:    String,
  #[serde(default)]
  pub priority:    Priority,
  #[serde(default)]
  pub is_resolved: bool,
}

impl FeedbackResponse {
  pub fn validate(&self) -> Result<()> {
    if self.response.trim().is_empty() {
      return Err(Error::EmptyResponse);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn submission(rating: u8, comment: &str) -> NewFeedback {
    NewFeedback {
      student_id: Some("S42".into()),
      category:   FeedbackCategory::Mess,
      rating,
      comment:    comment.into(),
      anonymous:  false,
    }
  }

  #[test]
  fn rating_must_be_in_range() {
    assert!(matches!(submission(0, "x").validate(), Err(Error::InvalidRating(0))));
    assert!(matches!(submission(6, "x").validate(), Err(Error::InvalidRating(6))));
    assert!(submission(1, "x").validate().is_ok());
    assert!(submission(5, "x").validate().is_ok());
  }

  #[test]
  fn blank_comment_is_rejected() {
    assert!(matches!(submission(3, "  \n").validate(), Err(Error::EmptyComment)));
  }

  #[test]
  fn anonymous_submission_drops_student_id() {
    let mut input = submission(4, "Great food");
    input.anonymous = true;
    let fb = input.into_feedback(Utc::now()).unwrap();
    assert_eq!(fb.student_id, None);
    assert_eq!(fb.status, FeedbackStatus::Pending);
    assert_eq!(fb.priority, Priority::Medium);
  }

  #[test]
  fn lifecycle_pending_responded_resolved_and_back() {
    let now = Utc::now();
    let mut fb = submission(5, "Wi-Fi is down").into_feedback(now).unwrap();
    assert_eq!(fb.derive_status(), FeedbackStatus::Pending);

    fb.respond(
      &FeedbackResponse {
        response:    "Router replaced".into(),
        priority:    Priority::High,
        is_resolved: false,
      },
      now,
    );
    assert_eq!(fb.status, FeedbackStatus::Responded);
    assert_eq!(fb.responded_at, Some(now));
    assert_eq!(fb.resolved_at, None);

    fb.set_resolved(true, now);
    assert_eq!(fb.status, FeedbackStatus::Resolved);
    assert_eq!(fb.resolved_at, Some(now));

    fb.set_resolved(false, now);
    assert_eq!(fb.status, FeedbackStatus::Responded);
    assert_eq!(fb.resolved_at, None);
  }

  #[test]
  fn wire_format_is_camel_case() {
    let fb = submission(3, "ok").into_feedback(Utc::now()).unwrap();
    let json = serde_json::to_value(&fb).unwrap();
    assert_eq!(json["isResolved"], false);
    assert_eq!(json["category"], "mess");
    assert_eq!(json["status"], "pending");
    assert_eq!(json["priority"], "medium");
  }
}
