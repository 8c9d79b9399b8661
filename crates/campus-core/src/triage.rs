//! Read-only views over the feedback set: filtering and aggregate counters.
//!
//! Nothing here mutates feedback; every function takes the stored items by
//! reference and derives a new value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::feedback::{Feedback, FeedbackCategory, FeedbackStatus, Priority};

/// Criteria for [`filter`]. Every set field must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackFilter {
  pub category:   Option<FeedbackCategory>,
  pub status:     Option<FeedbackStatus>,
  /// Exact rating.
  pub rating:     Option<u8>,
  pub min_rating: Option<u8>,
  pub priority:   Option<Priority>,
  /// Case-insensitive substring over comment, response, and student id.
  pub search:     Option<String>,
}

impl FeedbackFilter {
  pub fn matches(&self, fb: &Feedback) -> bool {
    if self.category.is_some_and(|c| c != fb.category) {
      return false;
    }
    if self.status.is_some_and(|s| s != fb.derive_status()) {
      return false;
    }
    if self.rating.is_some_and(|r| r != fb.rating) {
      return false;
    }
    if self.min_rating.is_some_and(|r| fb.rating < r) {
      return false;
    }
    if self.priority.is_some_and(|p| p != fb.priority) {
      return false;
    }
    match self.search.as_deref().map(str::trim) {
      Some(needle) if !needle.is_empty() => {
        let needle = needle.to_lowercase();
        [
          Some(fb.comment.as_str()),
          fb.response.as_deref(),
          fb.student_id.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|hay| hay.to_lowercase().contains(&needle))
      }
      _ => true,
    }
  }
}

/// Items matching `criteria`, in their original order.
pub fn filter<'a>(items: &'a [Feedback], criteria: &FeedbackFilter) -> Vec<&'a Feedback> {
  items.iter().filter(|fb| criteria.matches(fb)).collect()
}

/// Aggregate counters shown on the triage dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
  pub total:          usize,
  pub pending:        usize,
  pub responded:      usize,
  pub resolved:       usize,
  pub by_priority:    BTreeMap<Priority, usize>,
  pub by_category:    BTreeMap<FeedbackCategory, usize>,
  /// Mean rating rounded to two decimals; `None` when there is no feedback.
  pub average_rating: Option<f64>,
}

impl FeedbackStats {
  pub fn from_items<'a>(items: impl IntoIterator<Item = &'a Feedback>) -> Self {
    let mut stats = Self {
      total:          0,
      pending:        0,
      responded:      0,
      resolved:       0,
      by_priority:    Priority::iter().map(|p| (p, 0)).collect(),
      by_category:    FeedbackCategory::iter().map(|c| (c, 0)).collect(),
      average_rating: None,
    };

    let mut rating_sum = 0u64;
    for fb in items {
      stats.total += 1;
      match fb.derive_status() {
        FeedbackStatus::Pending => stats.pending += 1,
        FeedbackStatus::Responded => stats.responded += 1,
        FeedbackStatus::Resolved => stats.resolved += 1,
      }
      *stats.by_priority.entry(fb.priority).or_default() += 1;
      *stats.by_category.entry(fb.category).or_default() += 1;
      rating_sum += u64::from(fb.rating);
    }

    if stats.total > 0 {
      let mean = rating_sum as f64 / stats.total as f64;
      stats.average_rating = Some((mean * 100.0).round() / 100.0);
    }
    stats
  }
}
