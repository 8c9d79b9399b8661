//! Reminder hooks: log-only, or a webhook that forwards each reminder to an
//! email/SMS gateway.

use std::time::Duration;

use campus_core::notify::{Notifier, Reminder};
use reqwest::Client;

use crate::ReminderConfig;

/// Writes reminders to the log and never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
  type Error = campus_core::Error;

  async fn send_reminder(&self, reminder: &Reminder) -> Result<(), Self::Error> {
    tracing::info!(
      loan_id = %reminder.loan_id,
      student_id = %reminder.student_id,
      book_id = %reminder.book_id,
      days_overdue = reminder.days_overdue,
      fine = %reminder.fine,
      "overdue reminder"
    );
    Ok(())
  }
}

/// POSTs each reminder as JSON to a fixed URL.
///
/// The inner [`reqwest::Client`] is `Arc`-based, so clones share a pool.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
  client: Client,
  url:    String,
}

impl WebhookNotifier {
  pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
    Ok(Self { client, url: url.into() })
  }
}

impl Notifier for WebhookNotifier {
  type Error = campus_core::Error;

  async fn send_reminder(&self, reminder: &Reminder) -> Result<(), Self::Error> {
    let resp = self
      .client
      .post(&self.url)
      .json(reminder)
      .send()
      .await
      .map_err(|e| campus_core::Error::Notification(e.to_string()))?;

    if !resp.status().is_success() {
      return Err(campus_core::Error::Notification(format!(
        "POST {} → {}",
        self.url,
        resp.status()
      )));
    }
    Ok(())
  }
}

/// The hook chosen by configuration.
#[derive(Debug, Clone)]
pub enum ReminderHook {
  Log(LogNotifier),
  Webhook(WebhookNotifier),
}

impl ReminderHook {
  pub fn from_config(config: &ReminderConfig) -> Result<Self, reqwest::Error> {
    match config.webhook_url.as_deref().map(str::trim) {
      Some(url) if !url.is_empty() => Ok(Self::Webhook(WebhookNotifier::new(url)?)),
      _ => Ok(Self::Log(LogNotifier)),
    }
  }
}

impl Notifier for ReminderHook {
  type Error = campus_core::Error;

  async fn send_reminder(&self, reminder: &Reminder) -> Result<(), Self::Error> {
    match self {
      ReminderHook::Log(n) => n.send_reminder(reminder).await,
      ReminderHook::Webhook(n) => n.send_reminder(reminder).await,
    }
  }
}

#[cfg(test)]
mod tests {
  use campus_core::ErrorKind;
  use chrono::{NaiveDate, Utc};
  use rust_decimal::Decimal;
  use uuid::Uuid;

  use super::*;

  fn reminder() -> Reminder {
    Reminder {
      loan_id:      Uuid::new_v4(),
      student_id:   "X".into(),
      book_id:      "B1".into(),
      title:        None,
      due_date:     NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
      days_overdue: 4,
      fine:         Decimal::from(20),
      sent_at:      Utc::now(),
    }
  }

  #[test]
  fn blank_webhook_falls_back_to_log() {
    let config = ReminderConfig { webhook_url: Some("  ".into()), ..Default::default() };
    assert!(matches!(ReminderHook::from_config(&config).unwrap(), ReminderHook::Log(_)));

    let config = ReminderConfig {
      webhook_url: Some("http://127.0.0.1:9/hook".into()),
      ..Default::default()
    };
    assert!(matches!(
      ReminderHook::from_config(&config).unwrap(),
      ReminderHook::Webhook(_)
    ));
  }

  #[tokio::test]
  async fn log_hook_never_fails() {
    ReminderHook::Log(LogNotifier).send_reminder(&reminder()).await.unwrap();
  }

  #[tokio::test]
  async fn unreachable_webhook_is_a_dependency_failure() {
    // Port 9 (discard) is not listening in test environments.
    let hook = WebhookNotifier::new("http://127.0.0.1:9/hook").unwrap();
    let err = hook.send_reminder(&reminder()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dependency);
  }
}
