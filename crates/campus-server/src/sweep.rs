//! The periodic overdue sweep.

use std::{sync::Arc, time::Duration};

use campus_api::remind::sweep_overdue;
use campus_core::{notify::Notifier, store::CampusStore};
use chrono::Utc;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Run [`sweep_overdue`] every `every` until the runtime shuts down. The first
/// sweep happens immediately. A failed sweep is logged and retried on the next
/// tick.
pub fn spawn<S, N>(
  store: Arc<S>,
  notifier: Arc<N>,
  every: Duration,
  resend_after: Option<chrono::Duration>,
) -> JoinHandle<()>
where
  S: CampusStore + 'static,
  N: Notifier + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
      ticker.tick().await;
      if let Err(e) = sweep_overdue(&*store, &*notifier, Utc::now(), resend_after).await {
        tracing::error!(error = %e, "overdue sweep failed");
      }
    }
  })
}
