//! Background reminder job.
//!
//! Same lifecycle shape as the HTTP server: spawn a tokio task that
//! ticks every `reminder_interval_secs`, runs [`dispatch_due_reminders`]
//! on the blocking pool, and stops when the handle's shutdown channel
//! fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::reminders::{dispatch_due_reminders, ReminderReport};
use crate::core_state::{CoreError, CoreState};

/// Handle to the running reminder task.
pub struct ReminderScheduler {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ReminderScheduler {
    /// Ask the loop to stop after the current pass.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Reminder scheduler shutdown signal sent");
        }
    }

    /// Signal shutdown and wait for the loop to exit.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Reminder scheduler task ended abnormally: {e}");
            }
        }
    }
}

/// Spawn the reminder loop. The first pass runs immediately.
pub fn start_reminder_scheduler(core: Arc<CoreState>) -> ReminderScheduler {
    let period = Duration::from_secs(core.config.reminder_interval_secs);
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        tracing::info!(period_secs = period.as_secs(), "Reminder scheduler started");
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {
                    match run_reminder_pass(core.clone()).await {
                        Ok(report) => tracing::debug!(
                            examined = report.examined,
                            notified = report.notified,
                            "Reminder pass finished"
                        ),
                        Err(e) => tracing::warn!(error = %e, "Reminder pass failed"),
                    }
                }
            }
        }
        tracing::info!("Reminder scheduler stopped");
    });

    ReminderScheduler {
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    }
}

/// One dispatch pass on the blocking pool. A missing database yields an
/// empty report.
pub async fn run_reminder_pass(core: Arc<CoreState>) -> Result<ReminderReport, CoreError> {
    let joined = tokio::task::spawn_blocking(move || {
        let now = core.now();
        core.with_db(|conn| dispatch_due_reminders(conn, now))
    })
    .await;

    match joined {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Reminder pass panicked: {e}");
            Ok(ReminderReport::default())
        }
    }
}
