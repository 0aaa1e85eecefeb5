//! Periodic task scheduler
//!
//! Runs the status sweep and the reminder dispatch in-process, each on its
//! own interval. Add new tasks by implementing the `PeriodicTask` trait.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::reconciler::StatusReconciler;
use super::reminder::ReminderDispatcher;

/// Trait for periodic background tasks
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    /// Task name for logging
    fn name(&self) -> &'static str;

    /// How often to run
    fn interval(&self) -> Duration;

    /// Execute the task
    async fn run(&self) -> anyhow::Result<()>;
}

/// Start all periodic tasks
pub fn start_scheduler(
    reconciler: StatusReconciler,
    reminders: ReminderDispatcher,
    sweep_interval: Duration,
    reminder_interval: Duration,
) -> Vec<JoinHandle<()>> {
    let tasks: Vec<Arc<dyn PeriodicTask>> = vec![
        Arc::new(StatusSweepTask {
            reconciler,
            every: sweep_interval,
        }),
        Arc::new(ReminderTask {
            dispatcher: reminders,
            every: reminder_interval,
        }),
    ];

    let handles = tasks
        .into_iter()
        .map(|task| tokio::spawn(run_task(task)))
        .collect();

    tracing::info!("Periodic task scheduler started");
    handles
}

/// Run a single task on its interval
async fn run_task(task: Arc<dyn PeriodicTask>) {
    let mut ticker = interval(task.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Skip the first immediate tick
    ticker.tick().await;

    loop {
        ticker.tick().await;

        tracing::debug!(task = task.name(), "Running periodic task");

        match task.run().await {
            Ok(()) => {
                tracing::debug!(task = task.name(), "Periodic task completed");
            }
            Err(e) => {
                tracing::error!(task = task.name(), error = %e, "Periodic task failed");
            }
        }
    }
}

// ============================================================================
// Status Sweep Task
// ============================================================================

pub struct StatusSweepTask {
    reconciler: StatusReconciler,
    every: Duration,
}

#[async_trait]
impl PeriodicTask for StatusSweepTask {
    fn name(&self) -> &'static str {
        "status_sweep"
    }

    fn interval(&self) -> Duration {
        self.every
    }

    async fn run(&self) -> anyhow::Result<()> {
        let summary = self.reconciler.sweep().await?;
        if !summary.errors.is_empty() {
            tracing::warn!(
                errors = summary.errors.len(),
                "Status sweep left appointments for the next run"
            );
        }
        Ok(())
    }
}

// ============================================================================
// Reminder Task
// ============================================================================

pub struct ReminderTask {
    dispatcher: ReminderDispatcher,
    every: Duration,
}

#[async_trait]
impl PeriodicTask for ReminderTask {
    fn name(&self) -> &'static str {
        "reminder_dispatch"
    }

    fn interval(&self) -> Duration {
        self.every
    }

    async fn run(&self) -> anyhow::Result<()> {
        self.dispatcher.dispatch().await?;
        Ok(())
    }
}
