//! Loading ticker — cosmetic phase labels shown while a generation runs.
//!
//! DESIGN
//! ======
//! A background task wakes on a fixed interval and advances a step index
//! published on a `watch` channel, wrapping at the end of the list. It is not
//! tied to real progress. The ticker owns its task: `stop()` or dropping the
//! ticker aborts it so no timer outlives the generation it decorates.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_STEP_MILLIS: u64 = 2500;

pub const LOADING_STEPS: &[&str] = &[
    "Visiting the website",
    "Studying the layout",
    "Matching colours and typography",
    "Writing the narration script",
    "Choreographing the cursor",
    "Animating the walkthrough",
    "Polishing the final cut",
];

pub struct LoadingTicker {
    step: watch::Receiver<usize>,
    task: Option<JoinHandle<()>>,
}

impl LoadingTicker {
    /// Spawn the ticker. The first label is visible immediately.
    #[must_use]
    pub fn start(period: Duration) -> Self {
        let (tx, rx) = watch::channel(0usize);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let next = (*tx.borrow() + 1) % LOADING_STEPS.len();
                if tx.send(next).is_err() {
                    break;
                }
            }
        });
        Self { step: rx, task: Some(task) }
    }

    #[must_use]
    pub fn step(&self) -> usize {
        *self.step.borrow()
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        LOADING_STEPS[self.step() % LOADING_STEPS.len()]
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for LoadingTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "loading_test.rs"]
mod tests;
