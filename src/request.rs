use std::future::Future;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::debug;

/// Result of an assistant request, as seen by the chat view.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failed(String),
    /// Deliberate supersession or shutdown. Silent: no banner, no message.
    Cancelled,
}

/// Holds the single in-flight backend call for a chat view.
///
/// Submission while a task is still running aborts the old one before the
/// new one starts, so a superseded response can never be appended out of
/// order. The normal flow only ever has one task because the view gates on
/// `in_flight`.
#[derive(Default)]
pub struct RequestSlot {
    task: Option<JoinHandle<Result<String>>>,
}

impl RequestSlot {
    pub fn in_flight(&self) -> bool {
        self.task.is_some()
    }

    pub fn submit<F>(&mut self, fut: F)
    where
        F: Future<Output = Result<String>> + Send + 'static,
    {
        if let Some(previous) = self.task.take() {
            debug!("superseding in-flight assistant request");
            previous.abort();
        }
        self.task = Some(tokio::spawn(fut));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Wait for the in-flight task to finish and classify the result.
    ///
    /// Cancellation-safe: the handle stays in the slot until the task
    /// actually completes, so this can live in a `select!` arm.
    pub async fn outcome(&mut self) -> Outcome {
        let joined = match self.task.as_mut() {
            Some(task) => task.await,
            None => std::future::pending().await,
        };
        self.task = None;
        match joined {
            Ok(Ok(text)) => Outcome::Success(text),
            Ok(Err(err)) => Outcome::Failed(err.to_string()),
            Err(join_err) if join_err.is_cancelled() => Outcome::Cancelled,
            Err(join_err) => Outcome::Failed(join_err.to_string()),
        }
    }
}
