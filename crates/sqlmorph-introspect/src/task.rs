use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use sqlmorph_core::{Error, Result};

/// Last reported progress of a long-running task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub percent: u8,
    pub message: String,
}

/// Progress reporting and cancellation for one discovery run.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    name: String,
    cancel: CancellationToken,
    progress: Arc<watch::Sender<Progress>>,
}

impl TaskInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_token(name, CancellationToken::new())
    }

    pub fn with_token(name: impl Into<String>, cancel: CancellationToken) -> Self {
        let (progress, _) = watch::channel(Progress::default());
        Self {
            name: name.into(),
            cancel,
            progress: Arc::new(progress),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `Err(Error::Cancelled)` once cancellation has been requested.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn report(&self, percent: u8, message: impl Into<String>) {
        let progress = Progress {
            percent: percent.min(100),
            message: message.into(),
        };
        tracing::debug!(
            event = "task_progress",
            task = %self.name,
            percent = progress.percent,
            message = %progress.message,
        );
        self.progress.send_replace(progress);
    }

    pub fn progress(&self) -> Progress {
        self.progress.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_progress_to_subscribers() {
        let task = TaskInfo::new("source");
        let rx = task.subscribe();
        task.report(45, "Reading indexes");
        assert_eq!(rx.borrow().percent, 45);
        assert_eq!(task.progress().message, "Reading indexes");
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let task = TaskInfo::new("target");
        let clone = task.clone();
        assert!(task.check_cancelled().is_ok());
        clone.cancel();
        assert!(matches!(task.check_cancelled(), Err(Error::Cancelled)));
    }
}
