/// Search input debouncing
///
/// Every input change restarts a single timer. When the timer elapses
/// uninterrupted, the trimmed value is committed on the channel handed out at
/// construction. Blank input cancels the timer and never commits. Dropping the
/// debouncer cancels whatever is pending.
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Fixed interval used by the interactive search
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending,
}

pub struct SearchDebouncer {
    interval: Duration,
    pending: Option<JoinHandle<()>>,
    commits: mpsc::UnboundedSender<String>,
}

impl SearchDebouncer {
    /// Create a debouncer and the receiver its commits arrive on
    pub fn new(interval: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (commits, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            interval,
            pending: None,
            commits,
        };
        (debouncer, rx)
    }

    /// Record an input change
    pub fn input(&mut self, value: &str) {
        self.cancel();

        let trimmed = value.trim();
        if trimmed.is_empty() {
            return;
        }

        let value = trimmed.to_string();
        let interval = self.interval;
        let commits = self.commits.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            debug!("Committing search for {}", value);
            // Receiver gone means nobody is listening for sessions anymore
            let _ = commits.send(value);
        }));
    }

    /// Cancel the pending commit, if any
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }

    pub fn state(&self) -> DebounceState {
        match &self.pending {
            Some(pending) if !pending.is_finished() => DebounceState::Pending,
            _ => DebounceState::Idle,
        }
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
