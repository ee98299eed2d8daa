// ── Connection status ──
//
// Reflects transport lifecycle events as a short status line with a binary
// good/bad tone. Purely observational: nothing here gates reconciliation.

use tokio::sync::watch;
use tracing::info;

/// Transport lifecycle as seen by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// Binary colour of the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Good,
    Bad,
}

/// What the status indicator shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: &'static str,
    pub tone: StatusTone,
    pub state: ConnectionState,
    /// Close reason of the last disconnect, if any.
    pub detail: Option<String>,
}

impl Status {
    pub fn connected() -> Self {
        Self {
            text: "connected",
            tone: StatusTone::Good,
            state: ConnectionState::Connected,
            detail: None,
        }
    }

    pub fn disconnected(detail: Option<String>) -> Self {
        Self {
            text: "disconnected",
            tone: StatusTone::Bad,
            state: ConnectionState::Disconnected,
            detail,
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::disconnected(None)
    }
}

/// Publishes [`Status`] changes through a watch channel.
#[derive(Debug)]
pub struct StatusReporter {
    tx: watch::Sender<Status>,
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReporter {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Status::default());
        Self { tx }
    }

    pub fn on_connect(&self) {
        info!("connected");
        self.tx.send_replace(Status::connected());
    }

    /// Always lands on "disconnected", whatever the prior state.
    pub fn on_close(&self, reason: &str) {
        info!(reason, "disconnected");
        let detail = (!reason.is_empty()).then(|| reason.to_owned());
        self.tx.send_replace(Status::disconnected(detail));
    }

    pub fn current(&self) -> Status {
        self.tx.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.tx.borrow().state
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn starts_disconnected() {
        let reporter = StatusReporter::new();
        assert_eq!(reporter.current(), Status::disconnected(None));
        assert_eq!(reporter.current().tone, StatusTone::Bad);
    }

    #[test]
    fn connect_then_close() {
        let reporter = StatusReporter::new();
        reporter.on_connect();
        assert_eq!(reporter.current().text, "connected");
        assert_eq!(reporter.current().tone, StatusTone::Good);

        reporter.on_close("connection closed (1006)");
        let status = reporter.current();
        assert_eq!(status.text, "disconnected");
        assert_eq!(status.tone, StatusTone::Bad);
        assert_eq!(status.detail.as_deref(), Some("connection closed (1006)"));
    }

    #[test]
    fn close_without_prior_connect_is_still_disconnected() {
        let reporter = StatusReporter::new();
        reporter.on_close("");
        assert_eq!(reporter.state(), ConnectionState::Disconnected);
        assert_eq!(reporter.current().detail, None);
    }

    #[tokio::test]
    async fn subscribers_observe_changes() {
        let reporter = StatusReporter::new();
        let mut rx = reporter.subscribe();

        reporter.on_connect();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state, ConnectionState::Connected);
    }
}
