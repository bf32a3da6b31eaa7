//! One-shot "send report" mutation.

use crate::notify::Notifier;
use crate::settings::SettingsStore;
use log::{debug, info, warn};
use memedash_protocol::{ApiError, MemeApi, ReportRequest};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub const REPORT_SENT_MESSAGE: &str = "The meme report has been sent to Telegram.";
pub const REPORT_FAILED_MESSAGE: &str = "Failed to send report";

/// Result of a send attempt. Failures are reported, never raised.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Sent(Value),
    Failed(String),
    /// Another send was already in flight.
    Ignored,
}

/// Sends the top-memes report to Telegram through the API.
pub struct ReportMutation {
    api: Arc<dyn MemeApi>,
    settings: Arc<SettingsStore>,
    notifier: Notifier,
    limit: u32,
    pending: AtomicBool,
}

/// Clears the pending flag even if the send future is dropped.
struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReportMutation {
    pub fn new(
        api: Arc<dyn MemeApi>,
        settings: Arc<SettingsStore>,
        notifier: Notifier,
        limit: u32,
    ) -> Self {
        Self {
            api,
            settings,
            notifier,
            limit,
            pending: AtomicBool::new(false),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Send the report with the current credentials.
    ///
    /// Credentials are forwarded only when both fields are set. The outcome is
    /// also surfaced as a notification.
    pub async fn send(&self) -> ReportOutcome {
        if self
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("report send ignored; already pending");
            return ReportOutcome::Ignored;
        }
        let _guard = PendingGuard(&self.pending);

        let request = ReportRequest::new(&self.settings.credentials(), self.limit);
        info!(
            "sending meme report (limit={}, custom_credentials={})",
            request.limit,
            request.credentials.is_some()
        );
        match self.api.send_report(&request).await {
            Ok(body) => {
                self.notifier.success(REPORT_SENT_MESSAGE);
                ReportOutcome::Sent(body)
            }
            Err(err) => {
                warn!("failed to send meme report: {err}");
                let message = failure_message(&err);
                self.notifier.error(message.clone());
                ReportOutcome::Failed(message)
            }
        }
    }
}

fn failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Rejected { detail, .. } => detail.clone(),
        ApiError::Transport(message) => message.clone(),
        ApiError::Status { .. } | ApiError::Decode(_) => REPORT_FAILED_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{REPORT_FAILED_MESSAGE, REPORT_SENT_MESSAGE, ReportMutation, ReportOutcome};
    use crate::notify::{NotificationKind, Notifier};
    use crate::settings::SettingsStore;
    use crate::storage::MemoryStorage;
    use memedash_protocol::{ApiError, Credentials};
    use memedash_test_utils::{FailingApi, ScriptedApi};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn mutation(api: Arc<ScriptedApi>, notifier: &Notifier) -> (Arc<ReportMutation>, Arc<SettingsStore>) {
        let settings = Arc::new(SettingsStore::new(
            Arc::new(MemoryStorage::new()),
            notifier.clone(),
        ));
        let mutation = Arc::new(ReportMutation::new(api, settings.clone(), notifier.clone(), 20));
        (mutation, settings)
    }

    #[tokio::test]
    async fn empty_credentials_are_omitted() {
        let api = Arc::new(ScriptedApi::new());
        let notifier = Notifier::new(Duration::from_secs(60));
        let (mutation, _) = mutation(api.clone(), &notifier);

        assert!(matches!(mutation.send().await, ReportOutcome::Sent(_)));
        let request = api.report_requests().pop().expect("request");
        assert_eq!(serde_json::to_value(&request).expect("json"), json!({ "limit": 20 }));
        let shown = notifier.current().expect("notification");
        assert_eq!(shown.message, REPORT_SENT_MESSAGE);
        assert_eq!(shown.kind, NotificationKind::Success);
    }

    #[tokio::test]
    async fn saved_credentials_are_forwarded() {
        let api = Arc::new(ScriptedApi::new());
        let notifier = Notifier::new(Duration::from_secs(60));
        let (mutation, settings) = mutation(api.clone(), &notifier);
        settings
            .save(Credentials::new("123:abc", "-42"))
            .expect("save");

        mutation.send().await;
        let request = api.report_requests().pop().expect("request");
        assert_eq!(request.credentials, Some(Credentials::new("123:abc", "-42")));
    }

    #[tokio::test]
    async fn server_detail_becomes_error_notification() {
        let api = Arc::new(ScriptedApi::new());
        api.push_report(Err(ApiError::Rejected {
            status: 400,
            detail: "Invalid bot token".to_string(),
        }));
        api.push_report(Err(ApiError::Status { status: 500 }));
        let notifier = Notifier::new(Duration::from_secs(60));
        let (mutation, _) = mutation(api, &notifier);

        assert_eq!(
            mutation.send().await,
            ReportOutcome::Failed("Invalid bot token".to_string())
        );
        let shown = notifier.current().expect("notification");
        assert_eq!(shown.kind, NotificationKind::Error);
        assert_eq!(shown.message, "Invalid bot token");

        assert_eq!(
            mutation.send().await,
            ReportOutcome::Failed(REPORT_FAILED_MESSAGE.to_string())
        );
        assert!(!mutation.is_pending());
    }

    #[tokio::test]
    async fn concurrent_sends_are_serialized() {
        let api = Arc::new(ScriptedApi::new());
        api.push_report_after(Duration::from_millis(100), Ok(json!({ "status": "ok" })));
        let notifier = Notifier::new(Duration::from_secs(60));
        let (mutation, _) = mutation(api.clone(), &notifier);

        let first = {
            let mutation = mutation.clone();
            tokio::spawn(async move { mutation.send().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(mutation.is_pending());
        assert_eq!(mutation.send().await, ReportOutcome::Ignored);
        assert!(matches!(first.await.expect("join"), ReportOutcome::Sent(_)));
        assert!(!mutation.is_pending());
        assert_eq!(api.report_requests().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_server_reports_transport_message() {
        let notifier = Notifier::new(Duration::from_secs(60));
        let settings = Arc::new(SettingsStore::new(
            Arc::new(MemoryStorage::new()),
            notifier.clone(),
        ));
        let mutation = ReportMutation::new(
            Arc::new(FailingApi::unreachable()),
            settings,
            notifier.clone(),
            20,
        );

        assert_eq!(
            mutation.send().await,
            ReportOutcome::Failed("connection refused".to_string())
        );
        assert_eq!(
            notifier.current().map(|notification| notification.kind),
            Some(NotificationKind::Error)
        );
    }
}
