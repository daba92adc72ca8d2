//! Display projection of a [`ServiceRecord`].
//!
//! The UI never inspects records directly; it renders [`RecordView`]s.

use plate_core::ServiceKind;

use crate::record::{LifecycleState, PendingAction, ServiceRecord};

/// Number of container id characters shown.
pub const SHORT_HANDLE_LEN: usize = 12;

/// Coarse classification of a status, mapped to colors by the UI theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTone {
    /// Nothing happening yet.
    Idle,
    /// Waiting on an external operation.
    Busy,
    /// Running.
    Healthy,
    /// Stopped.
    Stopped,
    /// Failed.
    Failed,
    /// Awaiting a y/n answer.
    Prompt,
}

/// Everything the UI shows for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordView {
    /// Icon and service name.
    pub title: String,
    /// Status label, or the confirmation prompt.
    pub status: String,
    /// Tone of the status.
    pub tone: StatusTone,
    /// Tone of the lifecycle state alone, for the detail pane.
    pub state_tone: StatusTone,
    /// Whether a spinner should be shown next to the status.
    pub busy: bool,
    /// Labelled rows for the detail pane.
    pub details: Vec<(&'static str, String)>,
}

impl RecordView {
    /// Project a record into display strings.
    #[must_use]
    pub fn project(record: &ServiceRecord) -> Self {
        let state_tone = tone_of(record.state);
        let (status, tone) = match record.confirmation {
            Some(c) => (confirmation_prompt(c.action).to_string(), StatusTone::Prompt),
            None => (status_label(record.state).to_string(), state_tone),
        };

        let mut details = vec![
            ("Type", record.config.kind.to_string()),
            ("Version", record.config.version.clone()),
            ("Status", status_label(record.state).to_string()),
            ("Host Port", record.config.port.to_string()),
        ];
        if record.has_handle() {
            details.push(("Container ID", short_handle(&record.handle).to_string()));
        }
        if !record.endpoint.is_empty() {
            details.push(("Connection URL", record.endpoint.clone()));
        }
        if let Some(error) = &record.last_error {
            details.push(("Details", error.clone()));
        }
        details.push((
            "Last Change",
            record.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ));

        Self {
            title: format!("{} {}", kind_icon(record.config.kind), record.config.name),
            status,
            tone,
            state_tone,
            busy: record.is_busy(),
            details,
        }
    }
}

/// Icon shown before the service name.
#[must_use]
pub const fn kind_icon(kind: ServiceKind) -> &'static str {
    match kind {
        ServiceKind::Postgres => "🐘",
        ServiceKind::Redis => "🟥",
        ServiceKind::Mysql => "🐬",
        ServiceKind::Mongodb => "🍃",
    }
}

/// Status line for a lifecycle state.
#[must_use]
pub const fn status_label(state: LifecycleState) -> &'static str {
    match state {
        LifecycleState::Pending => "Pending...",
        LifecycleState::Checking => "🔍 Checking...",
        LifecycleState::Downloading => "📥 Downloading...",
        LifecycleState::Starting => "🚀 Starting...",
        LifecycleState::Running => "✅ Running",
        LifecycleState::Stopped => "🛑 Stopped",
        LifecycleState::Restarting => "🔄 Restarting...",
        LifecycleState::Resetting => "💥 Resetting...",
        LifecycleState::Deleting => "🗑️ Deleting...",
        LifecycleState::Error => "🔥 Error",
    }
}

/// Prompt shown while a destructive action awaits approval.
#[must_use]
pub const fn confirmation_prompt(action: PendingAction) -> &'static str {
    match action {
        PendingAction::Reset => "Confirm Reset? (y/n)",
        PendingAction::Delete => "Confirm Delete? (y/n)",
    }
}

const fn tone_of(state: LifecycleState) -> StatusTone {
    match state {
        LifecycleState::Pending => StatusTone::Idle,
        LifecycleState::Running => StatusTone::Healthy,
        LifecycleState::Stopped => StatusTone::Stopped,
        LifecycleState::Error => StatusTone::Failed,
        _ => StatusTone::Busy,
    }
}

/// First [`SHORT_HANDLE_LEN`] characters of a container id.
#[must_use]
pub fn short_handle(handle: &str) -> &str {
    handle
        .char_indices()
        .nth(SHORT_HANDLE_LEN)
        .map_or(handle, |(i, _)| &handle[..i])
}

#[cfg(test)]
mod tests {
    use plate_core::ServiceConfig;

    use super::*;
    use crate::record::Confirmation;

    fn redis() -> ServiceRecord {
        ServiceRecord::new(ServiceConfig::new(ServiceKind::Redis, "cache", "7", 6380))
    }

    fn detail<'a>(view: &'a RecordView, label: &str) -> Option<&'a str> {
        view.details
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn pending_record() {
        let view = RecordView::project(&redis());
        assert_eq!(view.title, "🟥 cache");
        assert_eq!(view.status, "Pending...");
        assert_eq!(view.tone, StatusTone::Idle);
        assert!(!view.busy);
        assert_eq!(detail(&view, "Type"), Some("redis"));
        assert_eq!(detail(&view, "Host Port"), Some("6380"));
        assert_eq!(detail(&view, "Container ID"), None);
        assert_eq!(detail(&view, "Connection URL"), None);
    }

    #[test]
    fn running_record_shows_short_id_and_url() {
        let mut record = redis();
        record.state = LifecycleState::Running;
        record.handle = "0123456789abcdef0123".to_string();
        record.endpoint = record.config.endpoint();

        let view = RecordView::project(&record);
        assert_eq!(view.status, "✅ Running");
        assert_eq!(view.tone, StatusTone::Healthy);
        assert_eq!(detail(&view, "Container ID"), Some("0123456789ab"));
        assert_eq!(detail(&view, "Connection URL"), Some("redis://localhost:6380"));
    }

    #[test]
    fn confirmation_replaces_status() {
        let mut record = redis();
        record.state = LifecycleState::Stopped;
        record.handle = "abc".to_string();
        record.confirmation = Some(Confirmation {
            action: PendingAction::Reset,
            restore: LifecycleState::Stopped,
        });

        let view = RecordView::project(&record);
        assert_eq!(view.status, "Confirm Reset? (y/n)");
        assert_eq!(view.tone, StatusTone::Prompt);
        assert_eq!(detail(&view, "Status"), Some("🛑 Stopped"));
        assert_eq!(view.state_tone, StatusTone::Stopped);
    }

    #[test]
    fn error_details() {
        let mut record = redis();
        record.state = LifecycleState::Error;
        record.last_error = Some("port is already allocated".to_string());

        let view = RecordView::project(&record);
        assert_eq!(view.tone, StatusTone::Failed);
        assert_eq!(detail(&view, "Details"), Some("port is already allocated"));
    }

    #[test]
    fn short_handle_of_short_id() {
        assert_eq!(short_handle("abc"), "abc");
        assert_eq!(short_handle(""), "");
    }

    #[test]
    fn busy_states_are_flagged() {
        let mut record = redis();
        record.state = LifecycleState::Downloading;
        let view = RecordView::project(&record);
        assert!(view.busy);
        assert_eq!(view.tone, StatusTone::Busy);
    }
}
