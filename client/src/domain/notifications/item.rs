//! Notification values.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Generation-ordered notification identifier, unique per center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NotificationId(pub(super) u64);

impl NotificationId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-call options for [`super::NotificationCenter::notify`].
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use portal_client::domain::notifications::NotifyOptions;
///
/// let options = NotifyOptions::default()
///     .titled("Upload")
///     .lasting(Duration::from_millis(100))
///     .persistent();
/// assert!(options.persist);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyOptions {
    pub title: Option<String>,
    /// `None` uses the center's default; [`Duration::ZERO`] means sticky.
    pub duration: Option<Duration>,
    /// Also keep a copy in the bounded feed.
    pub persist: bool,
}

impl NotifyOptions {
    #[must_use]
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn lasting(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Never auto-dismiss.
    #[must_use]
    pub fn sticky(self) -> Self {
        self.lasting(Duration::ZERO)
    }

    #[must_use]
    pub fn persistent(mut self) -> Self {
        self.persist = true;
        self
    }
}

/// One posted notification.
///
/// The center owns every item; callers receive clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    pub(super) id: NotificationId,
    pub(super) kind: NotificationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) title: Option<String>,
    pub(super) message: String,
    pub(super) created_at: DateTime<Utc>,
    #[serde(rename = "durationMs", serialize_with = "as_millis")]
    pub(super) duration: Option<Duration>,
    pub(super) persist: bool,
    pub(super) read: bool,
}

fn as_millis<S: Serializer>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match duration {
        Some(duration) => {
            serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
        }
        None => serializer.serialize_none(),
    }
}

impl NotificationItem {
    pub fn id(&self) -> NotificationId {
        self.id
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Auto-dismiss delay; `None` for sticky toasts.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn is_persistent(&self) -> bool {
        self.persist
    }

    pub fn is_read(&self) -> bool {
        self.read
    }
}

/// Change published to [`super::NotificationCenter::subscribe`] receivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Posted(NotificationItem),
    Dismissed(NotificationId),
    FeedChanged { unread: usize },
}
