//! Toasts and the persistent notification feed.
//!
//! [`NotificationCenter`] owns two independent collections: the transient
//! list rendered as toasts, and a bounded, read-tracked feed for the bell
//! menu. Auto-dismiss timers are tokio tasks owned by the center; dismissing
//! an item or disposing the center aborts them, and a timer that fires after
//! the center is gone finds nothing to mutate.

mod item;

pub use self::item::{
    NotificationEvent, NotificationId, NotificationItem, NotificationKind, NotifyOptions,
};

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use mockable::Clock;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Auto-dismiss delay used when a caller does not choose one.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(4000);
/// Maximum number of entries retained in the feed.
pub const FEED_CAPACITY: usize = 20;

const EVENT_BUFFER: usize = 64;

#[derive(Default)]
struct State {
    next_id: u64,
    transient: Vec<NotificationItem>,
    feed: VecDeque<NotificationItem>,
    timers: HashMap<NotificationId, JoinHandle<()>>,
    disposed: bool,
}

impl State {
    fn unread(&self) -> usize {
        self.feed.iter().filter(|item| !item.read).count()
    }

    fn remove_transient(&mut self, id: NotificationId) -> bool {
        let before = self.transient.len();
        self.transient.retain(|item| item.id != id);
        self.transient.len() != before
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Notification service shared by the session layer and pages.
pub struct NotificationCenter {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock + Send + Sync>,
    events: broadcast::Sender<NotificationEvent>,
    default_duration: Duration,
    feed_capacity: usize,
}

impl NotificationCenter {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            clock,
            events,
            default_duration: DEFAULT_TOAST_DURATION,
            feed_capacity: FEED_CAPACITY,
        }
    }

    #[must_use]
    pub fn with_default_duration(mut self, duration: Duration) -> Self {
        self.default_duration = duration;
        self
    }

    #[must_use]
    pub fn with_feed_capacity(mut self, capacity: usize) -> Self {
        self.feed_capacity = capacity;
        self
    }

    /// Receive an event for every change to either collection.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }

    /// Post a notification.
    ///
    /// The item always joins the transient list. A positive duration
    /// schedules its removal from that list only; with `persist` a copy is
    /// also prepended to the feed, evicting the oldest entry past capacity.
    /// Returns `None` once the center has been disposed.
    pub fn notify(
        &self,
        kind: NotificationKind,
        message: impl Into<String>,
        options: NotifyOptions,
    ) -> Option<NotificationId> {
        let duration = options.duration.unwrap_or(self.default_duration);
        let mut state = lock(&self.state);
        if state.disposed {
            debug!("notification center disposed; dropping notification");
            return None;
        }
        state.next_id += 1;
        let id = NotificationId(state.next_id);
        let item = NotificationItem {
            id,
            kind,
            title: options.title,
            message: message.into(),
            created_at: self.clock.utc(),
            duration: (!duration.is_zero()).then_some(duration),
            persist: options.persist,
            read: false,
        };
        state.transient.push(item.clone());
        let feed_changed = item.persist;
        if feed_changed {
            state.feed.push_front(item.clone());
            state.feed.truncate(self.feed_capacity);
        }
        if let Some(timer) = item
            .duration
            .and_then(|delay| self.schedule_dismiss(id, delay))
        {
            state.timers.insert(id, timer);
        }
        let unread = state.unread();
        drop(state);

        self.publish(NotificationEvent::Posted(item));
        if feed_changed {
            self.publish(NotificationEvent::FeedChanged { unread });
        }
        Some(id)
    }

    pub fn success(&self, message: impl Into<String>) -> Option<NotificationId> {
        self.notify(NotificationKind::Success, message, NotifyOptions::default())
    }

    pub fn info(&self, message: impl Into<String>) -> Option<NotificationId> {
        self.notify(NotificationKind::Info, message, NotifyOptions::default())
    }

    pub fn warning(&self, message: impl Into<String>) -> Option<NotificationId> {
        self.notify(NotificationKind::Warning, message, NotifyOptions::default())
    }

    pub fn error(&self, message: impl Into<String>) -> Option<NotificationId> {
        self.notify(NotificationKind::Error, message, NotifyOptions::default())
    }

    fn schedule_dismiss(&self, id: NotificationId, delay: Duration) -> Option<JoinHandle<()>> {
        let Ok(handle) = Handle::try_current() else {
            warn!(%id, "no async runtime; toast will not auto-dismiss");
            return None;
        };
        let state = Arc::downgrade(&self.state);
        let events = self.events.clone();
        Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            expire_toast(&state, &events, id);
        }))
    }

    /// Remove an item from the transient list now. The feed is untouched.
    pub fn dismiss(&self, id: NotificationId) {
        let mut state = lock(&self.state);
        if let Some(timer) = state.timers.remove(&id) {
            timer.abort();
        }
        let removed = state.remove_transient(id);
        drop(state);
        if removed {
            self.publish(NotificationEvent::Dismissed(id));
        }
    }

    pub fn mark_read(&self, id: NotificationId) {
        self.update_feed(|feed| {
            let Some(item) = feed.iter_mut().find(|item| item.id == id && !item.read) else {
                return false;
            };
            item.read = true;
            true
        });
    }

    pub fn mark_all_read(&self) {
        self.update_feed(|feed| {
            let mut changed = false;
            for item in feed.iter_mut().filter(|item| !item.read) {
                item.read = true;
                changed = true;
            }
            changed
        });
    }

    /// Delete a feed entry permanently.
    pub fn remove_from_feed(&self, id: NotificationId) {
        self.update_feed(|feed| {
            let before = feed.len();
            feed.retain(|item| item.id != id);
            feed.len() != before
        });
    }

    pub fn clear_feed(&self) {
        self.update_feed(|feed| {
            let changed = !feed.is_empty();
            feed.clear();
            changed
        });
    }

    fn update_feed(&self, change: impl FnOnce(&mut VecDeque<NotificationItem>) -> bool) {
        let mut state = lock(&self.state);
        if !change(&mut state.feed) {
            return;
        }
        let unread = state.unread();
        drop(state);
        self.publish(NotificationEvent::FeedChanged { unread });
    }

    /// Number of unread feed entries, counted on demand.
    pub fn unread_count(&self) -> usize {
        lock(&self.state).unread()
    }

    /// Toasts currently on screen, oldest first.
    pub fn transient(&self) -> Vec<NotificationItem> {
        lock(&self.state).transient.clone()
    }

    /// Feed entries, newest first.
    pub fn feed(&self) -> Vec<NotificationItem> {
        lock(&self.state).feed.iter().cloned().collect()
    }

    /// Cancel every pending timer and stop accepting notifications.
    pub fn dispose(&self) {
        let mut state = lock(&self.state);
        state.disposed = true;
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
    }

    fn publish(&self, event: NotificationEvent) {
        // No subscribers is the normal case outside the UI.
        let _ = self.events.send(event);
    }
}

impl Drop for NotificationCenter {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn expire_toast(
    state: &Weak<Mutex<State>>,
    events: &broadcast::Sender<NotificationEvent>,
    id: NotificationId,
) {
    let Some(shared) = state.upgrade() else {
        return;
    };
    let mut state = lock(&shared);
    if state.disposed {
        return;
    }
    state.timers.remove(&id);
    let removed = state.remove_transient(id);
    drop(state);
    if removed {
        let _ = events.send(NotificationEvent::Dismissed(id));
    }
}
