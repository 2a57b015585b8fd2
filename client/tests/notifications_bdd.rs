//! Behaviour tests for toasts and the notification feed.
//!
//! Scenarios run on a paused Tokio clock so auto-dismiss timers fire as soon
//! as the runtime would otherwise sit idle.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::Runtime;

use portal_client::domain::NotificationCenter;
use portal_client::domain::notifications::{NotificationKind, NotifyOptions};
use portal_client::test_support::MutableClock;

struct NotificationWorld {
    runtime: Runtime,
    center: NotificationCenter,
}

impl NotificationWorld {
    fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .expect("tokio runtime");
        let clock = MutableClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0)
                .single()
                .expect("valid time"),
        );
        Self {
            runtime,
            center: NotificationCenter::new(Arc::new(clock)),
        }
    }

    /// Post from inside the runtime so auto-dismiss timers can be scheduled.
    fn post(&self, kind: NotificationKind, message: String, options: NotifyOptions) {
        let _entered = self.runtime.enter();
        self.center
            .notify(kind, message, options)
            .expect("center accepts notifications");
    }
}

#[fixture]
fn world() -> NotificationWorld {
    NotificationWorld::new()
}

#[given("a notification center")]
fn a_notification_center(world: &NotificationWorld) {
    assert!(world.center.transient().is_empty());
    assert!(world.center.feed().is_empty());
}

#[when("a success toast lasting {millis} ms is posted")]
fn a_success_toast_is_posted(world: &NotificationWorld, millis: u64) {
    world.post(
        NotificationKind::Success,
        "Saved".to_owned(),
        NotifyOptions::default().lasting(Duration::from_millis(millis)),
    );
}

#[when("{count} persistent notifications are posted")]
fn persistent_notifications_are_posted(world: &NotificationWorld, count: usize) {
    for n in 1..=count {
        world.post(
            NotificationKind::Info,
            format!("notification {n}"),
            NotifyOptions::default().persistent(),
        );
    }
}

#[when("{millis} ms pass")]
fn time_passes(world: &NotificationWorld, millis: u64) {
    world
        .runtime
        .block_on(async move { tokio::time::sleep(Duration::from_millis(millis)).await });
}

#[when("every toast is dismissed")]
fn every_toast_is_dismissed(world: &NotificationWorld) {
    for item in world.center.transient() {
        world.center.dismiss(item.id());
    }
}

#[when("every notification is marked read")]
fn every_notification_is_marked_read(world: &NotificationWorld) {
    world.center.mark_all_read();
}

#[then("{count} toasts are visible")]
fn toasts_are_visible(world: &NotificationWorld, count: usize) {
    assert_eq!(world.center.transient().len(), count);
}

#[then("the feed holds {count} notifications")]
fn the_feed_holds(world: &NotificationWorld, count: usize) {
    assert_eq!(world.center.feed().len(), count);
}

#[then("the newest feed entry reads {message}")]
fn the_newest_feed_entry_reads(world: &NotificationWorld, message: String) {
    let feed = world.center.feed();
    let newest = feed.first().expect("feed entry");
    assert_eq!(newest.message(), message);
}

#[then("{count} notifications are unread")]
fn notifications_are_unread(world: &NotificationWorld, count: usize) {
    assert_eq!(world.center.unread_count(), count);
}

#[scenario(
    path = "tests/features/notifications.feature",
    name = "A short toast expires on its own"
)]
fn a_short_toast_expires_on_its_own(world: NotificationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/notifications.feature",
    name = "The feed keeps the most recent persistent notifications"
)]
fn the_feed_keeps_the_most_recent_persistent_notifications(world: NotificationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/notifications.feature",
    name = "Dismissing a persistent toast keeps its feed entry"
)]
fn dismissing_a_persistent_toast_keeps_its_feed_entry(world: NotificationWorld) {
    drop(world);
}
