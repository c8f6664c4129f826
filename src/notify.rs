//! Outbound side of workflow notifications.
//!
//! The workflow publishes [`LeaveNotice`]s into an unbounded channel and
//! never waits on delivery. [`run_dispatcher`] drains the channel and writes
//! one feed row per recipient; failures are logged and dropped.

use std::sync::Arc;

use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::leave::events::LeaveNotice;
use crate::store::NotificationFeed;

/// Fire-and-forget sink for workflow notifications.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, notice: LeaveNotice);
}

#[derive(Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<LeaveNotice>,
}

impl NotificationSink for ChannelSink {
    fn publish(&self, notice: LeaveNotice) {
        let event = notice.event;
        if let Err(e) = self.tx.unbounded_send(notice) {
            warn!(event = %event, error = %e, "Notification channel closed, dropping notice");
        }
    }
}

pub fn channel() -> (ChannelSink, UnboundedReceiver<LeaveNotice>) {
    let (tx, rx) = mpsc::unbounded();
    (ChannelSink { tx }, rx)
}

/// Persists notices until every sender is dropped.
pub async fn run_dispatcher(
    mut rx: UnboundedReceiver<LeaveNotice>,
    feed: Arc<dyn NotificationFeed>,
) {
    info!("Notification dispatcher started");

    while let Some(notice) = rx.next().await {
        let event = notice.event;
        for notification in notice.into_notifications() {
            match feed.push(&notification).await {
                Ok(row) => debug!(
                    event = %event,
                    user_id = %row.user_id,
                    notification_id = row.id,
                    "Notification stored"
                ),
                Err(e) => warn!(
                    event = %event,
                    user_id = %notification.user_id,
                    error = %e,
                    "Failed to store notification"
                ),
            }
        }
    }

    info!("Notification dispatcher stopped");
}
