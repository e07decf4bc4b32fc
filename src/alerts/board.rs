//! Display list of active notifications.
//!
//! This module provides the [`NotificationBoard`] which holds the notifications
//! currently shown to the user and removes each of them after a fixed timeout.

use std::{collections::HashMap, sync::Arc, time::Duration};

use log::debug;
use tokio::{sync::Mutex, task::JoinHandle, time};

use crate::alerts::NotificationRecord;

/// Default display duration of a notification.
pub const DEFAULT_NOTIFICATION_TIMEOUT_SECS: u64 = 8;

/// Active notifications with their auto-dismiss timers.
///
/// Removing a record from the board never allows it to be notified again,
/// the seen ids are owned by the [`crate::alerts::NotificationDeduplicator`].
///
/// # Examples
///
/// ```no_run
/// let mut board = NotificationBoard::new(Duration::from_secs(8));
/// board.show(record).await;
/// // Eight seconds later the record is gone
/// ```
pub struct NotificationBoard {
    /// Records currently displayed, oldest first
    active: Arc<Mutex<Vec<NotificationRecord>>>,
    /// Auto-dismiss task of each displayed record
    timers: HashMap<String, JoinHandle<()>>,
    /// Display duration
    timeout: Duration,
}

impl NotificationBoard {
    /// Create a new empty [NotificationBoard].
    ///
    /// # Arguments
    ///
    /// * `timeout` - How long a record stays displayed unless dismissed
    pub fn new(timeout: Duration) -> Self {
        NotificationBoard {
            active: Arc::new(Mutex::new(Vec::new())),
            timers: HashMap::new(),
            timeout,
        }
    }

    /// Displays a record and schedules its removal after the timeout.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn show(&mut self, record: NotificationRecord) {
        // Forget timers of records that already expired
        self.timers.retain(|_, handle| !handle.is_finished());

        if let Some(handle) = self.timers.remove(&record.id) {
            handle.abort();
        }

        let id = record.id.clone();
        {
            let mut active = self.active.lock().await;
            active.retain(|r| r.id != id);
            active.push(record);
        }

        let active = Arc::clone(&self.active);
        let timeout = self.timeout;
        let expired_id = id.clone();
        let handle = tokio::spawn(async move {
            time::sleep(timeout).await;
            debug!("notification {} timed out", expired_id);
            active.lock().await.retain(|r| r.id != expired_id);
        });

        self.timers.insert(id, handle);
    }

    /// Removes a record before its timeout.
    ///
    /// Returns `true` if the record was displayed.
    #[cfg(test)]
    pub async fn dismiss(&mut self, id: &str) -> bool {
        if let Some(handle) = self.timers.remove(id) {
            handle.abort();
        }

        let mut active = self.active.lock().await;
        let before = active.len();
        active.retain(|r| r.id != id);
        let dismissed = active.len() != before;

        if dismissed {
            debug!("notification {} dismissed", id);
        }

        dismissed
    }

    /// Returns the records currently displayed, oldest first.
    pub async fn active(&self) -> Vec<NotificationRecord> {
        self.active.lock().await.clone()
    }
}
