//! Road alert classification and closure notifications.
//!
//! This module turns aggregated road events into what the user sees:
//!
//! - [`classify`]: Per-highway event selection, alerts-first ordering and
//!   [`HighwayStatus`]
//! - [`NotificationDeduplicator`]: One [`NotificationRecord`] per closure event
//!   id for the lifetime of the session
//! - [`NotificationBoard`]: Active notifications with their auto-dismiss timers
//!
//! # Example Usage
//!
//! ```no_run
//! let view = classify(&Highway::lookup("Highway 5"), &events);
//! println!("{}", view);
//!
//! let mut deduplicator = NotificationDeduplicator::new();
//! let mut board = NotificationBoard::new(Duration::from_secs(8));
//! for record in deduplicator.observe(&events) {
//!     board.show(record).await;
//! }
//! ```

mod board;
mod classifier;
mod deduplicator;
mod notification;

pub use crate::alerts::board::{DEFAULT_NOTIFICATION_TIMEOUT_SECS, NotificationBoard};
pub use crate::alerts::classifier::{ClassifiedHighwayView, HighwayStatus, classify};
pub use crate::alerts::deduplicator::NotificationDeduplicator;
pub use crate::alerts::notification::NotificationRecord;
