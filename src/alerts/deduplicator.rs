//! At-most-once closure notifications.
//!
//! This module provides the [`NotificationDeduplicator`] which remembers every
//! event id that already produced a notification during the running session.

use std::collections::HashSet;

use log::debug;

use crate::{alerts::NotificationRecord, open511::RoadEvent};

/// Description keywords identifying a closure.
const CLOSURE_KEYWORDS: [&str; 3] = ["closed", "closure", "road closed"];

/// Returns `true` if the event description announces a closure.
pub fn is_closure(event: &RoadEvent) -> bool {
    let description = event.description.to_lowercase();
    CLOSURE_KEYWORDS
        .iter()
        .any(|keyword| description.contains(keyword))
}

/// Emits one notification per closure event id for the lifetime of the session.
///
/// The set of seen ids only grows: once notified, an id never notifies again,
/// even if the event disappears upstream and comes back, or if the user
/// dismisses the notification.
///
/// # Examples
///
/// ```no_run
/// let mut deduplicator = NotificationDeduplicator::new();
/// let records = deduplicator.observe(&events);
/// // Observing the same events again yields nothing
/// assert!(deduplicator.observe(&events).is_empty());
/// ```
#[derive(Debug, Default)]
pub struct NotificationDeduplicator {
    /// Ids of the events already notified
    seen_event_ids: HashSet<String>,
}

impl NotificationDeduplicator {
    /// Create a new [NotificationDeduplicator] with no seen ids.
    pub fn new() -> Self {
        NotificationDeduplicator::default()
    }

    /// Returns the notifications for the closures not seen before.
    ///
    /// Ids are marked as seen before the records are returned, so observing the
    /// same events again, or the same id twice in one call, emits nothing more.
    pub fn observe(&mut self, events: &[RoadEvent]) -> Vec<NotificationRecord> {
        events
            .iter()
            .filter(|event| is_closure(event))
            .filter(|event| self.seen_event_ids.insert(event.id.clone()))
            .map(|event| {
                debug!("new closure {}", event);
                NotificationRecord {
                    id: event.id.clone(),
                    message: format!("{}: {}", event.road_name, event.description),
                }
            })
            .collect()
    }

    /// Returns `true` if a notification was already emitted for `event_id`.
    #[cfg(test)]
    pub fn has_seen(&self, event_id: &str) -> bool {
        self.seen_event_ids.contains(event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open511::EventType;

    fn event(id: &str, event_type: EventType, description: &str) -> RoadEvent {
        RoadEvent {
            id: id.to_string(),
            description: description.to_string(),
            event_type,
            event_subtype: None,
            road_name: "Highway 5".to_string(),
            road_names: vec!["Highway 5".to_string()],
            severity: "MAJOR".to_string(),
            status: "ACTIVE".to_string(),
        }
    }

    #[test]
    fn test_closure_keywords() {
        assert!(is_closure(&event("1", EventType::Incident, "Road CLOSED")));
        assert!(is_closure(&event("2", EventType::Incident, "Full closure at km 12")));
        assert!(!is_closure(&event("3", EventType::Incident, "Vehicle incident")));
    }

    #[test]
    fn test_same_closure_notifies_once() {
        let mut deduplicator = NotificationDeduplicator::new();
        let events = vec![event("evt-9", EventType::Incident, "Highway closed near Hope")];

        let notified: usize = (0..3).map(|_| deduplicator.observe(&events).len()).sum();

        assert_eq!(notified, 1);
        assert!(deduplicator.has_seen("evt-9"));
    }

    #[test]
    fn test_record_message() {
        let mut deduplicator = NotificationDeduplicator::new();
        let records =
            deduplicator.observe(&[event("evt-1", EventType::Incident, "Closed for blasting")]);

        assert_eq!(
            records,
            vec![NotificationRecord {
                id: "evt-1".to_string(),
                message: "Highway 5: Closed for blasting".to_string(),
            }]
        );
    }

    #[test]
    fn test_non_closure_never_notifies() {
        let mut deduplicator = NotificationDeduplicator::new();

        for event_type in [
            EventType::Incident,
            EventType::Construction,
            EventType::RoadCondition,
        ] {
            let events = vec![event("w", event_type, "Construction ongoing, single lane")];
            assert!(deduplicator.observe(&events).is_empty());
        }
        assert!(!deduplicator.has_seen("w"));
    }

    #[test]
    fn test_duplicate_id_in_one_call() {
        let mut deduplicator = NotificationDeduplicator::new();
        let events = vec![
            event("dup", EventType::Incident, "Closed"),
            event("dup", EventType::Incident, "Still closed"),
        ];

        let records = deduplicator.observe(&events);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "Highway 5: Closed");
    }

    #[test]
    fn test_removed_then_readded_event_stays_silent() {
        let mut deduplicator = NotificationDeduplicator::new();
        let closure = event("evt-2", EventType::Incident, "Road closed");

        assert_eq!(deduplicator.observe(&[closure.clone()]).len(), 1);
        assert!(deduplicator.observe(&[]).is_empty());
        assert!(deduplicator.observe(&[closure]).is_empty());
    }

    #[test]
    fn test_multiple_new_closures() {
        let mut deduplicator = NotificationDeduplicator::new();
        let events = vec![
            event("a", EventType::Incident, "Closed"),
            event("b", EventType::Construction, "Paving"),
            event("c", EventType::RoadCondition, "Closure due to avalanche control"),
        ];

        let ids: Vec<String> = deduplicator
            .observe(&events)
            .into_iter()
            .map(|record| record.id)
            .collect();

        assert_eq!(ids, vec!["a", "c"]);
    }
}
