//! Per-highway classification of road events.
//!
//! This module provides [`classify`], which selects the events relevant to a
//! highway, orders them alerts first and derives the highway status shown to
//! the user.

use std::fmt;

use crate::open511::{EventType, Highway, RoadEvent};

/// Overall condition of a highway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighwayStatus {
    /// At least one incident or closure
    Alert,
    /// No alert, but road conditions or construction are reported
    Notice,
    /// Nothing to report
    Clear,
}

impl fmt::Display for HighwayStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HighwayStatus::Alert => write!(f, "Alert"),
            HighwayStatus::Notice => write!(f, "Notice"),
            HighwayStatus::Clear => write!(f, "Clear"),
        }
    }
}

/// Events of one highway, ready to be displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedHighwayView {
    /// The highway
    pub highway: Highway,
    /// Relevant events, alerts first, otherwise in aggregation order
    pub events: Vec<RoadEvent>,
    /// Derived status
    pub status: HighwayStatus,
}

impl fmt::Display for ClassifiedHighwayView {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {} ({} events)",
            self.highway,
            self.status,
            self.events.len()
        )
    }
}

/// Returns `true` if the event is an incident or describes a closed road.
pub fn is_alert(event: &RoadEvent) -> bool {
    event.event_type == EventType::Incident || event.description.to_lowercase().contains("closed")
}

/// Returns `true` if the event is a road condition or construction notice.
fn is_notice(event: &RoadEvent) -> bool {
    matches!(
        event.event_type,
        EventType::RoadCondition | EventType::Construction
    )
}

/// Returns `true` if one of the event roads mentions the highway id.
///
/// Matching is a case-sensitive substring test, so `Highway 1` also matches
/// `Highway 16`.
pub fn concerns_highway(event: &RoadEvent, highway_id: &str) -> bool {
    event.road_names.iter().any(|name| name.contains(highway_id))
        || event.road_name.contains(highway_id)
}

/// Classifies the events of one highway.
///
/// # Arguments
///
/// * `highway` - The highway to build the view for
/// * `events` - Every aggregated event, whatever their highway
///
/// # Examples
///
/// ```no_run
/// let view = classify(&Highway::lookup("Highway 5"), &events);
/// if view.status == HighwayStatus::Alert {
///     println!("{}", view.events[0].description);
/// }
/// ```
pub fn classify(highway: &Highway, events: &[RoadEvent]) -> ClassifiedHighwayView {
    // Stable partition: alerts first, both halves keep their relative order
    let (mut ordered, notices): (Vec<RoadEvent>, Vec<RoadEvent>) = events
        .iter()
        .filter(|event| concerns_highway(event, &highway.id))
        .cloned()
        .partition(is_alert);

    let status = if !ordered.is_empty() {
        HighwayStatus::Alert
    } else if notices.iter().any(is_notice) {
        HighwayStatus::Notice
    } else {
        HighwayStatus::Clear
    };

    ordered.extend(notices);

    ClassifiedHighwayView {
        highway: highway.clone(),
        events: ordered,
        status,
    }
}
