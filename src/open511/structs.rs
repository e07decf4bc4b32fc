//! Canonical data structures for highways and road events.
//!
//! This module defines the highway catalog and the [`RoadEvent`] shape every
//! upstream payload is normalized into.

use std::fmt;

use log::debug;

use crate::open511::response_structs::EventDetail;

/// Road name used when an event carries no road at all.
pub const UNKNOWN_ROAD: &str = "Unknown";

/// Static catalog of the highways a user can pick from.
const HIGHWAY_CATALOG: &[(&str, &str)] = &[
    ("Highway 1", "Trans-Canada Highway"),
    ("Highway 3", "Crowsnest Highway"),
    ("Highway 5", "Coquihalla Highway"),
    ("Highway 5A", "Princeton - Merritt"),
    ("Highway 16", "Yellowhead Highway"),
    ("Highway 97", "Okanagan Highway"),
    ("Highway 97C", "Okanagan Connector"),
    ("Highway 97D", "Logan Lake - Merritt"),
    ("Highway 99", "Sea-to-Sky Highway"),
];

/// A highway catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highway {
    /// Identifier used to query the events endpoint, e.g. `Highway 5`
    pub id: String,
    /// Display name
    pub name: String,
}

impl Highway {
    /// Returns the catalog entry for `id`.
    ///
    /// Ids missing from the catalog get their id as display name.
    pub fn lookup(id: &str) -> Highway {
        let name = HIGHWAY_CATALOG
            .iter()
            .find(|(catalog_id, _)| *catalog_id == id)
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| id.to_string());

        Highway {
            id: id.to_string(),
            name,
        }
    }

    /// Returns every highway of the catalog.
    pub fn catalog() -> Vec<Highway> {
        HIGHWAY_CATALOG
            .iter()
            .map(|(id, name)| Highway {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect()
    }
}

impl fmt::Display for Highway {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Open511 event types.
///
/// Unrecognized types are preserved in [`EventType::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    /// Collisions, hazards, closures caused by an unplanned event
    Incident,
    /// Road surface and weather related conditions
    RoadCondition,
    /// Planned roadwork
    Construction,
    /// Planned public event affecting traffic
    SpecialEvent,
    /// Weather conditions
    WeatherCondition,
    /// Any other value reported upstream
    Other(String),
}

impl EventType {
    fn parse(event_type: &str) -> Self {
        match event_type {
            "INCIDENT" => EventType::Incident,
            "ROAD_CONDITION" => EventType::RoadCondition,
            "CONSTRUCTION" => EventType::Construction,
            "SPECIAL_EVENT" => EventType::SpecialEvent,
            "WEATHER_CONDITION" => EventType::WeatherCondition,
            other => {
                debug!("unknown event type: {}", other);
                EventType::Other(other.to_string())
            }
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventType::Incident => write!(f, "INCIDENT"),
            EventType::RoadCondition => write!(f, "ROAD_CONDITION"),
            EventType::Construction => write!(f, "CONSTRUCTION"),
            EventType::SpecialEvent => write!(f, "SPECIAL_EVENT"),
            EventType::WeatherCondition => write!(f, "WEATHER_CONDITION"),
            EventType::Other(other) => write!(f, "{}", other),
        }
    }
}

/// A road event in canonical form.
///
/// Two events with the same `id` are the same underlying event, whatever
/// their other fields say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadEvent {
    /// Upstream identifier, stable across fetches
    pub id: String,
    /// Human readable description
    pub description: String,
    /// Event type
    pub event_type: EventType,
    /// Optional event subtype
    pub event_subtype: Option<String>,
    /// First road of the event, or [`UNKNOWN_ROAD`]
    pub road_name: String,
    /// Every road of the event, in upstream order
    pub road_names: Vec<String>,
    /// Upstream severity
    pub severity: String,
    /// Upstream status
    pub status: String,
}

impl fmt::Display for RoadEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "id={}, type={}, road={}, severity={}",
            self.id, self.event_type, self.road_name, self.severity
        )
    }
}

/// Normalizes a raw upstream event.
///
/// Never fails: missing fields fall back to empty strings, an empty road
/// list, and [`UNKNOWN_ROAD`] for the main road name.
impl From<EventDetail> for RoadEvent {
    fn from(detail: EventDetail) -> Self {
        let road_names: Vec<String> = detail
            .roads
            .unwrap_or_default()
            .into_iter()
            .filter_map(|road| road.name)
            .collect();

        let road_name = road_names
            .first()
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| UNKNOWN_ROAD.to_string());

        RoadEvent {
            id: detail.id.unwrap_or_default(),
            description: detail.description.unwrap_or_default(),
            event_type: EventType::parse(detail.event_type.as_deref().unwrap_or_default()),
            event_subtype: detail.event_subtype,
            road_name,
            road_names,
            severity: detail.severity.unwrap_or_default(),
            status: detail.status.unwrap_or_default(),
        }
    }
}
