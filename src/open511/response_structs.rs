//! Response structures for the Open511 events endpoint.
//!
//! This module contains the raw payload shapes returned by
//! `/events?format=json&road_name={highway}`. Every field is optional and
//! decoded on its own, so a field with an unexpected type falls back to its
//! default while the rest of the event is kept.

use log::warn;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;

/// Decodes an optional field, turning a value of the wrong type into `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }

    match serde_json::from_value(value) {
        Ok(decoded) => Ok(Some(decoded)),
        Err(e) => {
            warn!("malformed event field, using default: {}", e);
            Ok(None)
        }
    }
}

/// Response from `/events?format=json&road_name={highway}`.
///
/// Events are kept as raw JSON values so one malformed entry does not
/// prevent decoding of its siblings, see [`EventsResponse::into_events`].
#[derive(Deserialize, Debug, Default)]
pub struct EventsResponse {
    /// Raw event objects, absent or `null` means no events.
    #[serde(default)]
    pub events: Option<Vec<Value>>,
}

impl EventsResponse {
    /// Decodes each raw event into an [`EventDetail`].
    ///
    /// An entry that is not an object is replaced by a default
    /// [`EventDetail`] and a warning is logged.
    pub fn into_events(self) -> Vec<EventDetail> {
        self.events
            .unwrap_or_default()
            .into_iter()
            .map(|value| {
                serde_json::from_value::<EventDetail>(value).unwrap_or_else(|e| {
                    warn!("malformed event payload, using defaults: {}", e);
                    EventDetail::default()
                })
            })
            .collect()
    }
}

/// Representation of one event from `/events`.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct EventDetail {
    /// Upstream event identifier, stable across fetches.
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    /// Human readable description.
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    /// Event type such as `INCIDENT` or `CONSTRUCTION`.
    #[serde(default, deserialize_with = "lenient")]
    pub event_type: Option<String>,
    /// Optional subtype such as `HAZARD`.
    #[serde(default, deserialize_with = "lenient")]
    pub event_subtype: Option<String>,
    /// Roads touched by the event.
    #[serde(default, deserialize_with = "lenient")]
    pub roads: Option<Vec<RoadDetail>>,
    /// Severity such as `MAJOR`.
    #[serde(default, deserialize_with = "lenient")]
    pub severity: Option<String>,
    /// Status such as `ACTIVE`.
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
}

impl fmt::Display for EventDetail {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "id={:?}, event_type={:?}, roads={:?}",
            self.id, self.event_type, self.roads
        )
    }
}

/// Road entry of an event.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct RoadDetail {
    /// Road name, e.g. `Highway 5`.
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}
