//! Open511 road events integration.
//!
//! This module talks to the DriveBC Open511 API, normalizes the raw events and
//! aggregates the events of several highways into one cached, deduplicated list.
//!
//! # Modules
//!
//! - `aggregator` - Per-highway fetch, merge by event id and single-slot cache
//! - `requester` - HTTP client for the `/events` endpoint
//! - `response_structs` - Raw payload structures of the API
//! - `structs` - Highway catalog and canonical [`RoadEvent`]
//!
//! # Examples
//!
//! ```no_run
//! let requester = Open511Requester::new("https://api.open511.gov.bc.ca");
//! let mut aggregator = RoadEventAggregator::new(requester);
//! let events = aggregator.get_events(&["Highway 5".to_string()]).await;
//! ```

mod aggregator;
mod requester;
mod response_structs;
mod structs;

pub use crate::open511::aggregator::RoadEventAggregator;
pub use crate::open511::requester::{Open511Requester, Requester};
pub use crate::open511::structs::{EventType, Highway, RoadEvent};
#[cfg(test)]
pub use crate::open511::{
    requester::MockRequester,
    response_structs::{EventDetail, RoadDetail},
};
