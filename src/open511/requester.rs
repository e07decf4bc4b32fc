//! HTTP client for the Open511 road events API.
//!
//! This module provides the [`Open511Requester`] struct for requesting the
//! events of one highway at a time.

use log::{debug, info};
use mockall::automock;
use reqwest::Client;

use crate::http::{RequestError, fetch_json};
use crate::open511::response_structs::{EventDetail, EventsResponse};

/// HTTP client for requesting road events from an Open511 server.
///
/// # Examples
///
/// ```no_run
/// let requester = Open511Requester::new("https://api.open511.gov.bc.ca");
/// let events = requester.get_events("Highway 5").await.unwrap();
/// println!("Events: {:?}", events);
/// ```
pub struct Open511Requester {
    /// Open511 server url, without trailing slash
    url: String,
    /// HTTP client
    client: Client,
}

/// Trait for requesting road events.
///
/// This trait abstracts the HTTP operations for easier testing with mocks.
#[automock]
pub trait Requester {
    /// Fetches the events reported on one highway.
    async fn get_events(&self, highway_id: &str) -> Result<Vec<EventDetail>, RequestError>;
}

impl Open511Requester {
    /// Create a new [Open511Requester].
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL of the Open511 server.
    pub fn new(url: &str) -> Self {
        Open511Requester {
            url: url.to_string(),
            client: Client::new(),
        }
    }
}

impl Requester for Open511Requester {
    /// Request `/events?format=json&road_name={highway_id}`.
    ///
    /// This api call returns a json object with the list of events:
    /// ```text
    /// {
    ///   events: [
    ///     { id: "drivebc.ca/DBC-1", description: "...", event_type: "INCIDENT",
    ///       roads: [{ name: "Highway 5" }], severity: "MAJOR", status: "ACTIVE" }
    ///   ]
    /// }
    /// ```
    /// A non-success status or a non JSON content type is an error.
    ///
    /// # Arguments
    ///
    /// * `highway_id` - The road name used to filter the events.
    async fn get_events(&self, highway_id: &str) -> Result<Vec<EventDetail>, RequestError> {
        let url = format!("{}/events", &self.url);
        info!("request events of {}", highway_id);
        debug!("request {}?format=json&road_name={}", &url, highway_id);

        let response: EventsResponse = fetch_json(
            self.client
                .get(&url)
                .query(&[("format", "json"), ("road_name", highway_id)]),
        )
        .await?;

        let events = response.into_events();
        debug!(
            "response from {}?road_name={} -> {} events",
            &url,
            highway_id,
            events.len()
        );

        Ok(events)
    }
}
