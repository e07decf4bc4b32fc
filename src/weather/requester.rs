//! HTTP client for the Open-Meteo forecast API.

use log::{debug, info};
use mockall::automock;
use reqwest::Client;

use crate::http::{RequestError, fetch_json};
use crate::weather::structs::{ForecastResponse, WeatherData};

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,precipitation,snowfall,weather_code,wind_speed_10m";
const HOURLY_FIELDS: &str =
    "temperature_2m,apparent_temperature,precipitation,snowfall,weather_code";
const DAILY_FIELDS: &str =
    "weather_code,temperature_2m_max,temperature_2m_min,precipitation_sum,snowfall_sum";

/// Trait for requesting the weather of a location.
#[automock]
pub trait WeatherRequester {
    /// Fetches the forecast at the given coordinates.
    async fn fetch_weather(&self, lat: f64, lon: f64) -> Result<WeatherData, RequestError>;
}

/// HTTP client for an Open-Meteo server.
pub struct OpenMeteoRequester {
    /// Open-Meteo server url, without trailing slash
    url: String,
    /// HTTP client
    client: Client,
}

impl OpenMeteoRequester {
    /// Create a new [OpenMeteoRequester].
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL of the Open-Meteo server.
    pub fn new(url: &str) -> Self {
        OpenMeteoRequester {
            url: url.to_string(),
            client: Client::new(),
        }
    }
}

impl WeatherRequester for OpenMeteoRequester {
    /// Request `/v1/forecast` with the current, hourly and daily series.
    async fn fetch_weather(&self, lat: f64, lon: f64) -> Result<WeatherData, RequestError> {
        let url = format!("{}/v1/forecast", &self.url);
        info!("request weather at {},{}", lat, lon);

        let (latitude, longitude) = (lat.to_string(), lon.to_string());
        let response: ForecastResponse = fetch_json(self.client.get(&url).query(&[
            ("latitude", latitude.as_str()),
            ("longitude", longitude.as_str()),
            ("current", CURRENT_FIELDS),
            ("hourly", HOURLY_FIELDS),
            ("daily", DAILY_FIELDS),
            ("timezone", "auto"),
            ("precipitation_unit", "mm"),
        ]))
        .await?;

        debug!("response from {} -> {:?}", &url, &response.current);

        Ok(WeatherData::from(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_fetch_weather() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{
            "current": {"time": "2026-01-10T08:00", "temperature_2m": 4.5, "apparent_temperature": 2.0,
                        "precipitation": 1.2, "snowfall": 0.0, "weather_code": 61, "wind_speed_10m": 20.0},
            "daily": {"time": ["2026-01-10", "2026-01-11"], "weather_code": [61, 3],
                      "temperature_2m_max": [6.0, 7.5], "temperature_2m_min": [1.0, 0.5], "snowfall_sum": [0.0, 0.0]},
            "hourly": {"time": [], "temperature_2m": [], "apparent_temperature": [], "weather_code": [],
                       "precipitation": [], "snowfall": []}
        }"#;

        server
            .mock("GET", "/v1/forecast")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("latitude".to_owned(), "49.2827".to_owned()),
                Matcher::UrlEncoded("longitude".to_owned(), "-123.1207".to_owned()),
                Matcher::UrlEncoded("timezone".to_owned(), "auto".to_owned()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json; charset=utf-8")
            .with_body(body)
            .create_async()
            .await;

        let requester = OpenMeteoRequester::new(&server.url());
        let weather = requester.fetch_weather(49.2827, -123.1207).await.unwrap();

        assert_eq!(weather.current.temp, 4.5);
        assert_eq!(weather.current.weather_code, 61);
        assert_eq!(weather.daily.temp_max, vec![6.0, 7.5]);
    }

    #[tokio::test]
    async fn test_fetch_weather_server_error() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/v1/forecast")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let requester = OpenMeteoRequester::new(&server.url());
        let result = requester.fetch_weather(50.0, -120.0).await;

        assert!(matches!(result, Err(RequestError::Status(_))));
    }
}
