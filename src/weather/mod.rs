//! Weather forecast integration.
//!
//! This module fetches the forecast of each configured city from the
//! Open-Meteo API. It is consumed by the refresher as an opaque
//! `fetch_weather(lat, lon)` call.
//!
//! # Modules
//!
//! - `requester` - HTTP client for `/v1/forecast`
//! - `structs` - Raw payloads and the normalized [`WeatherData`]

mod requester;
mod structs;

#[cfg(test)]
pub use crate::weather::requester::MockWeatherRequester;
pub use crate::weather::requester::{OpenMeteoRequester, WeatherRequester};
pub use crate::weather::structs::WeatherData;
#[cfg(test)]
pub use crate::weather::structs::{CurrentWeather, DailyWeather, HourlyWeather};
