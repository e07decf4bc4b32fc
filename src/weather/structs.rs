//! Weather data structures.
//!
//! Raw Open-Meteo `/v1/forecast` payloads and the normalized [`WeatherData`]
//! kept per city.

use serde::Deserialize;
use std::fmt;

/// Normalized forecast of one location.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherData {
    /// Conditions right now
    pub current: CurrentWeather,
    /// One entry per day, starting today
    pub daily: DailyWeather,
    /// One entry per hour, starting today at midnight
    pub hourly: HourlyWeather,
}

/// Current conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub temp: f64,
    pub feels_like: f64,
    pub wind_kph: f64,
    pub precip: f64,
    pub snowfall: f64,
    pub weather_code: u8,
    pub time: String,
}

/// Daily forecast series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailyWeather {
    pub time: Vec<String>,
    pub weather_code: Vec<u8>,
    pub temp_max: Vec<f64>,
    pub temp_min: Vec<f64>,
    pub snowfall_sum: Vec<f64>,
}

/// Hourly forecast series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HourlyWeather {
    pub time: Vec<String>,
    pub temp: Vec<f64>,
    pub weather_code: Vec<u8>,
    pub apparent_temp: Vec<f64>,
    pub precip: Vec<f64>,
    pub snowfall: Vec<f64>,
}

/// Forecast of one hour of today.
#[derive(Debug, Clone, PartialEq)]
pub struct HourForecast {
    /// Local hour of the day
    pub hour: u8,
    pub temp: f64,
    pub feels_like: f64,
    pub weather_code: u8,
    pub precip: f64,
    pub snowfall: f64,
}

/// Forecast of one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayForecast {
    /// Local date, e.g. `2026-01-10`
    pub date: String,
    pub weather_code: u8,
    pub temp_max: f64,
    pub temp_min: f64,
    pub snowfall_sum: f64,
}

impl WeatherData {
    /// Returns today's forecast at `hour`, in the local time of the location.
    ///
    /// Today is the date of the current conditions. Returns `None` if the
    /// hourly series has no entry for that hour.
    pub fn at_hour(&self, hour: u8) -> Option<HourForecast> {
        let date = self.current.time.split('T').next()?;
        let time = format!("{}T{:02}:00", date, hour);
        let index = self.hourly.time.iter().position(|t| *t == time)?;

        Some(HourForecast {
            hour,
            temp: *self.hourly.temp.get(index)?,
            feels_like: *self.hourly.apparent_temp.get(index)?,
            weather_code: *self.hourly.weather_code.get(index)?,
            precip: self.hourly.precip.get(index).copied().unwrap_or(0.0),
            snowfall: self.hourly.snowfall.get(index).copied().unwrap_or(0.0),
        })
    }

    /// Returns the daily forecasts, starting today.
    ///
    /// Days with an incomplete series are skipped.
    pub fn days(&self) -> Vec<DayForecast> {
        let daily = &self.daily;

        daily
            .time
            .iter()
            .enumerate()
            .filter_map(|(index, date)| {
                Some(DayForecast {
                    date: date.clone(),
                    weather_code: *daily.weather_code.get(index)?,
                    temp_max: *daily.temp_max.get(index)?,
                    temp_min: *daily.temp_min.get(index)?,
                    snowfall_sum: daily.snowfall_sum.get(index).copied().unwrap_or(0.0),
                })
            })
            .collect()
    }
}

/// Writes the snowfall for snow codes, the precipitation otherwise.
fn write_precip(f: &mut fmt::Formatter, code: u8, precip: f64, snowfall: f64) -> fmt::Result {
    if is_snow_code(code) {
        write!(f, "{:.1}cm", snowfall)
    } else {
        write!(f, "{:.1}mm", precip)
    }
}

impl fmt::Display for WeatherData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:.0}°C (feels {:.0}°C), {}, wind {:.0} km/h, ",
            self.current.temp,
            self.current.feels_like,
            describe(self.current.weather_code),
            self.current.wind_kph
        )?;

        write_precip(
            f,
            self.current.weather_code,
            self.current.precip,
            self.current.snowfall,
        )
    }
}

impl fmt::Display for HourForecast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:02}:00 {:.0}°C (feels {:.0}°C), {}, ",
            self.hour,
            self.temp,
            self.feels_like,
            describe(self.weather_code)
        )?;

        write_precip(f, self.weather_code, self.precip, self.snowfall)
    }
}

impl fmt::Display for DayForecast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {}, {:.0}°C to {:.0}°C",
            self.date,
            describe(self.weather_code),
            self.temp_min,
            self.temp_max
        )?;

        if self.snowfall_sum > 0.0 {
            write!(f, ", {:.1}cm of snow", self.snowfall_sum)?;
        }

        Ok(())
    }
}

/// Returns `true` for the WMO codes reporting snow.
pub fn is_snow_code(code: u8) -> bool {
    (71..=77).contains(&code) || code == 85 || code == 86
}

/// Short description of a WMO weather code.
pub fn describe(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1..=3 => "Partly cloudy",
        45 | 48 => "Fog",
        51..=57 => "Drizzle",
        61..=67 => "Rain",
        71..=77 => "Snow",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95..=99 => "Thunderstorm",
        _ => "Unknown",
    }
}

/// Response from `/v1/forecast`.
#[derive(Deserialize, Debug)]
pub struct ForecastResponse {
    pub current: CurrentResponse,
    pub daily: DailyResponse,
    pub hourly: HourlyResponse,
}

#[derive(Deserialize, Debug)]
pub struct CurrentResponse {
    pub temperature_2m: f64,
    pub apparent_temperature: f64,
    pub wind_speed_10m: f64,
    #[serde(default)]
    pub precipitation: Option<f64>,
    #[serde(default)]
    pub snowfall: Option<f64>,
    pub weather_code: u8,
    pub time: String,
}

#[derive(Deserialize, Debug)]
pub struct DailyResponse {
    pub time: Vec<String>,
    pub weather_code: Vec<u8>,
    pub temperature_2m_max: Vec<f64>,
    pub temperature_2m_min: Vec<f64>,
    #[serde(default)]
    pub snowfall_sum: Option<Vec<f64>>,
}

#[derive(Deserialize, Debug)]
pub struct HourlyResponse {
    pub time: Vec<String>,
    pub temperature_2m: Vec<f64>,
    pub weather_code: Vec<u8>,
    pub apparent_temperature: Vec<f64>,
    #[serde(default)]
    pub precipitation: Option<Vec<f64>>,
    #[serde(default)]
    pub snowfall: Option<Vec<f64>>,
}

impl From<ForecastResponse> for WeatherData {
    fn from(response: ForecastResponse) -> Self {
        let ForecastResponse {
            current,
            daily,
            hourly,
        } = response;

        WeatherData {
            current: CurrentWeather {
                temp: current.temperature_2m,
                feels_like: current.apparent_temperature,
                wind_kph: current.wind_speed_10m,
                precip: current.precipitation.unwrap_or(0.0),
                snowfall: current.snowfall.unwrap_or(0.0),
                weather_code: current.weather_code,
                time: current.time,
            },
            daily: DailyWeather {
                time: daily.time,
                weather_code: daily.weather_code,
                temp_max: daily.temperature_2m_max,
                temp_min: daily.temperature_2m_min,
                snowfall_sum: daily.snowfall_sum.unwrap_or_default(),
            },
            hourly: HourlyWeather {
                time: hourly.time,
                temp: hourly.temperature_2m,
                weather_code: hourly.weather_code,
                apparent_temp: hourly.apparent_temperature,
                precip: hourly.precipitation.unwrap_or_default(),
                snowfall: hourly.snowfall.unwrap_or_default(),
            },
        }
    }
}
