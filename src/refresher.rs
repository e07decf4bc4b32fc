//! Periodic refresh of the weather and road events.
//!
//! This module provides the [`Refresher`] which drives the whole pipeline: on
//! every tick of its interval, and whenever the user settings change, it runs
//! one refresh pass.
//!
//! # Refresh Pass
//!
//! ```text
//! Weather (per city) → Aggregator (per highway, cached) → Deduplicator → Board
//! ```
//!
//! Passes never overlap: they all run on the single task that owns the
//! refresher, so the aggregator cache and the seen event ids need no locking.
//! A settings change arriving during a pass is handled once the pass is over.

use std::{collections::HashMap, time::Duration};

use anyhow::anyhow;
use log::{debug, error, info, warn};
use tokio::{sync::watch, time};

use crate::{
    alerts::{
        ClassifiedHighwayView, HighwayStatus, NotificationBoard, NotificationDeduplicator,
        classify,
    },
    config::{Config, UserSettings},
    open511::{Highway, Open511Requester, Requester, RoadEvent, RoadEventAggregator},
    utils::{Clock, SystemClock},
    weather::{OpenMeteoRequester, WeatherData, WeatherRequester},
};

/// Owns the pipeline state for the lifetime of the session.
///
/// # Examples
///
/// ```no_run
/// let config = Config::load("config.yaml")?;
/// let (_settings_tx, settings_rx) = watch::channel(config.settings.clone());
/// let refresher = Refresher::from_config(&config);
/// refresher.run(settings_rx).await; // Runs indefinitely
/// ```
pub struct Refresher<R: Requester, W: WeatherRequester, C: Clock = SystemClock> {
    /// Road events aggregator and its cache
    aggregator: RoadEventAggregator<R, C>,
    /// Seen closure ids
    deduplicator: NotificationDeduplicator,
    /// Active notifications
    board: NotificationBoard,
    /// Weather requester
    weather_requester: W,
    /// Current user settings
    settings: UserSettings,
    /// Last weather of each city, by city name
    weather: HashMap<String, WeatherData>,
    /// Last aggregated road events
    road_events: Vec<RoadEvent>,
    /// Time between two passes
    interval: Duration,
}

impl Refresher<Open511Requester, OpenMeteoRequester> {
    /// Creates a refresher talking to the servers of the configuration.
    pub fn from_config(config: &Config) -> Self {
        let aggregator = RoadEventAggregator::new(Open511Requester::new(&config.open511.url))
            .with_ttl_ms(config.open511.cache_ttl.saturating_mul(1000))
            .with_max_concurrent_fetches(config.open511.max_concurrent_fetches);

        Refresher::new(
            aggregator,
            OpenMeteoRequester::new(&config.weather.url),
            NotificationBoard::new(Duration::from_secs(config.refresh.notification_timeout)),
            config.settings.clone(),
            Duration::from_secs(config.refresh.interval),
        )
    }
}

impl<R: Requester, W: WeatherRequester, C: Clock> Refresher<R, W, C> {
    /// Create a new [Refresher].
    ///
    /// # Arguments
    ///
    /// * `aggregator` - Road events aggregator
    /// * `weather_requester` - Weather client
    /// * `board` - Notification display list
    /// * `settings` - Initial user settings
    /// * `interval` - Time between two passes, at least one second
    pub fn new(
        aggregator: RoadEventAggregator<R, C>,
        weather_requester: W,
        board: NotificationBoard,
        settings: UserSettings,
        interval: Duration,
    ) -> Self {
        Refresher {
            aggregator,
            deduplicator: NotificationDeduplicator::new(),
            board,
            weather_requester,
            settings,
            weather: HashMap::new(),
            road_events: Vec::new(),
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    /// Runs refresh passes forever.
    ///
    /// A pass runs immediately, then on every interval tick and after every
    /// settings change published on `settings_rx`. A failing pass is logged
    /// and the loop goes on.
    pub async fn run(mut self, mut settings_rx: watch::Receiver<UserSettings>) {
        info!("refreshing every {} seconds", self.interval.as_secs());

        let mut interval = time::interval(self.interval);
        let mut listening = true;

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                changed = settings_rx.changed(), if listening => {
                    if changed.is_err() {
                        debug!("settings channel closed, stop listening to settings changes");
                        listening = false;
                        continue;
                    }
                    let settings = settings_rx.borrow_and_update().clone();
                    self.apply_settings(settings);
                }
            }

            self.refresh().await;
        }
    }

    /// Runs one pass and logs its outcome.
    async fn refresh(&mut self) {
        if let Err(e) = self.run_pass().await {
            error!("refresh pass failed: {:#}", e);
        }

        for view in self.views() {
            match view.status {
                HighwayStatus::Alert => warn!("{}", view),
                HighwayStatus::Notice | HighwayStatus::Clear => info!("{}", view),
            }
        }
        debug!("{} notifications displayed", self.board.active().await.len());
    }

    /// Replaces the user settings.
    ///
    /// The weather of cities no longer configured is forgotten. A new highway
    /// set invalidates the aggregator cache through its fingerprint.
    pub fn apply_settings(&mut self, settings: UserSettings) {
        info!(
            "settings changed: {} cities, highways {:?}",
            settings.cities.len(),
            settings.highways
        );

        self.weather
            .retain(|name, _| settings.cities.iter().any(|city| &city.name == name));
        self.settings = settings;
    }

    /// Runs one refresh pass.
    ///
    /// Fetches the weather of every city, then the road events of every
    /// highway, then displays a notification for each new closure.
    ///
    /// # Errors
    ///
    /// Returns an error if the weather of at least one city could not be
    /// fetched. The road events are refreshed anyway.
    pub async fn run_pass(&mut self) -> anyhow::Result<()> {
        let weather = self.refresh_weather().await;

        let events = self.aggregator.get_events(&self.settings.highways).await;
        for record in self.deduplicator.observe(&events) {
            warn!("road alert {}", record);
            self.board.show(record).await;
        }
        self.road_events = events;

        weather
    }

    /// Fetches the weather of each city, one after the other.
    ///
    /// The current conditions and the morning, afternoon and evening
    /// forecasts of today are logged. A failing city keeps its previous
    /// weather.
    async fn refresh_weather(&mut self) -> anyhow::Result<()> {
        let mut failed_cities: Vec<&str> = Vec::new();

        for city in &self.settings.cities {
            match self
                .weather_requester
                .fetch_weather(city.lat, city.lon)
                .await
            {
                Ok(weather) => {
                    info!("{}: {}", city.name, weather);
                    for (period, hour) in self.settings.forecast_hours.periods() {
                        match weather.at_hour(hour) {
                            Some(forecast) => info!("{} {}: {}", city.name, period, forecast),
                            None => debug!("no {} forecast at {}h for {}", period, hour, city.name),
                        }
                    }
                    for day in weather.days() {
                        debug!("{} {}", city.name, day);
                    }
                    self.weather.insert(city.name.clone(), weather);
                }
                Err(e) => {
                    error!("error while requesting weather of {}: {}", city.name, e);
                    failed_cities.push(&city.name);
                }
            }
        }

        if failed_cities.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(
                "weather unavailable for {}",
                failed_cities.join(", ")
            ))
        }
    }

    /// Returns the classified view of every configured highway, in settings order.
    pub fn views(&self) -> Vec<ClassifiedHighwayView> {
        self.settings
            .highways
            .iter()
            .map(|highway_id| classify(&Highway::lookup(highway_id), &self.road_events))
            .collect()
    }

    /// Returns the last weather of a city.
    #[cfg(test)]
    pub fn weather(&self, city_name: &str) -> Option<&WeatherData> {
        self.weather.get(city_name)
    }

    #[cfg(test)]
    pub fn board(&self) -> &NotificationBoard {
        &self.board
    }
}
