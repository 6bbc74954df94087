use serde::{Deserialize, Serialize};

/// Current conditions response from `/data/2.5/weather`.
///
/// Only the fields the dashboard persists or displays are typed; everything
/// else rides along in the raw payload kept next to this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// Provider-assigned city id.
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub coord: Coord,
    pub main: MainMetrics,
    #[serde(default)]
    pub weather: Vec<ConditionInfo>,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub clouds: Clouds,
    /// Meters; the provider omits it in rare cases.
    #[serde(default)]
    pub visibility: i32,
    #[serde(default)]
    pub sys: SysInfo,
    /// Measurement time, epoch seconds.
    #[serde(default)]
    pub dt: i64,
}

impl CurrentWeather {
    /// First (primary) weather condition entry, if the provider sent one.
    #[must_use]
    pub fn condition(&self) -> Option<&ConditionInfo> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MainMetrics {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: i32,
    pub pressure: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionInfo {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub deg: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Clouds {
    #[serde(default)]
    pub all: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SysInfo {
    #[serde(default)]
    pub country: String,
    /// Epoch seconds.
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
}

/// A fetched current-weather response: the typed view plus the raw payload.
/// The raw value is what gets cached, returned to clients, and stored as the
/// sample's opaque payload; the typed report feeds city creation and sample
/// field mapping.
#[derive(Debug, Clone)]
pub struct CurrentObservation {
    pub report: CurrentWeather,
    pub raw: serde_json::Value,
}

/// One geocoding hit from `/geo/1.0/direct`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPlace {
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}
