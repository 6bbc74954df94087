//! Unit tests for provider payload parsing and sample mapping.

use serde_json::json;
use uuid::Uuid;

use skycast::openweather::models::{CurrentWeather, GeoPlace};
use skycast::sync::worker::sample_from_report;

fn warsaw_payload() -> serde_json::Value {
    json!({
        "coord": {"lon": 21.0118, "lat": 52.2298},
        "weather": [
            {"id": 803, "main": "Clouds", "description": "zachmurzenie duże", "icon": "04d"}
        ],
        "base": "stations",
        "main": {
            "temp": 18.4,
            "feels_like": 17.9,
            "temp_min": 16.7,
            "temp_max": 19.9,
            "pressure": 1013,
            "humidity": 56
        },
        "visibility": 10000,
        "wind": {"speed": 3.6, "deg": 250},
        "clouds": {"all": 75},
        "dt": 1747300000,
        "sys": {
            "type": 2,
            "id": 2035659,
            "country": "PL",
            "sunrise": 1747276543,
            "sunset": 1747332190
        },
        "timezone": 7200,
        "id": 756135,
        "name": "Warszawa",
        "cod": 200
    })
}

#[test]
fn current_weather_parses_from_provider_payload() {
    let report: CurrentWeather =
        serde_json::from_value(warsaw_payload()).expect("payload should parse");

    assert_eq!(report.id, 756135);
    assert_eq!(report.name, "Warszawa");
    assert_eq!(report.sys.country, "PL");
    assert_eq!(report.coord.lat, 52.2298);
    assert_eq!(report.coord.lon, 21.0118);
    assert_eq!(report.main.temp, 18.4);
    assert_eq!(report.main.humidity, 56);
    assert_eq!(report.visibility, 10000);
    assert_eq!(report.condition().map(|c| c.icon.as_str()), Some("04d"));
}

#[test]
fn optional_sections_default_when_absent() {
    // Stripped-down payload: no wind, clouds, visibility, or weather entries
    let payload = json!({
        "coord": {"lon": 19.9450, "lat": 50.0647},
        "main": {"temp": -2.0, "feels_like": -6.5, "pressure": 1021, "humidity": 88},
        "dt": 1747300000,
        "id": 3094802,
        "name": "Kraków"
    });

    let report: CurrentWeather = serde_json::from_value(payload).expect("payload should parse");

    assert_eq!(report.wind.speed, 0.0);
    assert_eq!(report.clouds.all, 0);
    assert_eq!(report.visibility, 0);
    assert_eq!(report.sys.country, "");
    assert!(report.condition().is_none());
}

#[test]
fn sample_mapping_carries_all_persisted_fields() {
    let raw = warsaw_payload();
    let report: CurrentWeather = serde_json::from_value(raw.clone()).expect("payload should parse");

    let city_id = Uuid::new_v4();
    let sample = sample_from_report(city_id, &report, raw.clone());

    assert_eq!(sample.city_id.unwrap(), city_id);
    assert_eq!(sample.temperature.unwrap(), 18.4);
    assert_eq!(sample.feels_like.unwrap(), 17.9);
    assert_eq!(sample.humidity.unwrap(), 56);
    assert_eq!(sample.pressure.unwrap(), 1013);
    assert_eq!(sample.wind_speed.unwrap(), 3.6);
    assert_eq!(sample.wind_direction.unwrap(), 250);
    assert_eq!(sample.weather_condition.unwrap(), "Clouds");
    assert_eq!(sample.weather_description.unwrap(), "zachmurzenie duże");
    assert_eq!(sample.weather_icon.unwrap(), "04d");
    assert_eq!(sample.clouds.unwrap(), 75);
    assert_eq!(sample.visibility.unwrap(), 10000);

    // Epoch fields become timestamps
    assert_eq!(sample.measured_at.unwrap().timestamp(), 1_747_300_000);
    assert_eq!(sample.sunrise.unwrap().timestamp(), 1_747_276_543);
    assert_eq!(sample.sunset.unwrap().timestamp(), 1_747_332_190);

    // Raw payload is stored opaquely
    assert_eq!(sample.payload.unwrap(), Some(raw));
}

#[test]
fn sample_mapping_tolerates_missing_condition() {
    let raw = json!({
        "coord": {"lon": 19.9450, "lat": 50.0647},
        "main": {"temp": -2.0, "feels_like": -6.5, "pressure": 1021, "humidity": 88},
        "dt": 1747300000,
        "id": 3094802,
        "name": "Kraków"
    });
    let report: CurrentWeather = serde_json::from_value(raw.clone()).expect("payload should parse");

    let sample = sample_from_report(Uuid::new_v4(), &report, raw);

    assert_eq!(sample.weather_condition.unwrap(), "");
    assert_eq!(sample.weather_description.unwrap(), "");
    assert_eq!(sample.weather_icon.unwrap(), "");
}

#[test]
fn geocode_hits_parse_with_and_without_state() {
    let payload = json!([
        {
            "name": "Warsaw",
            "local_names": {"pl": "Warszawa"},
            "lat": 52.2298,
            "lon": 21.0118,
            "country": "PL",
            "state": "Masovian Voivodeship"
        },
        {
            "name": "Warsaw",
            "lat": 41.2381,
            "lon": -85.8530,
            "country": "US"
        }
    ]);

    let places: Vec<GeoPlace> = serde_json::from_value(payload).expect("payload should parse");

    assert_eq!(places.len(), 2);
    assert_eq!(places[0].state.as_deref(), Some("Masovian Voivodeship"));
    assert_eq!(places[1].state, None);
    assert_eq!(places[1].country, "US");
}
