pub mod cities;
pub mod tokens;
pub mod user_cities;
pub mod users;
pub mod weather_samples;
