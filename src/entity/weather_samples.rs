use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One fetched weather snapshot. Append-only: rows are never updated and
/// only deleted in bulk when their city is deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "weather_samples")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub city_id: Uuid,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i32,
    pub pressure: i32,
    pub wind_speed: f64,
    pub wind_direction: i32,
    pub weather_condition: String,
    pub weather_description: String,
    pub weather_icon: String,
    pub clouds: i32,
    pub visibility: i32,
    pub sunrise: DateTimeWithTimeZone,
    pub sunset: DateTimeWithTimeZone,
    /// Provider's own measurement timestamp (`dt`).
    pub measured_at: DateTimeWithTimeZone,
    /// Raw provider response, stored opaquely for round-trip retrieval.
    pub payload: Option<Json>,
    pub created_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cities::Entity",
        from = "Column::CityId",
        to = "super::cities::Column::Id"
    )]
    City,
}

impl Related<super::cities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::City.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
