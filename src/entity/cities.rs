use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub openweather_id: i64,
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::weather_samples::Entity")]
    WeatherSamples,
    #[sea_orm(has_many = "super::user_cities::Entity")]
    UserCities,
}

impl Related<super::weather_samples::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeatherSamples.def()
    }
}

impl Related<super::user_cities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserCities.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_cities::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_cities::Relation::City.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
