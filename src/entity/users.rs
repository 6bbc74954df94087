use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tokens::Entity")]
    Tokens,
    #[sea_orm(has_many = "super::user_cities::Entity")]
    UserCities,
}

impl Related<super::tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tokens.def()
    }
}

impl Related<super::user_cities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserCities.def()
    }
}

impl Related<super::cities::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_cities::Relation::City.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_cities::Relation::User.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
