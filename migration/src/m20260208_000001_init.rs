use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== USERS ==========
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(Users::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== TOKENS ==========
        manager
            .create_table(
                Table::create()
                    .table(Tokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tokens::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(Tokens::UserId).uuid().not_null())
                    .col(ColumnDef::new(Tokens::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Tokens::TokenHash)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Tokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tokens_user")
                            .from(Tokens::Table, Tokens::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tokens_user_id")
                    .table(Tokens::Table)
                    .col(Tokens::UserId)
                    .to_owned(),
            )
            .await?;

        // ========== CITIES ==========
        manager
            .create_table(
                Table::create()
                    .table(Cities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cities::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(
                        ColumnDef::new(Cities::OpenweatherId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Cities::Name).string_len(191).not_null())
                    .col(ColumnDef::new(Cities::Country).string_len(8).not_null())
                    .col(ColumnDef::new(Cities::Latitude).double().not_null())
                    .col(ColumnDef::new(Cities::Longitude).double().not_null())
                    .col(
                        ColumnDef::new(Cities::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== USER_CITIES (favorites join table) ==========
        manager
            .create_table(
                Table::create()
                    .table(UserCities::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserCities::UserId).uuid().not_null())
                    .col(ColumnDef::new(UserCities::CityId).uuid().not_null())
                    .col(
                        ColumnDef::new(UserCities::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .primary_key(
                        Index::create()
                            .col(UserCities::UserId)
                            .col(UserCities::CityId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_cities_user")
                            .from(UserCities::Table, UserCities::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_cities_city")
                            .from(UserCities::Table, UserCities::CityId)
                            .to(Cities::Table, Cities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_cities_city_id")
                    .table(UserCities::Table)
                    .col(UserCities::CityId)
                    .to_owned(),
            )
            .await?;

        // ========== WEATHER_SAMPLES ==========
        manager
            .create_table(
                Table::create()
                    .table(WeatherSamples::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeatherSamples::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(WeatherSamples::CityId).uuid().not_null())
                    .col(ColumnDef::new(WeatherSamples::Temperature).double().not_null())
                    .col(ColumnDef::new(WeatherSamples::FeelsLike).double().not_null())
                    .col(ColumnDef::new(WeatherSamples::Humidity).integer().not_null())
                    .col(ColumnDef::new(WeatherSamples::Pressure).integer().not_null())
                    .col(ColumnDef::new(WeatherSamples::WindSpeed).double().not_null())
                    .col(ColumnDef::new(WeatherSamples::WindDirection).integer().not_null())
                    .col(
                        ColumnDef::new(WeatherSamples::WeatherCondition)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeatherSamples::WeatherDescription)
                            .string_len(191)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeatherSamples::WeatherIcon)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(ColumnDef::new(WeatherSamples::Clouds).integer().not_null())
                    .col(ColumnDef::new(WeatherSamples::Visibility).integer().not_null())
                    .col(
                        ColumnDef::new(WeatherSamples::Sunrise)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeatherSamples::Sunset)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeatherSamples::MeasuredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WeatherSamples::Payload).json_binary())
                    .col(
                        ColumnDef::new(WeatherSamples::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_weather_samples_city")
                            .from(WeatherSamples::Table, WeatherSamples::CityId)
                            .to(Cities::Table, Cities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Time-series access path: latest sample per city, ordered history
        manager
            .create_index(
                Index::create()
                    .name("idx_weather_samples_city_measured_at")
                    .table(WeatherSamples::Table)
                    .col(WeatherSamples::CityId)
                    .col(WeatherSamples::MeasuredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_weather_samples_city_created_at")
                    .table(WeatherSamples::Table)
                    .col(WeatherSamples::CityId)
                    .col(WeatherSamples::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WeatherSamples::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserCities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tokens {
    Table,
    Id,
    UserId,
    Name,
    TokenHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Cities {
    Table,
    Id,
    OpenweatherId,
    Name,
    Country,
    Latitude,
    Longitude,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserCities {
    Table,
    UserId,
    CityId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum WeatherSamples {
    Table,
    Id,
    CityId,
    Temperature,
    FeelsLike,
    Humidity,
    Pressure,
    WindSpeed,
    WindDirection,
    WeatherCondition,
    WeatherDescription,
    WeatherIcon,
    Clouds,
    Visibility,
    Sunrise,
    Sunset,
    MeasuredAt,
    Payload,
    CreatedAt,
}
