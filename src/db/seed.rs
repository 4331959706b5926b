use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};

use crate::entities::{city, country};
use crate::error::AppResult;

const DEMO_DATA: &[(&str, &str, &str, &[(&str, f64, f64)])] = &[
    (
        "Italy",
        "IT",
        "ITA",
        &[("Rome", 41.8933, 12.4829), ("Milan", 45.4669, 9.19)],
    ),
    (
        "France",
        "FR",
        "FRA",
        &[("Paris", 48.8566, 2.3522), ("Lyon", 45.764, 4.8357)],
    ),
    (
        "Japan",
        "JP",
        "JPN",
        &[("Tokyo", 35.6897, 139.6922), ("Osaka", 34.6936, 135.5019)],
    ),
    (
        "Indonesia",
        "ID",
        "IDN",
        &[("Jakarta", -6.2088, 106.8456), ("Bandung", -6.9175, 107.6191)],
    ),
];

/// Seed a handful of countries and cities if the country table is empty.
pub async fn seed_demo_data(db: &DatabaseConnection) -> AppResult<()> {
    if country::Entity::find().count(db).await? > 0 {
        tracing::debug!("Countries already present, skipping demo seed");
        return Ok(());
    }

    for (name, iso2, iso3, cities) in DEMO_DATA {
        let country = country::ActiveModel {
            name: Set(name.to_string()),
            iso2: Set(iso2.to_string()),
            iso3: Set(iso3.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        for (city_name, lat, lon) in cities.iter() {
            city::ActiveModel {
                name: Set(city_name.to_string()),
                lat: Set(*lat),
                lon: Set(*lon),
                country_id: Set(country.id),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    tracing::info!("Demo data seeded: {} countries", DEMO_DATA.len());
    Ok(())
}
