pub use sea_orm_migration::prelude::*;

mod m20241015_000001_create_countries;
mod m20241015_000002_create_cities;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241015_000001_create_countries::Migration),
            Box::new(m20241015_000002_create_cities::Migration),
        ]
    }
}
