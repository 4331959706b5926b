use sea_orm_migration::{prelude::*, schema::*};

use super::m20241015_000001_create_countries::Country;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(City::Table)
                    .if_not_exists()
                    .col(pk_auto(City::Id))
                    .col(string_len(City::Name, 100).not_null())
                    .col(double(City::Lat).not_null())
                    .col(double(City::Lon).not_null())
                    .col(integer(City::CountryId).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_city_country")
                            .from(City::Table, City::CountryId)
                            .to(Country::Table, Country::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookup index for the duplicate check; uniqueness is not enforced here
        manager
            .create_index(
                Index::create()
                    .name("idx_cities_name_country")
                    .table(City::Table)
                    .col(City::Name)
                    .col(City::CountryId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(City::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum City {
    #[sea_orm(iden = "cities")]
    Table,
    Id,
    Name,
    Lat,
    Lon,
    CountryId,
}
