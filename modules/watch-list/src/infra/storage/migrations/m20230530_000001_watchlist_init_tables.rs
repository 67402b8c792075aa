use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Anime {
    Table,
}

#[derive(DeriveIden)]
enum Kinopoisk {
    Table,
}

#[derive(DeriveIden)]
enum Element {
    Id,
    CreatedAt,
    UpdatedAt,
    Name,
    NativeName,
    Description,
    MyOpinion,
    Score,
    RepeatViewCount,
    Status,
    Kind,
}

/// Columns shared by every watch-list table.
fn element_table<T: IntoIden + 'static>(table: T) -> TableCreateStatement {
    Table::create()
        .table(table)
        .if_not_exists()
        .col(ColumnDef::new(Element::Id).uuid().not_null().primary_key())
        .col(
            ColumnDef::new(Element::CreatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(Element::UpdatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(ColumnDef::new(Element::Name).string_len(255).null())
        .col(ColumnDef::new(Element::NativeName).string_len(255).null())
        .col(ColumnDef::new(Element::Description).text().null())
        .col(ColumnDef::new(Element::MyOpinion).text().null())
        .col(
            ColumnDef::new(Element::Score)
                .small_integer()
                .null()
                .check(Expr::col(Element::Score).between(0, 100)),
        )
        .col(
            ColumnDef::new(Element::RepeatViewCount)
                .integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(Element::Status)
                .string_len(16)
                .not_null()
                .default("SCHEDULED"),
        )
        .col(
            ColumnDef::new(Element::Kind)
                .string_len(16)
                .not_null()
                .default("NOT_SET"),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(element_table(Anime::Table)).await?;
        manager.create_table(element_table(Kinopoisk::Table)).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Kinopoisk::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Anime::Table).to_owned())
            .await
    }
}
