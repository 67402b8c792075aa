use sea_orm_migration::prelude::*;

mod m20230530_000001_watchlist_init_tables;
mod m20230804_000001_admin_table;
mod m20231015_000001_users_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20230530_000001_watchlist_init_tables::Migration),
            Box::new(m20230804_000001_admin_table::Migration),
            Box::new(m20231015_000001_users_table::Migration),
        ]
    }
}
