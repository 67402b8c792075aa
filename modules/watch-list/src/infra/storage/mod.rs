//! Database side of the watch list: entities, schema migrations and the
//! permission-aware repositories bound to them.

pub mod entity;
pub mod migrations;
pub mod repositories;

pub use migrations::Migrator;
pub use repositories::{
    AdminRepository, AnimeRepository, KinopoiskRepository, UsersRepository, WatchListRepositories,
    WatchListUnitOfWork,
};
