use sea_orm::entity::prelude::*;

use crate::domain::models::{AnimeKind, WatchStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "anime")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub name: Option<String>,
    pub native_name: Option<String>,
    pub description: Option<String>,
    pub my_opinion: Option<String>,
    pub score: Option<i16>,
    pub repeat_view_count: i32,
    pub status: WatchStatus,
    pub kind: AnimeKind,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

super::timestamped_behavior!();
