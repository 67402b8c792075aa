//! Watch-list enums, input payloads and the record view handed to callers.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use watchlist_db::{FieldValues, IntoFieldValues};

use crate::infra::storage::entity::{anime, kinopoisk};

/// Longest accepted `name` / `native_name`.
pub const NAME_MAX_LEN: usize = 255;
/// Inclusive score bounds.
pub const SCORE_RANGE: std::ops::RangeInclusive<i16> = 0..=100;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchStatus {
    #[sea_orm(string_value = "WATCHED")]
    Watched,
    #[sea_orm(string_value = "ABANDONED")]
    Abandoned,
    #[sea_orm(string_value = "POSTPONED")]
    Postponed,
    #[default]
    #[sea_orm(string_value = "SCHEDULED")]
    Scheduled,
    #[sea_orm(string_value = "REVIEWING")]
    Reviewing,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnimeKind {
    #[sea_orm(string_value = "FILM")]
    Film,
    #[sea_orm(string_value = "SERIES")]
    Series,
    #[sea_orm(string_value = "OVA")]
    Ova,
    #[sea_orm(string_value = "ONA")]
    Ona,
    #[sea_orm(string_value = "SPECIAL")]
    Special,
    #[default]
    #[sea_orm(string_value = "NOT_SET")]
    NotSet,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KinopoiskKind {
    #[sea_orm(string_value = "FILM")]
    Film,
    #[sea_orm(string_value = "SERIES")]
    Series,
    #[sea_orm(string_value = "SHORT_FILM")]
    ShortFilm,
    #[default]
    #[sea_orm(string_value = "NOT_SET")]
    NotSet,
}

/// One watch-list record as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element<K> {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: Option<String>,
    pub native_name: Option<String>,
    pub description: Option<String>,
    pub my_opinion: Option<String>,
    pub score: Option<i16>,
    pub repeat_view_count: i32,
    pub status: WatchStatus,
    pub kind: K,
}

macro_rules! element_from_model {
    ($model:ty, $kind:ty) => {
        impl From<$model> for Element<$kind> {
            fn from(m: $model) -> Self {
                Self {
                    id: m.id,
                    created_at: m.created_at,
                    updated_at: m.updated_at,
                    name: m.name,
                    native_name: m.native_name,
                    description: m.description,
                    my_opinion: m.my_opinion,
                    score: m.score,
                    repeat_view_count: m.repeat_view_count,
                    status: m.status,
                    kind: m.kind,
                }
            }
        }
    };
}

element_from_model!(anime::Model, AnimeKind);
element_from_model!(kinopoisk::Model, KinopoiskKind);

/// Payload for a new record. Missing fields take the column defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewElement<K> {
    pub name: Option<String>,
    pub native_name: Option<String>,
    pub description: Option<String>,
    pub my_opinion: Option<String>,
    pub score: Option<i16>,
    pub repeat_view_count: Option<i32>,
    pub status: Option<WatchStatus>,
    pub kind: Option<K>,
}

impl<K: Into<Value> + Send> IntoFieldValues for NewElement<K> {
    fn into_field_values(self) -> FieldValues {
        FieldValues::new()
            .set_opt("name", self.name)
            .set_opt("native_name", self.native_name)
            .set_opt("description", self.description)
            .set_opt("my_opinion", self.my_opinion)
            .set_opt("score", self.score)
            .set_opt("repeat_view_count", self.repeat_view_count)
            .set_opt("status", self.status)
            .set_opt("kind", self.kind)
    }
}

/// Partial update. Absent fields are left alone; fields listed in `clear`
/// are set to null unless a value is also given for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementPatch<K> {
    pub name: Option<String>,
    pub native_name: Option<String>,
    pub description: Option<String>,
    pub my_opinion: Option<String>,
    pub score: Option<i16>,
    pub repeat_view_count: Option<i32>,
    pub status: Option<WatchStatus>,
    pub kind: Option<K>,
    /// Nullable fields to reset.
    #[serde(default)]
    pub clear: Vec<String>,
}

/// Fields of a record that may be reset to null.
pub const CLEARABLE_FIELDS: [&str; 5] = ["name", "native_name", "description", "my_opinion", "score"];

impl<K: Into<Value> + Send> IntoFieldValues for ElementPatch<K> {
    fn into_field_values(self) -> FieldValues {
        // Absent fields become nulls; the change options decide which of
        // them are written.
        FieldValues::new()
            .set_opt("name", self.name)
            .set_opt("native_name", self.native_name)
            .set_opt("description", self.description)
            .set_opt("my_opinion", self.my_opinion)
            .set_opt("score", self.score)
            .set_opt("repeat_view_count", self.repeat_view_count)
            .set_opt("status", self.status)
            .set_opt("kind", self.kind)
    }
}

/// Account view without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub login: String,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Kind without a `Default`, like any catalog kind may be.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    enum Plain {
        A,
    }

    #[test]
    fn missing_fields_deserialize_as_absent() {
        let new: NewElement<Plain> = serde_json::from_str(r#"{"name": "Mushishi"}"#).unwrap();
        assert_eq!(new.name.as_deref(), Some("Mushishi"));
        assert_eq!(new.kind, None);
        assert_eq!(new.score, None);

        let patch: ElementPatch<Plain> =
            serde_json::from_str(r#"{"kind": "A", "clear": ["score"]}"#).unwrap();
        assert_eq!(patch.kind, Some(Plain::A));
        assert_eq!(patch.clear, vec!["score".to_owned()]);
        assert_eq!(patch.name, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<NewElement<Plain>>(r#"{"nmae": "x"}"#).is_err());
    }
}
