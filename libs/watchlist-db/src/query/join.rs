use std::fmt;

use sea_orm::sea_query::LockType;
use sea_orm::{Condition, EntityTrait, JoinType, QuerySelect, RelationDef, Select};

/// Join flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
}

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Inner => JoinType::InnerJoin,
            JoinKind::Left => JoinType::LeftJoin,
        }
    }
}

/// A related table joined into a select, with an optional extra `ON` condition.
pub struct JoinSpec {
    pub relation: RelationDef,
    pub kind: JoinKind,
    pub on: Option<Condition>,
}

impl fmt::Debug for JoinSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinSpec")
            .field("from", &self.relation.from_tbl)
            .field("to", &self.relation.to_tbl)
            .field("kind", &self.kind)
            .field("on", &self.on.is_some())
            .finish()
    }
}

impl JoinSpec {
    #[must_use]
    pub fn inner(relation: RelationDef) -> Self {
        Self {
            relation,
            kind: JoinKind::Inner,
            on: None,
        }
    }

    #[must_use]
    pub fn left(relation: RelationDef) -> Self {
        Self {
            relation,
            kind: JoinKind::Left,
            on: None,
        }
    }

    /// Add `cond` to the join's `ON` clause.
    #[must_use]
    pub fn on(mut self, cond: Condition) -> Self {
        self.on = Some(cond);
        self
    }

    pub(crate) fn apply<E: EntityTrait>(self, select: Select<E>) -> Select<E> {
        let relation = match self.on {
            Some(cond) => self
                .relation
                .on_condition(move |_left, _right| cond.clone()),
            None => self.relation,
        };
        select.join(self.kind.into(), relation)
    }
}

/// Statement-level options that only apply to verbose reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOption {
    Distinct,
    LockShared,
    LockExclusive,
}

impl SelectOption {
    pub(crate) fn apply<E: EntityTrait>(self, select: Select<E>) -> Select<E> {
        match self {
            Self::Distinct => select.distinct(),
            Self::LockShared => select.lock(LockType::Share),
            Self::LockExclusive => select.lock(LockType::Update),
        }
    }
}

pub(crate) fn apply_joins<E: EntityTrait>(mut select: Select<E>, joins: Vec<JoinSpec>) -> Select<E> {
    for join in joins {
        select = join.apply(select);
    }
    select
}

pub(crate) fn apply_options<E: EntityTrait>(
    mut select: Select<E>,
    options: &[SelectOption],
) -> Select<E> {
    for option in options {
        select = option.apply(select);
    }
    select
}
