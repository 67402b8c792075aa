use sea_orm::Condition;
use sea_orm::sea_query::Expr;

/// Row-level restriction applied to reads for one permission mode.
///
/// `join_required` tells the repository that the filters reference a joined
/// table, so the caller must supply the corresponding join.
#[derive(Debug, Clone, Default)]
pub struct VisibilityFilter {
    pub join_required: bool,
    pub filters: Vec<Condition>,
}

impl VisibilityFilter {
    /// No restriction.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(filters: Vec<Condition>) -> Self {
        Self {
            join_required: false,
            filters,
        }
    }

    /// Filters that only make sense with a join on a related table.
    #[must_use]
    pub fn with_join(filters: Vec<Condition>) -> Self {
        Self {
            join_required: true,
            filters,
        }
    }

    /// Matches no rows.
    #[must_use]
    pub fn deny_all() -> Self {
        Self::new(vec![Condition::all().add(Expr::value(false))])
    }

    /// Filters to use for a statement with `join_count` joins.
    ///
    /// A filter that needs a join is dropped when the statement has none.
    pub(crate) fn effective(self, join_count: usize) -> Vec<Condition> {
        if self.join_required && join_count == 0 {
            tracing::debug!("visibility filter needs a join that is not present; dropped");
            return Vec::new();
        }
        self.filters
    }
}
