//! Permission modes and per-repository permission rules.
//!
//! A caller acts under one [`PermissionMode`]. Every repository carries a
//! [`PermissionRules`] map from [`Operation`] to the minimum mode required to
//! run it. [`check_permission`] compares the two.
//!
//! # Ordering
//!
//! Modes are ranked by the privilege they carry:
//!
//! | Mode | Rank |
//! |------|------|
//! | `Anyone` | 1 |
//! | `Anon` | 2 |
//! | `User` | 3 |
//! | `Admin` | 4 |
//! | `NoOne` | 5 |
//!
//! A caller passes a rule when `caller.rank() >= rule.rank()`. A rule of
//! `Anyone` therefore admits every caller and a rule of `NoOne` admits nobody.
//!
//! Two callers sit outside the ranking. `Anyone` is the trusted internal
//! caller and passes every rule except `NoOne`. A caller acting as `NoOne` is
//! always refused.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Access mode a caller acts under, or the minimum mode a rule requires.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionMode {
    /// Internal callers with no identity attached.
    #[default]
    Anyone,
    /// Unauthenticated HTTP callers.
    Anon,
    /// Authenticated users.
    User,
    /// Authenticated administrators.
    Admin,
    /// Nobody.
    NoOne,
}

impl PermissionMode {
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Anyone => 1,
            Self::Anon => 2,
            Self::User => 3,
            Self::Admin => 4,
            Self::NoOne => 5,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anyone => "ANYONE",
            Self::Anon => "ANON",
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::NoOne => "NO_ONE",
        }
    }

    /// Returns `true` if a caller acting under `self` satisfies a rule of `required`.
    #[must_use]
    pub fn satisfies(self, required: PermissionMode) -> bool {
        match (self, required) {
            (Self::NoOne, _) | (_, Self::NoOne) => false,
            (Self::Anyone, _) => true,
            _ => self.rank() >= required.rank(),
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository operation guarded by a permission rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    ReadList,
    ReadCount,
    ReadDetail,
    Update,
    Disable,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Create,
        Operation::ReadList,
        Operation::ReadCount,
        Operation::ReadDetail,
        Operation::Update,
        Operation::Disable,
        Operation::Delete,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::ReadList => "read_list",
            Self::ReadCount => "read_count",
            Self::ReadDetail => "read_detail",
            Self::Update => "update",
            Self::Disable => "disable",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum permission mode per operation.
///
/// The default map contains every [`Operation`] with [`PermissionMode::Anyone`].
/// Removing an entry with [`PermissionRules::without`] makes the operation fail
/// closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRules {
    rules: BTreeMap<Operation, PermissionMode>,
}

impl PermissionRules {
    /// A map with no rules at all: every check is denied.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Every operation set to `mode`.
    #[must_use]
    pub fn uniform(mode: PermissionMode) -> Self {
        Self {
            rules: Operation::ALL.iter().map(|op| (*op, mode)).collect(),
        }
    }

    #[must_use]
    pub fn with(mut self, operation: Operation, mode: PermissionMode) -> Self {
        self.rules.insert(operation, mode);
        self
    }

    #[must_use]
    pub fn without(mut self, operation: Operation) -> Self {
        self.rules.remove(&operation);
        self
    }

    #[must_use]
    pub fn get(&self, operation: Operation) -> Option<PermissionMode> {
        self.rules.get(&operation).copied()
    }
}

impl Default for PermissionRules {
    fn default() -> Self {
        Self::uniform(PermissionMode::Anyone)
    }
}

pub const PERMISSION_ERROR_TYPE: &str = "authentication_error";

/// Refusal produced by [`check_permission`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionDenied {
    #[error("no permission rule configured for '{operation}'")]
    NoRule { operation: Operation },

    #[error("anonymous users have no access to this resource")]
    AnonNotAllowed { operation: Operation },

    #[error("users have no access to this resource")]
    UserNotAllowed { operation: Operation },

    #[error("administrators have no access to this resource")]
    AdminNotAllowed { operation: Operation },

    #[error("the resource is not available to anyone")]
    NoOneAllowed { operation: Operation },
}

impl PermissionDenied {
    fn for_caller(caller: PermissionMode, operation: Operation) -> Self {
        match caller {
            PermissionMode::Anon => Self::AnonNotAllowed { operation },
            PermissionMode::User => Self::UserNotAllowed { operation },
            PermissionMode::Admin => Self::AdminNotAllowed { operation },
            PermissionMode::Anyone | PermissionMode::NoOne => Self::NoOneAllowed { operation },
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoRule { .. } => "permission_denied",
            Self::AnonNotAllowed { .. } => "anon_permission_denied",
            Self::UserNotAllowed { .. } => "user_permission_denied",
            Self::AdminNotAllowed { .. } => "admin_permission_denied",
            Self::NoOneAllowed { .. } => "any_permission_denied",
        }
    }

    /// Short tag naming the caller kind that was refused.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NoRule { .. } => "no_rule",
            Self::AnonNotAllowed { .. } => "anon",
            Self::UserNotAllowed { .. } => "user",
            Self::AdminNotAllowed { .. } => "admin",
            Self::NoOneAllowed { .. } => "no_one",
        }
    }

    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::NoRule { operation }
            | Self::AnonNotAllowed { operation }
            | Self::UserNotAllowed { operation }
            | Self::AdminNotAllowed { operation }
            | Self::NoOneAllowed { operation } => *operation,
        }
    }
}

/// Checks whether `caller` may run `operation` under `rules`.
///
/// `ignore` skips the check entirely and logs a warning; it exists for trusted
/// internal call sites such as resolving an admin during login.
///
/// # Errors
/// - [`PermissionDenied::NoRule`] when `rules` has no entry for `operation`
/// - a caller-specific variant when `caller` does not satisfy the rule
pub fn check_permission(
    rules: &PermissionRules,
    operation: Operation,
    caller: PermissionMode,
    ignore: bool,
    context: &str,
) -> Result<(), PermissionDenied> {
    if ignore {
        tracing::warn!(
            context,
            operation = %operation,
            mode = %caller,
            "permission check bypassed"
        );
        return Ok(());
    }

    let Some(required) = rules.get(operation) else {
        tracing::error!(
            context,
            operation = %operation,
            mode = %caller,
            "no permission rule configured"
        );
        return Err(PermissionDenied::NoRule { operation });
    };

    if caller.satisfies(required) {
        return Ok(());
    }

    tracing::warn!(
        context,
        operation = %operation,
        mode = %caller,
        required = %required,
        "permission denied"
    );
    Err(PermissionDenied::for_caller(caller, operation))
}
