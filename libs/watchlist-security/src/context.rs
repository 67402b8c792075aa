use uuid::Uuid;

use crate::permission::PermissionMode;

/// `CallerContext` describes who is issuing a request.
///
/// Built by the REST layer from the bearer token and handed to services, which
/// pass its [`PermissionMode`] down to the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CallerContext {
    /// Authenticated subject, if any.
    subject_id: Option<Uuid>,
    /// Mode the caller acts under.
    mode: PermissionMode,
}

impl CallerContext {
    /// Create a new `CallerContext` builder
    #[must_use]
    pub fn builder() -> CallerContextBuilder {
        CallerContextBuilder::default()
    }

    /// Caller without a token.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::builder().mode(PermissionMode::Anon).build()
    }

    #[must_use]
    pub fn user(subject_id: Uuid) -> Self {
        Self::builder()
            .subject_id(subject_id)
            .mode(PermissionMode::User)
            .build()
    }

    #[must_use]
    pub fn admin(subject_id: Uuid) -> Self {
        Self::builder()
            .subject_id(subject_id)
            .mode(PermissionMode::Admin)
            .build()
    }

    /// Trusted in-process caller (CLI, background jobs).
    #[must_use]
    pub fn internal() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn subject_id(&self) -> Option<Uuid> {
        self.subject_id
    }

    #[must_use]
    pub fn mode(&self) -> PermissionMode {
        self.mode
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.mode == PermissionMode::Admin
    }
}

#[derive(Default)]
pub struct CallerContextBuilder {
    subject_id: Option<Uuid>,
    mode: PermissionMode,
}

impl CallerContextBuilder {
    #[must_use]
    pub fn subject_id(mut self, subject_id: Uuid) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: PermissionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn build(self) -> CallerContext {
        CallerContext {
            subject_id: self.subject_id,
            mode: self.mode,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_modes() {
        let id = Uuid::new_v4();
        assert_eq!(CallerContext::anonymous().mode(), PermissionMode::Anon);
        assert_eq!(CallerContext::anonymous().subject_id(), None);
        assert_eq!(CallerContext::user(id).mode(), PermissionMode::User);
        assert_eq!(CallerContext::user(id).subject_id(), Some(id));
        assert!(CallerContext::admin(id).is_admin());
        assert_eq!(CallerContext::internal().mode(), PermissionMode::Anyone);
    }
}
