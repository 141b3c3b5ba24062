use std::sync::Arc;

use crate::models::User;

/// Per-call context handed to the procedure guards.
///
/// `user` is `None` when the request carried no valid session. The guards
/// only read this value; it is never mutated once built.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub user: Option<Arc<User>>,
    pub request_id: Option<String>,
}

impl CallContext {
    /// Context for a request with no resolvable user.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: impl Into<Arc<User>>) -> Self {
        Self {
            user: Some(user.into()),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Context produced once every guard of a procedure has passed.
///
/// Carries the same `Arc<User>` as the originating [`CallContext`], so the
/// handler sees exactly the record the guards judged.
#[derive(Debug, Clone)]
pub struct AuthedContext {
    pub user: Arc<User>,
    pub request_id: Option<String>,
}

impl AuthedContext {
    pub fn user(&self) -> &User {
        &self.user
    }
}
