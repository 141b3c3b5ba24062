//! Axum extractors that build the call context and run a procedure.
//!
//! A handler declares its access contract by taking one of the procedure
//! extractors as an argument:
//!
//! ```rust,ignore
//! async fn create_dream(
//!     Write(ctx): Write,
//!     State(state): State<AppState>,
//!     AppJson(body): AppJson<CreateDreamRequest>,
//! ) -> AppResult<Json<Dream>> {
//!     // Only runs for signed-in, non-demo users
//! }
//! ```

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

use super::context::CallContext;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Resolves the bearer token on the request to a user.
///
/// A missing, malformed, expired or orphaned token yields an anonymous
/// context rather than an error: deciding whether that is acceptable is
/// the guards' job. The result is cached in the request extensions.
impl FromRequestParts<AppState> for CallContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<CallContext>() {
            return Ok(ctx.clone());
        }

        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let user = match token {
            None => None,
            Some(token) => match state.tokens.verify(token) {
                Ok(claims) => {
                    let user = state.store.user_by_id(claims.sub).await;
                    if user.is_none() {
                        debug!(user_id = %claims.sub, "Session token refers to unknown user");
                    }
                    user.map(Arc::new)
                }
                Err(e) => {
                    debug!(error = %e, "Ignoring invalid session token");
                    None
                }
            },
        };

        let ctx = CallContext { user, request_id };
        parts.extensions.insert(ctx.clone());
        Ok(ctx)
    }
}

/// Defines an extractor that admits the call only if the named procedure does.
macro_rules! procedure_extractor {
    ($(#[$meta:meta])* $name:ident, $procedure:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::procedures::AuthedContext);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = $crate::error::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let ctx = CallContext::from_request_parts(parts, state).await?;
                state.procedures.$procedure.authorize(&ctx).map($name)
            }
        }
    };
}

procedure_extractor!(
    /// Any signed-in user.
    Protected,
    protected
);
procedure_extractor!(
    /// Creators and admins.
    Creator,
    creator
);
procedure_extractor!(
    /// Paid tiers, creators and admins.
    Premium,
    premium
);
procedure_extractor!(
    /// Signed-in users with reflections left this month.
    UsageLimited,
    usage_limited
);
procedure_extractor!(
    /// Signed-in users who are not on a demo account.
    Write,
    write
);
