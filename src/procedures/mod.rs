//! Authorization procedures: guards composed into named pipelines.
//!
//! # Architecture
//!
//! ```text
//! Request → CallContext (bearer token → user | none)
//!              │
//!              ▼
//!        Procedure guards, in order ── first failure ──→ 401 UNAUTHENTICATED
//!              │                                        403 FORBIDDEN
//!              ▼
//!        AuthedContext → Handler
//! ```
//!
//! - [`guards`]: the five guard functions and the [`Guard`] pipeline step
//! - [`Procedures`]: `protected`, `creator`, `premium`, `usage_limited`, `write`
//! - Extractors ([`Protected`], [`Creator`], [`Premium`], [`UsageLimited`],
//!   [`Write`]) that run a procedure before an Axum handler

mod context;
mod extract;
pub mod guards;
mod procedure;

pub use context::{AuthedContext, CallContext};
pub use extract::{Creator, Premium, Protected, UsageLimited, Write};
pub use guards::Guard;
pub use procedure::{Procedure, Procedures};
