//! # Mirror of Dreams API
//!
//! Journaling service for dreams and reflections, built around a
//! composable authorization chain:
//!
//! - **Procedures**: every endpoint declares its access contract by taking
//!   a procedure extractor (`Protected`, `Write`, `UsageLimited`, `Premium`,
//!   `Creator`)
//! - **Usage limits**: a per-tier monthly reflection ceiling, enforced by a
//!   guard and re-checked atomically when the reflection is stored
//! - **Observability**: request ids, structured logging, Prometheus counters
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layers (Request ID → Trace → CORS → Body Limit)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Procedure extractors (guards: authed, role, tier, quota)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (auth, users, dreams, reflections, admin)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Services (AuthService, JournalService)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Store (in-memory, RwLock)                                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mirror_of_dreams::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let state = AppState::new(config)?;
//!     state.initialize_defaults().await?;
//!
//!     let app = build_router(state);
//!
//!     // Start the server...
//!     Ok(())
//! }
//! ```
//!
//! ## Usage Limits
//!
//! ```bash
//! TIER_LIMIT_FREE=5 TIER_LIMIT_ESSENTIAL=20 TIER_LIMIT_PREMIUM=unlimited cargo run
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod limits;
pub mod metrics;
pub mod models;
pub mod procedures;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use limits::{MonthlyLimit, TierLimits};
pub use routes::build_router;
pub use state::AppState;
