mod admin;
mod auth;
mod dreams;
mod health;
mod reflections;
mod users;

pub use admin::{list_users, update_tier};
pub use auth::{demo, signin, signup};
pub use dreams::{create_dream, delete_dream, evolution_report, get_dream, list_dreams, update_dream};
pub use health::{health_check, readiness_check};
pub use reflections::{create_reflection, list_reflections};
pub use users::{me, usage};
