mod auth;
mod journal;

pub use auth::AuthService;
pub use journal::JournalService;
