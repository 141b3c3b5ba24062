mod api;
mod journal;
mod user;

pub use api::{
    AuthResponse, CreateDreamRequest, CreateReflectionRequest, HealthResponse,
    ListReflectionsQuery, SignInRequest, SignUpRequest, UpdateDreamRequest, UpdateTierRequest,
    UsageResponse,
};
pub use journal::{
    Dream, DreamCategory, DreamStatus, EvolutionReport, Reflection, ReflectionAnswers, Tone,
};
pub use user::{Tier, User, UserProfile};
