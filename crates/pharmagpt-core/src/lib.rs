pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod relevance;
pub mod sanitizer;
pub mod scroll;
pub mod state;

// Re-export main types for convenience
pub use client::{PharmaBackend, PharmaClient};
pub use config::{Config, ConfigSource, ResolvedConfig, DEFAULT_BASE_URL};
pub use error::{RequestError, SubmitError};
pub use models::{
    ChatRequest, ChatResponse, HistoryEntry, Message, Role, SearchRequest, SearchResult, Source,
};
pub use orchestrator::{ChatFlight, RequestOrchestrator, SearchFlight, SEARCH_TOP_K};
pub use relevance::Relevance;
pub use sanitizer::sanitize;
pub use scroll::{ScrollBehavior, ScrollFollower, ScrollTarget};
pub use state::{SearchStore, SessionEvent, SessionState, SessionStore, SubscriptionId};
