//! Cognosys - adaptive learning path core
//!
//! The pieces behind a self-paced learning platform:
//! - Learning path progression with forward-only module unlocking
//! - Lazily generated lesson content, cached on the path
//! - Quiz scoring and advisory assignment review
//! - XP rewards on first completion
//! - An LLM content provider with a deterministic offline substitute
//! - A searchable resource catalog and a topic explorer
//!
//! # Example
//!
//! ```ignore
//! use cognosys::{ContentService, LessonSession, OfflineProvider, ProgressionStore};
//! use cognosys::store::MemoryStorage;
//! use cognosys::types::Difficulty;
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = ContentService::offline(OfflineProvider::instant());
//!     let mut store = ProgressionStore::init(Box::new(MemoryStorage::new()));
//!     if let Some(path) = service.generate_learning_path("Rust", Difficulty::Beginner, None).await.ready() {
//!         store.create_path(path);
//!     }
//!     let mut session = LessonSession::new(std::time::Duration::from_secs(2));
//!     session.open_module(&mut store, &service, 0).await;
//!     session.complete_module(&mut store);
//! }
//! ```

pub mod types;
pub mod config;
pub mod security;
pub mod provider;
pub mod store;
pub mod session;
pub mod catalog;
pub mod explorer;
pub mod cli;

pub use config::Config;

pub use provider::{
    ContentProvider,
    ContentService,
    Generated,
    LiveProvider,
    OfflineProvider,
    ProviderError,
};

pub use store::{
    FileStorage,
    MemoryStorage,
    ProgressionStore,
    StatusChange,
    Storage,
    StorageError,
};

pub use session::{LessonSession, LoadState, QuizOutcome};
pub use catalog::{ResourceCatalog, ResourceFilter};
pub use explorer::TopicExplorer;

pub use security::{
    set_api_key,
    get_api_key,
    delete_api_key,
    has_api_key,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Adaptive learning path core", NAME, VERSION)
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char boundary
pub fn truncate_safe(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
