//! Cognosys - adaptive learning paths in the terminal
//!
//! Generates a curriculum, walks through lessons and quizzes, and tracks XP.

// Use the library crate for all modules
use cognosys::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (WARN level by default, use RUST_LOG=info for debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into())
        )
        .init();

    // Run CLI
    cli::run().await
}
