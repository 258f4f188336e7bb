//! Generative-AI features: exposure advice, playlists and beach suggestions.

pub mod client;
pub mod retry;
pub mod types;

pub use client::GeminiClient;
pub use retry::RetryConfig;
pub use types::{BeachLocation, Song};
