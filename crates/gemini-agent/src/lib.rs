//! `gemini-agent`: async Rust client for the Gemini REST API.
//!
//! Covers the two calls the dashboard needs: a plain text completion and a
//! "decompose this request into CLI commands" completion whose reply is
//! parsed into typed [`CommandStep`]s.
//!
//! # Architecture
//!
//! ```text
//! GeminiClientBuilder   ← api key, model, base url, timeout
//!     │
//!     ▼
//! GeminiClient          ← POST {base}/models/{model}:generateContent
//!     │                    x-goog-api-key header, JSON body
//!     ▼
//! GenerateResponse      ← candidates[0].content.parts[*].text
//!     │
//!     ▼
//! parse_commands        ← strips ``` fences, parses [{command, description}]
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use gemini_agent::GeminiClient;
//!
//! let client = GeminiClient::builder()
//!     .api_key(std::env::var("GEMINI_API_KEY")?)
//!     .build()?;
//!
//! let text = client.generate("Say hello").await?;
//! let steps = client.decompose("create a login page").await?;
//! ```

pub mod client;
pub mod decompose;
pub mod error;
pub mod types;


pub use client::{GeminiClient, GeminiClientBuilder, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use decompose::{decompose_prompt, parse_commands, strip_code_fences};
pub use error::GeminiError;
pub use types::{CommandStep, GenerateRequest, GenerateResponse};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, GeminiError>;
