use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("missing API key: set {0}")]
    MissingApiKey(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Gemini returned no text candidates")]
    EmptyResponse,

    #[error("failed to parse commands: {source}")]
    Parse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GeminiError {
    /// The unparsed model output, for errors that carry one.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            GeminiError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
