//! Error types shared by the generation client, rasterizer and pipeline.

/// Failures produced while talking to the generative API or preparing its
/// payloads.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The text response could not be read as an SVG drawing.
    #[error("response did not contain a valid <svg> drawing")]
    InvalidDrawing,

    /// The call succeeded but carried no inline image part.
    #[error("no image returned for {context}")]
    NoImageReturned {
        /// What was being generated when the image went missing.
        context: String,
    },

    /// The structured layout call returned an empty body.
    #[error("no layout generated")]
    NoLayout,

    /// The structured layout body was not the expected JSON shape.
    #[error("layout response is not valid JSON: {0}")]
    LayoutParse(#[from] serde_json::Error),

    /// Local SVG decode or PNG encode failed.
    #[error("rasterization failed: {0}")]
    Rasterization(String),

    /// Connection level failure talking to the API.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("api returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,
}

impl GenerationError {
    /// Whether the failure is a network fault worth one more attempt.
    ///
    /// Application level failures (no image, bad drawing, bad layout) point at
    /// the prompt or the model and are never retried.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Transport(_) | GenerationError::Timeout => true,
            GenerationError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::Transport(e)
        }
    }
}

/// Problems loading [`Config`](crate::Config).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing credential: set GEMINI_API_KEY or pass --api-key")]
    MissingCredential,

    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_faults_are_transient() {
        assert!(GenerationError::Timeout.is_transient());
        assert!(
            GenerationError::Api {
                status: 503,
                message: "overloaded".into()
            }
            .is_transient()
        );
        assert!(
            GenerationError::Api {
                status: 429,
                message: "slow down".into()
            }
            .is_transient()
        );
        assert!(
            !GenerationError::Api {
                status: 400,
                message: "bad".into()
            }
            .is_transient()
        );
        assert!(
            !GenerationError::NoImageReturned {
                context: "Isometric View".into()
            }
            .is_transient()
        );
        assert!(!GenerationError::InvalidDrawing.is_transient());
        assert!(!GenerationError::NoLayout.is_transient());
    }
}
