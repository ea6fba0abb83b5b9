//! ODPT client error types.

/// Errors from the ODPT HTTP gateway.
#[derive(Debug, thiserror::Error)]
pub enum OdptError {
    /// No consumer key is configured; no request was attempted.
    #[error("ODPT consumer key is not configured (set ODPT_TOKEN)")]
    MissingCredential,

    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limited and the retry budget was exhausted.
    #[error("rate limited by ODPT API ({attempts} attempts)")]
    RateLimitExhausted { attempts: u32 },

    /// API returned an error status code.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON.
    #[error("JSON parse error: {message}")]
    Json { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = OdptError::RateLimitExhausted { attempts: 5 };
        assert_eq!(err.to_string(), "rate limited by ODPT API (5 attempts)");

        let err = OdptError::Api {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "API error 500: Internal Server Error");

        assert!(
            OdptError::MissingCredential
                .to_string()
                .contains("ODPT_TOKEN")
        );
    }
}
