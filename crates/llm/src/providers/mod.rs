//! Generation backend implementations.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use grounded_core::AppError;
use reqwest::StatusCode;

/// Map a non-success HTTP status onto the shared error taxonomy.
pub fn map_http_error(provider: &str, status: StatusCode, body: &str) -> AppError {
    match status.as_u16() {
        401 | 403 => {
            tracing::debug!(provider, body = %body, "Authentication failed ({})", status);
            AppError::FatalConfig(format!(
                "{} rejected the credentials ({}); check the API key",
                provider, status
            ))
        }
        404 => AppError::FatalConfig(format!(
            "{} does not know the requested model or route ({}): {}",
            provider, status, body
        )),
        408 | 429 => AppError::BackendTransient(format!("{} ({}): {}", provider, status, body)),
        s if s >= 500 => {
            AppError::BackendTransient(format!("{} server error ({}): {}", provider, status, body))
        }
        _ => AppError::Llm(format!("{} API error ({}): {}", provider, status, body)),
    }
}

/// Transport-level failures (connect, timeout, reset) are always transient.
pub fn map_transport_error(provider: &str, err: reqwest::Error) -> AppError {
    AppError::BackendTransient(format!("Failed to reach {}: {}", provider, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failures_are_fatal() {
        let err = map_http_error("groq", StatusCode::UNAUTHORIZED, "invalid key");
        assert!(matches!(err, AppError::FatalConfig(_)));

        let err = map_http_error("groq", StatusCode::FORBIDDEN, "");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_rate_limit_and_server_errors_are_transient() {
        let err = map_http_error("groq", StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(matches!(err, AppError::BackendTransient(_)));

        let err = map_http_error("ollama", StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_client_errors() {
        let err = map_http_error("openai", StatusCode::BAD_REQUEST, "bad json");
        assert!(matches!(err, AppError::Llm(_)));
        assert!(!err.is_retryable());
    }
}
