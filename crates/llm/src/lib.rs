//! Generation backends for the grounded engine.
//!
//! A provider-agnostic `LlmClient` trait with Ollama and OpenAI-compatible
//! implementations, a tagged response content type, and a retry boundary
//! for transient failures.
//!
//! # Example
//! ```no_run
//! use grounded_llm::{create_client, LlmRequest, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("ollama", None, None, RetryPolicy::default())?;
//! let request = LlmRequest::new("Hello, world!", "llama3.2").with_temperature(0.0);
//! let response = client.complete(&request).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod retry;
pub mod types;

pub use client::{ContentPart, LlmClient, LlmRequest, LlmResponse, LlmUsage, ResponseContent};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
pub use retry::{RetryPolicy, RetryingClient};
pub use types::ProviderType;
