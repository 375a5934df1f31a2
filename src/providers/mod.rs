//! Provider module for Flashtutor
//!
//! This module contains the model provider abstraction and the Anthropic
//! implementation.

pub mod anthropic;
pub mod base;

pub use anthropic::AnthropicProvider;
pub use base::{
    CompletionRequest, CompletionResponse, ContentBlock, Message, Provider, Role, TokenUsage,
};

use crate::config::ProviderConfig;
use crate::error::{FlashtutorError, Result};
use std::sync::Arc;

/// Create a provider instance based on configuration
///
/// Called once at startup; the returned handle is shared by every request.
///
/// # Errors
///
/// Returns error if the provider type is unknown or its credentials are
/// missing
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
    match config.provider_type.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicProvider::new(
            config.anthropic.clone(),
        )?)),
        other => Err(FlashtutorError::Config(format!("Unknown provider type: {}", other)).into()),
    }
}
