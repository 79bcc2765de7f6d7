use crate::chat::model::AiModel;
use crate::error::ChatError;
use async_trait::async_trait;
use std::sync::Arc;

/// Sends one user turn to a completion endpoint and returns the reply text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        model: &AiModel,
        system_prompt: &str,
        text: &str,
    ) -> Result<String, ChatError>;
}

#[async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for Arc<T> {
    async fn complete(
        &self,
        model: &AiModel,
        system_prompt: &str,
        text: &str,
    ) -> Result<String, ChatError> {
        (**self).complete(model, system_prompt, text).await
    }
}
