use crate::errors::ServiceError;
use async_openai::{
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestMessageContentPart, ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionResponseStream,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrlArgs,
    },
    Client,
};
use serde::Deserialize;
use tracing::{error, instrument};

const CHAT_MODEL: &str = "gpt-4o-mini";
const VISION_MODEL: &str = "gpt-4o-mini";

/// One prior exchange in a chat conversation.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct ChatTurn {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
}

/// Wrapper around the completions API used for both label OCR and the
/// floor-assistant chat.
#[derive(Clone)]
pub struct LlmClient {
    client: Client<async_openai::config::OpenAIConfig>,
}

impl LlmClient {
    pub fn new(api_key: &str) -> Self {
        let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);
        Self { client }
    }

    /// Sends one image with an extraction prompt and parses the reply as
    /// JSON, tolerating markdown code fences around it.
    #[instrument(skip(self, system_prompt, image_data_url))]
    pub async fn extract_json(
        &self,
        system_prompt: &str,
        image_data_url: &str,
    ) -> Result<serde_json::Value, ServiceError> {
        let image_part = ChatCompletionRequestMessageContentPartImageArgs::default()
            .image_url(
                ImageUrlArgs::default()
                    .url(image_data_url)
                    .detail(ImageDetail::High)
                    .build()
                    .map_err(|e| ServiceError::ModelError(e.to_string()))?,
            )
            .build()
            .map_err(|e| ServiceError::ModelError(e.to_string()))?;
        let text_part = ChatCompletionRequestMessageContentPartTextArgs::default()
            .text("Extract the fields from this label photo.")
            .build()
            .map_err(|e| ServiceError::ModelError(e.to_string()))?;
        let parts: Vec<ChatCompletionRequestMessageContentPart> =
            vec![text_part.into(), image_part.into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(VISION_MODEL)
            .temperature(0.0)
            .max_tokens(300u32)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()
                    .map_err(|e| ServiceError::ModelError(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(parts)
                    .build()
                    .map_err(|e| ServiceError::ModelError(e.to_string()))?
                    .into(),
            ])
            .build()
            .map_err(|e| ServiceError::ModelError(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            error!("vision completion failed: {}", e);
            ServiceError::ModelError(e.to_string())
        })?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| ServiceError::ModelError("empty model reply".to_string()))?;

        let stripped = strip_code_fences(&content);
        serde_json::from_str(stripped)
            .map_err(|e| ServiceError::ModelError(format!("model reply was not JSON: {}", e)))
    }

    /// Opens a streaming completion. Chunks are forwarded to the caller as
    /// they arrive; dropping the stream aborts the upstream request.
    #[instrument(skip_all)]
    pub async fn stream_chat(
        &self,
        system_prompt: &str,
        turns: &[ChatTurn],
    ) -> Result<ChatCompletionResponseStream, ServiceError> {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(turns.len() + 1);
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| ServiceError::ModelError(e.to_string()))?
                .into(),
        );
        for turn in turns {
            let message: ChatCompletionRequestMessage = if turn.role == "assistant" {
                ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.content.clone())
                    .build()
                    .map_err(|e| ServiceError::ModelError(e.to_string()))?
                    .into()
            } else {
                ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.content.clone())
                    .build()
                    .map_err(|e| ServiceError::ModelError(e.to_string()))?
                    .into()
            };
            messages.push(message);
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(CHAT_MODEL)
            .temperature(0.4)
            .messages(messages)
            .build()
            .map_err(|e| ServiceError::ModelError(e.to_string()))?;

        self.client.chat().create_stream(request).await.map_err(|e| {
            error!("chat stream failed to open: {}", e);
            ServiceError::ModelError(e.to_string())
        })
    }
}

/// Drops a leading ```json / ``` fence pair if the model wrapped its reply.
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Keeps only ASCII digits, for fields OCR tends to decorate.
pub fn sanitize_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fenced_json() {
        assert_eq!(
            strip_code_fences("```json\n{\"a\": 1}\n```"),
            "{\"a\": 1}"
        );
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
    }

    #[test]
    fn sanitizes_decorated_numbers() {
        assert_eq!(sanitize_digits("Batch #12-34/5"), "12345");
        assert_eq!(sanitize_digits("no digits"), "");
    }
}
