use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ChatSettings;
use crate::error::FallbackError;
use crate::pipeline::FallbackModel;
use crate::prompts;

/// Azure OpenAI chat-completions client used as the escalation fallback.
///
/// The whole task rides in a single system message: the intent taxonomy plus
/// the rendered request. The model's reply is expected to be one intent name.
pub struct AzureChatClient {
    client: reqwest::Client,
    endpoint: String,
    deployment: String,
    api_version: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl AzureChatClient {
    pub fn new(settings: &ChatSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            deployment: settings.deployment.clone(),
            api_version: settings.api_version.clone(),
            api_key: settings.api_key.clone(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[async_trait]
impl FallbackModel for AzureChatClient {
    async fn llm_fallback(&self, text: &str) -> Result<String, FallbackError> {
        let request = ChatRequest {
            messages: vec![ChatMessage {
                role: "system",
                content: prompts::system_prompt(text),
            }],
        };

        let response = self
            .client
            .post(self.url())
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FallbackError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(FallbackError::EmptyCompletion)?;

        if content.trim().is_empty() {
            return Err(FallbackError::EmptyCompletion);
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_deployment_scoped() {
        let client = AzureChatClient::new(&ChatSettings {
            endpoint: "https://example.openai.azure.com".into(),
            api_key: "test-key".into(),
            api_version: "2024-02-01".into(),
            deployment: "gpt-4o-mini".into(),
        });
        assert_eq!(
            client.url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o-mini/chat/completions?api-version=2024-02-01"
        );
    }

    #[test]
    fn completion_content_deserializes() {
        let raw = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "general_question"}, "finish_reason": "stop"}
            ],
            "model": "gpt-4o-mini"
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "general_question");
    }
}
