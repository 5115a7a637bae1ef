use serde::{Deserialize, Serialize};

/// Client for the text-generation capability. One request per question, no
/// internal retry; timeout policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct LlmProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl LlmProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            max_tokens: 1024,
        }
    }

    pub async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = MessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: 0.3,
            system: system.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(LlmError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let reply: MessageResponse = response.json().await.map_err(LlmError::Http)?;

        let mut text = String::new();
        for block in &reply.content {
            if block.block_type == "text" {
                text.push_str(&block.text);
            }
        }

        Ok(text)
    }
}

#[derive(Debug, Clone, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug)]
pub enum LlmError {
    Http(reqwest::Error),
    Api { status: reqwest::StatusCode, body: String },
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::Http(err) => write!(f, "HTTP error: {}", err),
            LlmError::Api { status, body } => write!(f, "API error {}: {}", status, body),
        }
    }
}

impl std::error::Error for LlmError {}
