use serde::{Deserialize, Serialize};

/// Caller-facing generation options, shared by both providers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    /// System instruction placed ahead of the prompt
    pub system: Option<String>,

    /// Temperature (0.0 - 1.0)
    pub temperature: Option<f32>,

    /// Top-p sampling
    pub top_p: Option<f32>,

    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Ask for structured JSON output where the provider supports it
    pub json: bool,
}

impl GenerateOptions {
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn json_mode(mut self) -> Self {
        self.json = true;
        self
    }
}

// ---------------------------------------------------------------------------
// Native (Ollama) wire format
// ---------------------------------------------------------------------------

/// Ollama generate request
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Model name (e.g., "llama3.2", "gpt-oss:20b")
    pub model: String,

    /// Prompt text
    pub prompt: String,

    /// System instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Structured output mode ("json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Disable streaming
    pub stream: bool,

    /// Sampling options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

impl GenerateRequest {
    pub fn new(model: &str, prompt: &str, options: &GenerateOptions) -> Self {
        let sampling = OllamaOptions {
            temperature: options.temperature,
            top_p: options.top_p,
            num_predict: options.max_tokens.map(|n| n as i32),
        };
        Self {
            model: model.to_string(),
            prompt: prompt.to_string(),
            system: options.system.clone(),
            format: options.json.then(|| "json".to_string()),
            stream: false,
            options: (!sampling.is_empty()).then_some(sampling),
        }
    }
}

/// Ollama sampling options
#[derive(Debug, Clone, Serialize, Default)]
pub struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

impl OllamaOptions {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.top_p.is_none() && self.num_predict.is_none()
    }
}

/// Ollama generate response
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    /// Generated text
    pub response: String,
}

/// Ollama embedding request
#[derive(Debug, Clone, Serialize)]
pub struct EmbedRequest {
    pub model: String,
    pub prompt: String,
}

/// Ollama embedding response
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
}

/// Ollama `/api/tags` response
#[derive(Debug, Clone, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<TagEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagEntry {
    pub name: String,
}

// ---------------------------------------------------------------------------
// OpenAI-compatible (LM Studio) wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// `/v1/chat/completions` request
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    pub stream: bool,
}

impl ChatCompletionRequest {
    pub fn new(model: &str, prompt: &str, options: &GenerateOptions) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &options.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(prompt));

        Self {
            model: model.to_string(),
            messages,
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
            stream: false,
        }
    }
}

/// `/v1/chat/completions` or `/v1/completions` response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// A completion choice carries either a chat message or legacy text
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChatMessage>,

    #[serde(default)]
    pub text: Option<String>,
}

impl Choice {
    pub fn into_text(self) -> Option<String> {
        self.message.map(|m| m.content).or(self.text)
    }
}

/// `/v1/embeddings` request
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingsRequest {
    pub model: String,
    pub input: Vec<String>,
}

/// `/v1/embeddings` response
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsResponse {
    #[serde(default)]
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,

    #[serde(default)]
    pub index: Option<usize>,
}

/// `/v1/models` response
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsResponse {
    #[serde(default)]
    pub data: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_ollama_request_shape() {
        let options = GenerateOptions::default()
            .with_system("be brief")
            .with_temperature(0.5)
            .json_mode();
        let request = GenerateRequest::new("llama3.2", "hello", &options);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "llama3.2",
                "prompt": "hello",
                "system": "be brief",
                "format": "json",
                "stream": false,
                "options": { "temperature": 0.5 }
            })
        );
    }

    #[test]
    fn test_ollama_request_omits_empty_options() {
        let request = GenerateRequest::new("m", "p", &GenerateOptions::default());
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("options").is_none());
        assert!(value.get("format").is_none());
        assert!(value.get("system").is_none());
    }

    #[test]
    fn test_chat_request_shape() {
        let options = GenerateOptions::default().with_system("sys").with_max_tokens(200);
        let request = ChatCompletionRequest::new("local-model", "hi", &options);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "local-model",
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "hi" }
                ],
                "max_tokens": 200,
                "stream": false
            })
        );
    }

    #[test]
    fn test_choice_text_variants() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"chat"}},{"text":"legacy"}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let texts: Vec<_> = response.choices.into_iter().map(Choice::into_text).collect();
        assert_eq!(texts, vec![Some("chat".to_string()), Some("legacy".to_string())]);
    }

    #[test]
    fn test_model_listing_bodies() {
        let tags: TagsResponse =
            serde_json::from_str(r#"{"models":[{"name":"llama3.2:latest","size":1},{"name":"nomic-embed-text"}]}"#)
                .unwrap();
        assert_eq!(tags.models[0].name, "llama3.2:latest");

        let models: ModelsResponse =
            serde_json::from_str(r#"{"object":"list","data":[{"id":"qwen2.5-7b-instruct","object":"model"}]}"#)
                .unwrap();
        assert_eq!(models.data[0].id, "qwen2.5-7b-instruct");
    }
}
