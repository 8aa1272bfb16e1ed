use serde::Serialize;

use super::LlmError;

/// Seam for the external language-model collaborator.
///
/// One formatted prompt in, free-form response text out. The response is
/// returned verbatim — envelope unwrapping and JSON recovery belong to the
/// response sieve, not the transport.
pub trait LlmClient {
    fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Request body for an OpenAI-style chat completion endpoint.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Blocking HTTP client for a chat-completion LLM endpoint.
///
/// The raw response body (including the provider envelope) is what callers
/// get back; it is persisted as the raw model artifact before any parsing.
pub struct HttpLlmClient {
    url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpLlmClient {
    pub fn new(
        url: &str,
        model: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpClient(e.to_string()))?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            client,
            timeout_secs,
        })
    }
}

impl LlmClient for HttpLlmClient {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        if prompt.trim().is_empty() {
            return Err(LlmError::EmptyInput);
        }

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| {
            if e.is_connect() {
                LlmError::Connection(self.url.clone())
            } else if e.is_timeout() {
                LlmError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
            } else {
                LlmError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| LlmError::HttpClient(e.to_string()))?;

        if !status.is_success() {
            return Err(LlmError::Endpoint {
                status: status.as_u16(),
                body: text,
            });
        }

        tracing::debug!(model = %self.model, bytes = text.len(), "LLM response received");
        Ok(text)
    }
}

/// LLM client returning a configured response, for agent and pipeline tests.
pub struct MockLlmClient {
    response: String,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl LlmClient for MockLlmClient {
    fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Ok(self.response.clone())
    }
}
