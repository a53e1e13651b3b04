// ==========================================
// GMAO 维护数据核心 - LLM 客户端
// ==========================================
// 协议: OpenAI 兼容 chat-completions（默认 Groq）
// 认证: 环境变量 GROQ_API_KEY
// ==========================================

use crate::analysis::error::{AnalysisError, AnalysisResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

pub const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

// ==========================================
// ChatCompletionClient Trait
// ==========================================
// 实现者: GroqClient（测试中使用桩实现）
#[async_trait]
pub trait ChatCompletionClient: Send + Sync {
    /// 发送请求, 返回第一条回复的原始文本
    async fn complete(&self, request: &ChatRequest) -> AnalysisResult<String>;
}

// ==========================================
// GroqClient
// ==========================================
pub struct GroqClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GroqClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// 从环境变量读取 API key
    pub fn from_env(endpoint: impl Into<String>) -> AnalysisResult<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AnalysisError::Llm(format!("variable d'environnement {} absente", API_KEY_ENV))
            })?;
        Ok(Self::new(endpoint, api_key))
    }
}

#[async_trait]
impl ChatCompletionClient for GroqClient {
    async fn complete(&self, request: &ChatRequest) -> AnalysisResult<String> {
        let body = json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
        });
        debug!(model = %request.model, endpoint = %self.endpoint, "发送 chat-completion 请求");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Llm(format!(
                "HTTP {} : {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let payload: Value = response.json().await?;
        extract_content(&payload)
    }
}

/// 取出 choices[0].message.content
pub fn extract_content(payload: &Value) -> AnalysisResult<String> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AnalysisError::Llm("réponse du modèle sans contenu".to_string()))
}
