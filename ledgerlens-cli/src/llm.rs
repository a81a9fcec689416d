use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use ledgerlens_core::Model;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{LlmSection, Provider};

#[derive(Debug, Clone, Serialize)]
struct Msg<'a> {
    role: &'static str,
    content: &'a str,
}

fn messages<'a>(system: &'a str, user: &'a str) -> Vec<Msg<'a>> {
    vec![
        Msg {
            role: "system",
            content: system,
        },
        Msg {
            role: "user",
            content: user,
        },
    ]
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("build http client")
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Ollama `/api/chat`, non-streaming
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    url: String,
    model: String,
    temperature: f64,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, temperature: f64, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            url: endpoint(base_url, "/api/chat"),
            model: model.to_string(),
            temperature,
        })
    }
}

#[async_trait]
impl Model for OllamaClient {
    async fn invoke(&self, user: &str, system: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Options {
            temperature: f64,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            stream: bool,
            options: Options,
        }

        #[derive(Deserialize)]
        struct Resp {
            message: Option<MsgOut>,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.model,
            messages: messages(system, user),
            stream: false,
            options: Options {
                temperature: self.temperature,
            },
        };

        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .context("ollama request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("ollama error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse ollama response")?;
        Ok(out
            .message
            .and_then(|m| m.content)
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

/// Any OpenAI-compatible `/v1/chat/completions` endpoint
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    url: String,
    model: String,
    temperature: f64,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        temperature: f64,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            url: endpoint(base_url, "/v1/chat/completions"),
            model: model.to_string(),
            temperature,
            api_key,
        })
    }
}

#[async_trait]
impl Model for OpenAiClient {
    async fn invoke(&self, user: &str, system: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f64,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.model,
            messages: messages(system, user),
            temperature: self.temperature,
        };

        let mut req = self.http.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header(AUTHORIZATION, format!("Bearer {key}"));
        }
        let resp = req.send().await.context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("openai error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse openai response")?;
        let content = out
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}

/// Build the configured client behind the `Model` seam
pub fn build_model(cfg: &LlmSection) -> Result<Arc<dyn Model>> {
    let timeout = Duration::from_secs(cfg.request_timeout_secs.max(1));
    let model: Arc<dyn Model> = match cfg.provider {
        Provider::Ollama => Arc::new(OllamaClient::new(&cfg.base_url, &cfg.model, cfg.temperature, timeout)?),
        Provider::OpenAi => Arc::new(OpenAiClient::new(
            &cfg.base_url,
            &cfg.model,
            cfg.temperature,
            cfg.api_key.clone(),
            timeout,
        )?),
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_ollama_chat() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/chat")
                    .json_body_partial(r#"{"model": "gemma3:latest", "stream": false}"#)
                    .body_contains("You categorise")
                    .body_contains("Categorise this transaction");
                then.status(200).json_body(json!({
                    "model": "gemma3:latest",
                    "message": {"role": "assistant", "content": "  {\"category\": \"Fuel\"}\n"},
                    "done": true
                }));
            })
            .await;

        let client = OllamaClient::new(&server.base_url(), "gemma3:latest", 0.1, TIMEOUT).unwrap();
        let reply = client
            .invoke("Categorise this transaction: petrol", "You categorise bank transactions")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "{\"category\": \"Fuel\"}");
    }

    #[tokio::test]
    async fn test_ollama_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(404).body("model 'missing' not found");
            })
            .await;

        let client = OllamaClient::new(&server.base_url(), "missing", 0.1, TIMEOUT).unwrap();
        let err = client.invoke("hi", "sys").await.unwrap_err();
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_openai_chat_with_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .json_body_partial(r#"{"model": "gpt-4o-mini"}"#);
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "Mostly travel."}}]
                }));
            })
            .await;

        let client = OpenAiClient::new(
            &format!("{}/", server.base_url()),
            "gpt-4o-mini",
            0.1,
            Some("sk-test".to_string()),
            TIMEOUT,
        )
        .unwrap();
        let reply = client.invoke("Where did my money go?", "You are a helpful financial assistant").await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "Mostly travel.");
    }

    #[tokio::test]
    async fn test_connection_refused_is_error() {
        // nothing listens on port 9 locally
        let client = OllamaClient::new("http://127.0.0.1:9", "gemma3:latest", 0.1, TIMEOUT).unwrap();
        assert!(client.invoke("hi", "sys").await.is_err());
    }

    #[tokio::test]
    async fn test_build_model_from_config() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(200).json_body(json!({"message": {"role": "assistant", "content": "ok"}}));
            })
            .await;

        let cfg = LlmSection {
            base_url: server.base_url(),
            ..LlmSection::default()
        };
        let model = build_model(&cfg).unwrap();
        assert_eq!(model.invoke("ping", "sys").await.unwrap(), "ok");
    }

    #[test]
    fn test_endpoint_join() {
        assert_eq!(endpoint("http://localhost:11434/", "/api/chat"), "http://localhost:11434/api/chat");
        assert_eq!(endpoint("http://localhost:11434", "/api/chat"), "http://localhost:11434/api/chat");
    }
}
