//! Client construction for the OpenAI-compatible model API.

use crate::config::ModelSettings;
use crate::error::{AssistantError, Result};
use async_openai::{config::OpenAIConfig, Client};
use backoff::ExponentialBackoffBuilder;
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::warn;

/// Create a model API client from settings.
///
/// The API key is read once here. A missing key is not an error: every
/// request will then fail authentication and the failure surfaces per query.
///
/// Rate-limited requests are not retried; a 429 fails the query at once.
pub fn create_client(settings: &ModelSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = std::env::var(&settings.api_key_env).unwrap_or_else(|_| {
        warn!("{} is not set, model requests will be unauthenticated", settings.api_key_env);
        String::new()
    });

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .default_headers(attribution_headers(settings)?)
        .build()
        .map_err(|e| AssistantError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(&settings.api_base)
        .with_api_key(api_key);

    Ok(Client::with_config(config)
        .with_http_client(http_client)
        .with_backoff(no_retry()))
}

/// A backoff whose elapsed-time budget is already spent, so nothing is retried.
fn no_retry() -> backoff::ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// OpenRouter uses these to attribute requests to an application.
fn attribution_headers(settings: &ModelSettings) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some(referer) = &settings.referer {
        let value = HeaderValue::from_str(referer)
            .map_err(|e| AssistantError::Config(format!("Invalid referer header: {}", e)))?;
        headers.insert("http-referer", value);
    }
    if let Some(title) = &settings.app_title {
        let value = HeaderValue::from_str(title)
            .map_err(|e| AssistantError::Config(format!("Invalid title header: {}", e)))?;
        headers.insert("x-title", value);
    }
    Ok(headers)
}

/// Scripted OpenAI-compatible server for tests.
#[cfg(test)]
pub(crate) mod mock_server {
    use crate::config::ModelSettings;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// A canned HTTP reply: status code and JSON body.
    #[derive(Clone)]
    pub struct Reply {
        pub status: u16,
        pub body: Value,
    }

    impl Reply {
        /// A final assistant message with text content.
        pub fn text(content: &str) -> Self {
            Self::completion(json!({ "role": "assistant", "content": content }), "stop")
        }

        /// An assistant message asking for tool calls, given as `(name, arguments)`.
        pub fn tool_calls(calls: &[(&str, &str)]) -> Self {
            let calls: Vec<Value> = calls
                .iter()
                .enumerate()
                .map(|(i, (name, arguments))| {
                    json!({
                        "id": format!("call_{}", i),
                        "type": "function",
                        "function": { "name": name, "arguments": arguments }
                    })
                })
                .collect();
            Self::completion(
                json!({ "role": "assistant", "content": null, "tool_calls": calls }),
                "tool_calls",
            )
        }

        pub fn rate_limited() -> Self {
            Self {
                status: 429,
                body: json!({
                    "error": {
                        "message": "Rate limit exceeded",
                        "type": "rate_limit_exceeded",
                        "param": null,
                        "code": null
                    }
                }),
            }
        }

        fn completion(message: Value, finish_reason: &str) -> Self {
            Self {
                status: 200,
                body: json!({
                    "id": "chatcmpl-test",
                    "object": "chat.completion",
                    "created": 1_700_000_000u32,
                    "model": "test-model",
                    "choices": [{
                        "index": 0,
                        "message": message,
                        "finish_reason": finish_reason
                    }]
                }),
            }
        }
    }

    /// Serves replies in order; the last one repeats once the script runs out.
    pub struct MockServer {
        base: String,
        requests: Arc<Mutex<Vec<Value>>>,
    }

    impl MockServer {
        pub async fn start(script: Vec<Reply>) -> Self {
            assert!(!script.is_empty(), "script needs at least one reply");
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let requests = Arc::new(Mutex::new(Vec::new()));

            let recorded = requests.clone();
            tokio::spawn(async move {
                let mut served = 0;
                while let Ok((mut stream, _)) = listener.accept().await {
                    let Some(request) = read_request(&mut stream).await else {
                        continue;
                    };
                    // record before replying so every answered request is visible to the test
                    recorded.lock().unwrap().push(request);
                    let reply = &script[served.min(script.len() - 1)];
                    served += 1;
                    let _ = write_reply(&mut stream, reply).await;
                }
            });

            Self { base, requests }
        }

        /// Model settings pointing at this server.
        pub fn settings(&self) -> ModelSettings {
            ModelSettings {
                api_base: self.base.clone(),
                timeout_secs: 5,
                ..ModelSettings::default()
            }
        }

        /// JSON bodies of the requests received so far.
        pub fn requests(&self) -> Vec<Value> {
            self.requests.lock().unwrap().clone()
        }
    }

    /// Read one request and return its JSON body.
    async fn read_request(stream: &mut TcpStream) -> Option<Value> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        Some(serde_json::from_slice(&buf[header_end..]).unwrap_or(Value::Null))
    }

    /// Write the reply and close the connection.
    async fn write_reply(stream: &mut TcpStream, reply: &Reply) -> std::io::Result<()> {
        let body = reply.body.to_string();
        let reason = match reply.status {
            200 => "OK",
            429 => "Too Many Requests",
            _ => "Error",
        };
        let response = format!(
            "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            reply.status,
            reason,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::mock_server::{MockServer, Reply};
    use super::*;
    use crate::agent::{ChatModel, OpenAIChatModel};

    #[tokio::test]
    async fn test_rate_limited_request_is_sent_once() {
        let server = MockServer::start(vec![Reply::rate_limited(), Reply::text("too late")]).await;
        let client = create_client(&server.settings()).unwrap();
        let model = OpenAIChatModel::new(client, "test-model");

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            model.complete("You are terse.", "Hello"),
        )
        .await
        .expect("rate-limited request was retried");

        match result {
            Err(AssistantError::OpenAI(msg)) => assert!(msg.contains("Rate limit exceeded")),
            other => panic!("expected model API error, got {:?}", other),
        }
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_completion_sends_system_and_user() {
        let server = MockServer::start(vec![Reply::text("4")]).await;
        let client = create_client(&server.settings()).unwrap();
        let model = OpenAIChatModel::new(client, "test-model");

        assert_eq!(model.complete("You are a math assistant.", "2+2").await.unwrap(), "4");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let messages = &requests[0]["messages"];
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "You are a math assistant.");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "2+2");
    }

    #[test]
    fn test_attribution_headers() {
        let settings = ModelSettings::default();
        let headers = attribution_headers(&settings).unwrap();
        assert_eq!(headers.get("HTTP-Referer").unwrap(), "http://localhost");
        assert_eq!(headers.get("X-Title").unwrap(), "askbox");
    }

    #[test]
    fn test_attribution_headers_omitted() {
        let settings = ModelSettings {
            referer: None,
            app_title: None,
            ..ModelSettings::default()
        };
        assert!(attribution_headers(&settings).unwrap().is_empty());
    }
}
