//! Retrieval-augmented assistant client (OpenAI Assistants v2).
//!
//! One-shot question flow: create thread, post the prompt, start a run,
//! poll the run until it completes, then read the latest assistant
//! message. The poll loop is capped; a run that never settles is an
//! error, not an infinite wait.

use anyhow::{anyhow, bail, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL_MS: u64 = 1500;
const DEFAULT_MAX_POLLS: usize = 40;

#[derive(Debug, Clone)]
pub struct AssistantClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    assistant_id: String,
    poll_interval: Duration,
    max_polls: usize,
}

impl AssistantClient {
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        assistant_id: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            assistant_id: assistant_id.into(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: usize) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    /// Run one prompt through the assistant and return its reply text.
    pub async fn ask(&self, prompt: &str) -> Result<String> {
        let thread_id = self.create_thread().await?;
        self.post_message(&thread_id, prompt).await?;
        let run_id = self.create_run(&thread_id).await?;
        self.wait_for_run(&thread_id, &run_id).await?;
        self.latest_assistant_text(&thread_id).await
    }

    async fn create_thread(&self) -> Result<String> {
        let resp: IdObject = self
            .post_json(&format!("{}/threads", self.api_base), serde_json::json!({}))
            .await?;
        Ok(resp.id)
    }

    async fn post_message(&self, thread_id: &str, prompt: &str) -> Result<()> {
        let _: IdObject = self
            .post_json(
                &format!("{}/threads/{}/messages", self.api_base, thread_id),
                serde_json::json!({"role": "user", "content": prompt}),
            )
            .await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str) -> Result<String> {
        let resp: RunObject = self
            .post_json(
                &format!("{}/threads/{}/runs", self.api_base, thread_id),
                serde_json::json!({"assistant_id": self.assistant_id}),
            )
            .await?;
        Ok(resp.id)
    }

    async fn wait_for_run(&self, thread_id: &str, run_id: &str) -> Result<()> {
        for _ in 0..self.max_polls {
            let run: RunObject = self
                .get_json(&format!(
                    "{}/threads/{}/runs/{}",
                    self.api_base, thread_id, run_id
                ))
                .await?;
            match run.status.as_str() {
                "completed" => return Ok(()),
                "failed" | "cancelled" | "expired" => {
                    bail!("assistant run ended with status: {}", run.status)
                }
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }
        bail!(
            "assistant run did not complete after {} polls",
            self.max_polls
        )
    }

    async fn latest_assistant_text(&self, thread_id: &str) -> Result<String> {
        let list: MessageList = self
            .get_json(&format!(
                "{}/threads/{}/messages?limit=1",
                self.api_base, thread_id
            ))
            .await?;
        let message = list
            .data
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("assistant thread has no messages"))?;
        let text = message
            .content
            .into_iter()
            .filter_map(|block| block.text.map(|t| t.value))
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            bail!("assistant reply contained no text");
        }
        Ok(text)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .json(&body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            bail!("assistant api error ({}): {}", status.as_u16(), text);
        }
        Ok(resp.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
struct ThreadMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<TextBlock>,
}

#[derive(Debug, Deserialize)]
struct TextBlock {
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn mount_thread_setup(server: &MockServer) -> impl std::future::Future<Output = ()> + '_ {
        async move {
            Mock::given(method("POST"))
                .and(path("/threads"))
                .and(header("OpenAI-Beta", "assistants=v2"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "th_1"})),
                )
                .mount(server)
                .await;
            Mock::given(method("POST"))
                .and(path("/threads/th_1/messages"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg_1"})),
                )
                .mount(server)
                .await;
            Mock::given(method("POST"))
                .and(path("/threads/th_1/runs"))
                .respond_with(ResponseTemplate::new(200).set_body_json(
                    serde_json::json!({"id": "run_1", "status": "queued"}),
                ))
                .mount(server)
                .await;
        }
    }

    #[tokio::test]
    async fn ask_returns_latest_assistant_text() {
        let server = MockServer::start().await;
        mount_thread_setup(&server).await;
        Mock::given(method("GET"))
            .and(path("/threads/th_1/runs/run_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"id": "run_1", "status": "completed"}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/threads/th_1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"content": [{"text": {"value": "{\"caso\": true}"}}]}]
            })))
            .mount(&server)
            .await;

        let client = AssistantClient::new("sk", server.uri(), "asst_1")
            .with_polling(Duration::from_millis(1), 5);
        let text = client.ask("genera un caso APS").await.unwrap();
        assert_eq!(text, "{\"caso\": true}");
    }

    #[tokio::test]
    async fn ask_fails_after_poll_cap() {
        let server = MockServer::start().await;
        mount_thread_setup(&server).await;
        Mock::given(method("GET"))
            .and(path("/threads/th_1/runs/run_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"id": "run_1", "status": "in_progress"}),
            ))
            .mount(&server)
            .await;

        let client = AssistantClient::new("sk", server.uri(), "asst_1")
            .with_polling(Duration::from_millis(1), 3);
        let err = client.ask("prompt").await.unwrap_err();
        assert!(err.to_string().contains("did not complete after 3 polls"));
    }

    #[tokio::test]
    async fn ask_fails_on_terminal_run_status() {
        let server = MockServer::start().await;
        mount_thread_setup(&server).await;
        Mock::given(method("GET"))
            .and(path("/threads/th_1/runs/run_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"id": "run_1", "status": "failed"}),
            ))
            .mount(&server)
            .await;

        let client = AssistantClient::new("sk", server.uri(), "asst_1")
            .with_polling(Duration::from_millis(1), 5);
        let err = client.ask("prompt").await.unwrap_err();
        assert!(err.to_string().contains("status: failed"));
    }
}
