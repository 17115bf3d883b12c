use anyhow::{bail, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
struct GenerateRequest {
    query: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// HTTP client for the learning platform's code-generation endpoint.
#[derive(Clone)]
pub struct AssistantClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl AssistantClient {
    pub fn new(base_url: &str, api_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    /// `POST /api/llm/generate-code/` with `{"query": ...}`, expecting
    /// `{"response": ...}`. An empty response body counts as a failure.
    pub async fn generate(&self, query: &str) -> Result<String> {
        let url = format!("{}/api/llm/generate-code/", self.base_url);
        debug!(%url, "sending assistant query");

        let mut request = self.client.post(&url).json(&GenerateRequest {
            query: query.to_string(),
        });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            bail!("assistant request failed with status {}", response.status());
        }

        let body: GenerateResponse = response.json().await?;
        if body.response.trim().is_empty() {
            bail!("assistant returned an empty response");
        }
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP server answering the next request with `status` and
    /// `body`, returning its base URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn response_text_is_returned() {
        let base = serve_once("200 OK", r#"{"response": "use sorted(xs)"}"#).await;
        let client = AssistantClient::new(&base, None);
        assert_eq!(
            client.generate("how do I sort a list?").await.unwrap(),
            "use sorted(xs)"
        );
    }

    #[tokio::test]
    async fn empty_response_body_is_a_failure() {
        let base = serve_once("200 OK", r#"{"response": ""}"#).await;
        let client = AssistantClient::new(&base, None);
        let err = client.generate("anything").await.unwrap_err();
        assert!(err.to_string().contains("empty response"));
    }

    #[tokio::test]
    async fn whitespace_only_response_is_a_failure() {
        let base = serve_once("200 OK", r#"{"response": "  \n "}"#).await;
        let client = AssistantClient::new(&base, None);
        assert!(client.generate("anything").await.is_err());
    }

    #[tokio::test]
    async fn non_success_status_is_a_failure() {
        let base = serve_once("500 Internal Server Error", "{}").await;
        let client = AssistantClient::new(&base, None);
        let err = client.generate("anything").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
