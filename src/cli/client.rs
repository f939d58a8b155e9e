use anyhow::{anyhow, Context};
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// Thin HTTP client over the API envelope: returns `data` on success and turns
/// error bodies into `anyhow` errors carrying the server message and code.
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base).with_context(|| format!("invalid server URL '{}'", base))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(anyhow!("server URL must use http or https, got '{}'", base.scheme()));
        }
        Ok(Self {
            base,
            http: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("cannot build URL for {}", path))
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        let response = self.http.get(self.url(path)?).send().await?;
        Self::unwrap(response).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        let response = self.http.post(self.url(path)?).json(body).send().await?;
        Self::unwrap(response).await
    }

    async fn unwrap(response: Response) -> anyhow::Result<Value> {
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let body: Value = response
            .json()
            .await
            .with_context(|| format!("server answered {} with a non-JSON body", status))?;
        if status.is_success() {
            return Ok(body.get("data").cloned().unwrap_or(Value::Null));
        }

        let message = body
            .get("message")
            .or_else(|| body.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("request failed");
        match body.get("code").and_then(Value::as_str) {
            Some(code) => Err(anyhow!("{} ({}, HTTP {})", message, code, status.as_u16())),
            None => Err(anyhow!("{} (HTTP {})", message, status.as_u16())),
        }
    }
}
