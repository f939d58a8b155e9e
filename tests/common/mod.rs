#![allow(dead_code)]

use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// Server process fed through a stdin pipe. It shuts down when the pipe closes, which
/// happens at the latest when the test binary exits.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl TestServer {
    pub fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_reciapp-api-rust"));
        cmd.env("PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("STORE_BACKEND", "memory")
            .env(
                "STORE_FIXTURES",
                concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/seed.yaml"),
            )
            .env("TIMEZONE", "America/Argentina/Buenos_Aires")
            .env("HOURS_OFFSET", "24")
            .env("DAYS_OFFSET", "7")
            .env("RUST_LOG", "warn")
            .env("SERVER_EXIT_ON_STDIN_CLOSE", "true")
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = cmd.spawn().context("failed to spawn server binary")?;
        let stdin = child.stdin.take();

        Ok(Self {
            port,
            base_url,
            child,
            stdin,
        })
    }

    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Close the pipe and wait for the process to exit on its own
    pub async fn stop(&mut self, timeout: Duration) -> Result<ExitStatus> {
        drop(self.stdin.take());
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() > deadline {
                self.child.kill()?;
                anyhow::bail!("server on {} still running after {:?}", self.base_url, timeout);
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Status plus parsed body; `Value::Null` for empty bodies
pub async fn read(response: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok((status, Value::Null));
    }
    Ok((status, serde_json::from_slice(&bytes)?))
}

pub async fn get(server: &TestServer, path: &str) -> Result<(StatusCode, Value)> {
    let response = reqwest::Client::new().get(server.url(path)).send().await?;
    read(response).await
}

pub async fn post(server: &TestServer, path: &str, body: Value) -> Result<(StatusCode, Value)> {
    let response = reqwest::Client::new().post(server.url(path)).json(&body).send().await?;
    read(response).await
}

pub fn ids(items: &Value) -> Vec<String> {
    items
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
