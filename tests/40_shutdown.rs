mod common;

use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn server_exits_when_stdin_closes() -> Result<()> {
    let mut server = common::TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;

    let (status, _) = common::get(&server, "/health").await?;
    assert_eq!(status, StatusCode::OK);

    let exit = server.stop(Duration::from_secs(10)).await?;
    assert!(exit.success(), "server exited with {}", exit);

    // nothing is listening on the port any more
    let refused = reqwest::Client::new().get(server.url("/health")).send().await;
    assert!(refused.is_err());
    Ok(())
}
