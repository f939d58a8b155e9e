use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::utils::{field, output_success};
use crate::cli::OutputFormat;

pub async fn handle(client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let data = client.get("/health").await?;
    output_success(
        &output_format,
        &format!("{} is {} (store {})", client.url("/")?, field(&data, "status"), field(&data, "store")),
        Some(json!({ "health": data })),
    )
}
