use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "trigger")]
#[command(about = "POST an empty JSON payload to a deployed weather-etl endpoint")]
struct Args {
    /// Endpoint that starts the ETL job
    #[arg(short, long, env = "WEATHER_ETL_URL")]
    url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 900)]
    timeout: u64,
}

struct TriggerResponse {
    status: reqwest::StatusCode,
    body: String,
}

async fn trigger(url: &str, timeout: Duration) -> Result<TriggerResponse> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .post(url)
        .json(&serde_json::json!({}))
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .context("Failed to read response body")?;

    Ok(TriggerResponse { status, body })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let response = trigger(&args.url, Duration::from_secs(args.timeout)).await?;
    println!("Status Code: {}", response.status.as_u16());
    println!("Response: {}", response.body);

    if !response.status.is_success() {
        anyhow::bail!("ETL endpoint returned {}", response.status);
    }
    Ok(())
}
