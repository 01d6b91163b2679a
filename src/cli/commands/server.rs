use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::utils::{output_fields, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health status from the API /api/health endpoint")]
    Health {
        #[arg(long, env = "CAMPUS_API_URL", default_value = "http://localhost:5000", help = "Server base URL")]
        url: String,
    },
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Health { url } => {
            let endpoint = format!("{}/api/health", url.trim_end_matches('/'));
            let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
            let response = client
                .get(&endpoint)
                .send()
                .await
                .with_context(|| format!("could not reach {}", endpoint))?;
            let status = response.status();
            let body: Value = response.json().await.unwrap_or(Value::Null);

            output_fields(
                output_format,
                &[
                    ("status", body["status"].as_str().unwrap_or("unknown").to_string()),
                    ("database", body["database"].as_str().unwrap_or("unknown").to_string()),
                    ("uptime", format!("{} s", body["uptime"].as_u64().unwrap_or(0))),
                ],
            );
            if !status.is_success() {
                return Err(anyhow!("{} answered {}", endpoint, status));
            }
            output_success(output_format, &format!("{} is healthy", url), Some(json!({ "health": body })))
        }
    }
}
