//! Stdio entry point for the Linear release plugin.
//!
//! The host invokes the binary with a mode argument, writes a JSON
//! payload to stdin, and reads a JSON response from stdout. Logs go to
//! stderr so stdout stays machine-parseable.

use std::io::Read;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use release_hooks::ExecuteRequest;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("linear_release=info")),
        )
        .init();

    let mode = std::env::args().nth(1).unwrap_or_else(|| "execute".to_string());

    let output = match mode.as_str() {
        "info" => serde_json::to_string_pretty(&linear_release::plugin_info())?,
        "validate" => {
            let config: Map<String, Value> =
                serde_json::from_str(&read_stdin()?).context("invalid configuration payload")?;
            let response = linear_release::validate(&config).await;
            serde_json::to_string_pretty(&response)?
        }
        "execute" => {
            let request: ExecuteRequest =
                serde_json::from_str(&read_stdin()?).context("invalid execute payload")?;
            let response = linear_release::execute(&request).await;
            serde_json::to_string_pretty(&response)?
        }
        other => anyhow::bail!("unknown mode '{other}' (expected info, validate, or execute)"),
    };

    println!("{output}");
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read stdin")?;
    Ok(buffer)
}
