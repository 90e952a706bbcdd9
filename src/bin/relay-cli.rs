use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Management CLI for the relay bridge", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    /// Bearer token for the write endpoints.
    #[arg(short, long, env = "CONTROL_API_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show relay state and the last alert
    Status,
    /// Show recent polls, newest first
    History {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Force the relay ON
    On,
    /// Force the relay OFF
    Off,
    /// Flip the relay
    Toggle,
    /// Liveness check
    Health,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token))?);
    }

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/api/status", base)),
        Commands::History { limit } => {
            let request = client.get(format!("{}/api/history", base));
            match limit {
                Some(limit) => request.query(&[("limit", limit)]),
                None => request,
            }
        }
        Commands::On => client.post(format!("{}/api/relay/on", base)),
        Commands::Off => client.post(format!("{}/api/relay/off", base)),
        Commands::Toggle => client.post(format!("{}/api/relay/toggle", base)),
        Commands::Health => client.get(format!("{}/health", base)),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: relay bridge returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        return Ok(ExitCode::FAILURE);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(ExitCode::SUCCESS)
}
