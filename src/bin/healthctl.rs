use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "healthctl")]
#[command(about = "Query a running healthgate instance", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Readiness path on the server
    #[arg(long, default_value = "/health/ready")]
    ready_path: String,

    /// Liveness path on the server
    #[arg(long, default_value = "/health/live")]
    live_path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run readiness probes and show the detailed report
    Ready,
    /// Run liveness probes
    Live,
    /// Show service name and version
    Status,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let path = match cli.command {
        Commands::Ready => cli.ready_path.as_str(),
        Commands::Live => cli.live_path.as_str(),
        Commands::Status => "/status",
    };

    let url = format!("{}{}", cli.url.trim_end_matches('/'), path);
    let res = client.get(&url).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }

    if status.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Error: server returned status {}", status);
        Ok(ExitCode::FAILURE)
    }
}
