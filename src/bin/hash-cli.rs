use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hash-cli")]
#[command(about = "Client for a running hash-vault server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a password for deferred hashing
    Submit { password: String },
    /// Fetch the digest for a submission id
    Get { id: u64 },
    /// Show request count and mean latency
    Stats,
    /// Ask the server to drain and stop
    Shutdown,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = match cli.command {
        Commands::Submit { password } => {
            client
                .post(format!("{}/hash", cli.url))
                .form(&[("password", password)])
                .send()
                .await?
        }
        Commands::Get { id } => client.get(format!("{}/hash/{}", cli.url, id)).send().await?,
        Commands::Stats => client.get(format!("{}/stats", cli.url)).send().await?,
        Commands::Shutdown => client.get(format!("{}/shutdown", cli.url)).send().await?,
    };
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text.trim_end());
        }
        std::process::exit(1);
    }

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) if json.is_object() => println!("{}", serde_json::to_string_pretty(&json)?),
        _ => println!("{}", text),
    }
    Ok(())
}
