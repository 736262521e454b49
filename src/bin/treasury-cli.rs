use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "treasury-cli")]
#[command(about = "Management CLI for the Credit Treasury", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    /// Admin bearer key, needed for `transfer` only.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Service and treasury snapshot
    Status,
    /// Health and ledger totals
    Health,
    /// Credits held by an address
    Credits { address: String },
    /// Record earned credits
    Receive {
        amount_eth: f64,
        #[arg(short, long)]
        wallet: Option<String>,
    },
    /// Redeem credits to a wallet
    Claim { wallet: String, amount_eth: f64 },
    /// Send treasury ETH without touching the ledger (admin)
    Transfer { recipient: String, amount_eth: f64 },
    /// On-chain status of a transaction
    Tx { hash: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Status => client.get(format!("{base}/")).send().await?,
        Commands::Health => client.get(format!("{base}/health")).send().await?,
        Commands::Credits { address } => {
            client
                .get(format!("{base}/api/user/credits/{address}"))
                .send()
                .await?
        }
        Commands::Receive { amount_eth, wallet } => {
            client
                .post(format!("{base}/api/treasury/receive"))
                .json(&json!({
                    "amountETH": amount_eth,
                    "userWallet": wallet,
                    "source": "cli",
                }))
                .send()
                .await?
        }
        Commands::Claim { wallet, amount_eth } => {
            client
                .post(format!("{base}/api/claim/earnings"))
                .json(&json!({ "userWallet": wallet, "amountETH": amount_eth }))
                .send()
                .await?
        }
        Commands::Transfer {
            recipient,
            amount_eth,
        } => {
            let Some(key) = cli.key else {
                eprintln!("Error: transfer requires --key");
                std::process::exit(2);
            };
            let mut headers = HeaderMap::new();
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}"))?,
            );
            client
                .post(format!("{base}/api/transfer/eth"))
                .headers(headers)
                .json(&json!({ "recipientAddress": recipient, "amountETH": amount_eth }))
                .send()
                .await?
        }
        Commands::Tx { hash } => client.get(format!("{base}/api/tx/{hash}")).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Treasury API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    if status.as_u16() == 202 {
        eprintln!("Transfer broadcast but not yet confirmed");
    }
    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
