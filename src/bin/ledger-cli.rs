use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "ledger-cli")]
#[command(about = "Command-line client for the Ledger API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Bearer token for authenticated commands
    #[arg(short, long, env = "LEDGER_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service liveness
    Health,
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Log in and print the issued token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Check the current token
    Validate,
    /// Record a buy or sell operation
    Create {
        /// "buy" or "sell"
        #[arg(long = "type")]
        kind: String,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        currency: String,
    },
    /// List operations, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Show one operation
    Get { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
    }

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/api/healthcheck", cli.url)).send().await?,
        Commands::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            client
                .post(format!("{}/api/auth/register", cli.url))
                .json(&json!({
                    "email": email,
                    "password": password,
                    "firstName": first_name,
                    "lastName": last_name,
                }))
                .send()
                .await?
        }
        Commands::Login { email, password } => {
            client
                .post(format!("{}/api/auth/login", cli.url))
                .json(&json!({ "email": email, "password": password }))
                .send()
                .await?
        }
        Commands::Validate => {
            client
                .get(format!("{}/api/auth/validate", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Create {
            kind,
            amount,
            currency,
        } => {
            client
                .post(format!("{}/api/operations", cli.url))
                .headers(headers)
                .json(&json!({ "type": kind, "amount": amount, "currency": currency }))
                .send()
                .await?
        }
        Commands::List { page, limit } => {
            client
                .get(format!("{}/api/operations", cli.url))
                .headers(headers)
                .query(&[("page", page), ("limit", limit)])
                .send()
                .await?
        }
        Commands::Get { id } => {
            client
                .get(format!("{}/api/operations/{}", cli.url, id))
                .headers(headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    let body = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", body);
    } else {
        eprintln!("Error: API returned status {}", status);
        eprintln!("{}", body);
    }
    Ok(())
}
