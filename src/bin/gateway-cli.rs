use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::time::Duration;

use banking_gateway::auth::{TokenCodec, TokenKind};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the Banking API Gateway", long_about = None)]
struct Cli {
    /// Shared signing secret (must match the gateway's auth.jwt_secret).
    #[arg(short, long, default_value = "defaultSecretKeyForBankingApplication2024")]
    secret: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Access,
    Refresh,
    Operation,
}

impl From<Kind> for TokenKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Access => TokenKind::Access,
            Kind::Refresh => TokenKind::Refresh,
            Kind::Operation => TokenKind::Operation,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Mint a signed bearer token
    Issue {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "USER")]
        role: String,
        #[arg(long, value_enum, default_value = "access")]
        kind: Kind,
        /// Override the kind's default TTL, in seconds
        #[arg(long)]
        ttl_secs: Option<u64>,
        /// Banking operation an OPERATION token is scoped to
        #[arg(long)]
        operation: Option<String>,
    },
    /// Validate a token and print its claims
    Validate { token: String },
    /// Check gateway health
    Health {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let codec = TokenCodec::new(&cli.secret);

    match cli.command {
        Commands::Issue {
            subject,
            email,
            role,
            kind,
            ttl_secs,
            operation,
        } => {
            let token = codec.issue(
                &subject,
                &email,
                &role,
                kind.into(),
                ttl_secs.map(Duration::from_secs),
                operation,
            )?;
            println!("{}", token);
        }
        Commands::Validate { token } => match codec.validate(&token) {
            Ok(claims) => println!("{}", serde_json::to_string_pretty(&claims)?),
            Err(e) => {
                eprintln!("Token rejected: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Health { url } => {
            let res = reqwest::Client::new()
                .get(format!("{}/actuator/health", url))
                .send()
                .await?;
            let status = res.status();
            if !status.is_success() {
                eprintln!("Error: gateway returned status {}", status);
                if let Ok(text) = res.text().await {
                    eprintln!("Response: {}", text);
                }
                return Ok(());
            }
            let json: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}
