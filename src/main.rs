use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use paygate::application::webhooks::{WebhookKind, WebhookProcessor};
use paygate::config::Settings;
use paygate::domain::ports::{AppealStoreBox, TransactionStatusStoreBox};
use paygate::domain::signature::calculate_signature;
use paygate::domain::transaction::Instrument;
use paygate::error::GatewayError;
use paygate::infrastructure::log_store::LogStore;
use paygate::infrastructure::provider::ProviderClient;
use paygate::interfaces::auth::authorize;
use paygate::interfaces::json::request_reader::RequestReader;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    /// Value of the caller's `Authorization` header
    #[arg(long, global = true)]
    authorization: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a transaction from a JSON request file
    Create {
        /// card, card-internal, card-cross-border, sbp, sbp-internal, sbp-cross-border, qr or sim
        instrument: Instrument,
        input: PathBuf,
    },
    /// Cancel a provider transaction
    Cancel { transaction_id: String },
    /// Show the merchant balance
    Balance,
    /// Show per-instrument limits for a currency
    Limits { currency: String },
    /// Compute the webhook signature of a JSON body delivered to URL
    Sign {
        #[arg(long)]
        url: String,
        input: PathBuf,
    },
    /// Process a webhook delivery (transaction or appeal)
    Webhook {
        kind: WebhookKind,
        /// URL the delivery was made to
        #[arg(long)]
        url: String,
        /// Value of the X-Signature header
        #[arg(long)]
        signature: Option<String>,
        input: PathBuf,
    },
}

fn open(path: &Path) -> paygate::error::Result<RequestReader<File>> {
    let file = File::open(path).map_err(|e| {
        GatewayError::Internal(format!("cannot open {}: {e}", path.display()))
    })?;
    Ok(RequestReader::new(file))
}

fn to_json<T: serde::Serialize>(value: &T) -> paygate::error::Result<Option<String>> {
    serde_json::to_string_pretty(value)
        .map(Some)
        .map_err(|e| GatewayError::Internal(e.to_string()))
}

/// Runs one command; returns what should be printed on stdout.
async fn run(cli: Cli) -> paygate::error::Result<Option<String>> {
    let settings = cli.settings;

    if !matches!(cli.command, Command::Sign { .. }) {
        authorize(cli.authorization.as_deref(), &settings.merchant_token)?;
    }

    match cli.command {
        Command::Create { instrument, input } => {
            let request = open(&input)?.transaction_request(instrument)?;
            let client = ProviderClient::from_settings(&settings)?;
            to_json(&client.create_transaction(instrument, &request).await?)
        }
        Command::Cancel { transaction_id } => {
            let client = ProviderClient::from_settings(&settings)?;
            client.cancel_transaction(&transaction_id).await?;
            Ok(None)
        }
        Command::Balance => {
            let client = ProviderClient::from_settings(&settings)?;
            to_json(&client.get_balance().await?)
        }
        Command::Limits { currency } => {
            let client = ProviderClient::from_settings(&settings)?;
            to_json(&client.get_limits(&currency).await?)
        }
        Command::Sign { url, input } => {
            let secret = settings
                .webhook_secret_key
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    GatewayError::Misconfigured("Webhook secret key is not configured".to_string())
                })?;
            let body = open(&input)?.json()?;
            calculate_signature(&url, &body, secret).map(Some)
        }
        Command::Webhook {
            kind,
            url,
            signature,
            input,
        } => {
            let body = open(&input)?.bytes()?;
            let transaction_store: TransactionStatusStoreBox = Box::new(LogStore::new());
            let appeal_store: AppealStoreBox = Box::new(LogStore::new());
            let processor =
                WebhookProcessor::new(settings.webhook_guard(), transaction_store, appeal_store);
            let ack = processor
                .handle(kind, &url, &body, signature.as_deref())
                .await?;
            to_json(&ack)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(Some(output)) => println!("{output}"),
        Ok(None) => {}
        Err(e) => {
            // Callers get the envelope; the full error goes to the diagnostic report.
            let envelope = serde_json::to_string(&e.envelope()).into_diagnostic()?;
            eprintln!("HTTP {} {envelope}", e.http_status());
            return Err(e).into_diagnostic();
        }
    }

    Ok(())
}
