use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use social_airdrop::cache::CacheStore;
use social_airdrop::config::{Config, FileConfig};
use social_airdrop::constants;
use social_airdrop::disburse::{self, DisbursementOutcome, Disburser, StdinConfirmation};
use social_airdrop::distribution;
use social_airdrop::error::{require_credential, validate_amount};
use social_airdrop::neynar::NeynarClient;
use social_airdrop::pipeline::{self, SearchOptions};
use social_airdrop::rpc::{Erc20BalanceQuery, Erc20Ledger};

#[derive(Parser)]
#[command(name = "social-airdrop")]
#[command(about = "Find Farcaster users talking about a token and airdrop to the ones who don't hold it")]
struct Cli {
    /// Path to config file (optional; built-in defaults are used when absent)
    #[arg(long, global = true, default_value = constants::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Directory for cast, balance and progress caches
    #[arg(long, global = true, default_value = constants::DEFAULT_CACHE_DIR)]
    cache_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search casts for a ticker and write the eligibility CSV
    SocialAirdrop {
        /// Token ticker, searched as `$<ticker>`
        #[arg(long, default_value = constants::DEFAULT_TICKER)]
        ticker: String,

        /// Custom search text instead of `$<ticker>`
        #[arg(long)]
        search_text: Option<String>,

        /// ERC-20 contract to check holdings of
        #[arg(long, default_value = constants::DEFAULT_TOKEN_ADDRESS)]
        token_address: String,

        /// Output CSV (default: <ticker>_airdrop_eligible.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Ignore cached casts and balances
        #[arg(long)]
        no_cache: bool,

        #[arg(long, env = "NEYNAR_API_KEY", hide = true, hide_env_values = true)]
        neynar_api_key: Option<String>,
    },

    /// Convert an eligibility CSV into a holders,amounts distribution
    ExportAirdrop {
        /// Eligibility CSV written by social-airdrop
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value = constants::DEFAULT_DISTRIBUTION_FILE)]
        output: PathBuf,

        /// Tokens per recipient (human-readable, e.g. 420 or 0.5)
        #[arg(long, default_value = constants::DEFAULT_AIRDROP_AMOUNT, value_parser = parse_amount)]
        amount: String,
    },

    /// Send tokens to every address in a distribution CSV (dry run unless --no-dry-run)
    SendAirdrop {
        /// Distribution CSV (holders,amounts)
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, default_value = constants::DEFAULT_TOKEN_ADDRESS)]
        token_address: String,

        /// Actually send transactions
        #[arg(long)]
        no_dry_run: bool,

        #[arg(long, env = "PRIVATE_KEY", hide = true, hide_env_values = true)]
        private_key: Option<String>,
    },
}

fn parse_amount(value: &str) -> Result<String, String> {
    validate_amount(value).map_err(|e| e.to_string())?;
    Ok(value.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("social_airdrop=info".parse()?))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let file_config = FileConfig::load_or_default(&cli.config)?;
    let config = Config::from_file(&file_config, cli.cache_dir)?;

    match cli.command {
        Command::SocialAirdrop {
            ticker,
            search_text,
            token_address,
            output,
            no_cache,
            neynar_api_key,
        } => {
            let api_key = require_credential(neynar_api_key.as_deref(), "NEYNAR_API_KEY")?;
            let options = SearchOptions {
                ticker,
                search_text,
                token_address,
                output,
                use_cache: !no_cache,
            };

            println!("=== Social Airdrop Eligibility Finder ===");
            let search = NeynarClient::new(api_key)?;
            pipeline::run(&options, search, Erc20BalanceQuery, &config).await?;
        }

        Command::ExportAirdrop { input, output, amount } => {
            println!("=== Airdrop Distribution Export ===");
            distribution::export(&input, &output, &amount, &config.spam_filter)?;
        }

        Command::SendAirdrop {
            input,
            token_address,
            no_dry_run,
            private_key,
        } => {
            let dry_run = !no_dry_run;
            println!("=== Airdrop Token Sender ===");
            println!("Input: {}", input.display());
            println!("Token: {}", token_address);
            if dry_run {
                println!("Dry run: YES (safe)");
            } else {
                println!("Dry run: NO (LIVE TOKENS WILL BE SENT)");
            }

            let private_key = require_credential(private_key.as_deref(), "PRIVATE_KEY")?;
            let entries = disburse::load_distribution(&input)?;

            let ledger = Erc20Ledger::connect(config.primary_rpc(), &private_key, &token_address).await?;
            let disburser = Disburser::new(ledger, StdinConfirmation, CacheStore::open(&config.cache_dir), &config.pacing);

            let outcome = disburser.run(&entries, &token_address, dry_run).await?;
            if let DisbursementOutcome::InsufficientBalance { needed, have, short } = outcome {
                anyhow::bail!("Insufficient token balance: need {}, have {}, short {}", needed, have, short);
            }
        }
    }

    Ok(())
}
