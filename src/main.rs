//! Coin ledger CLI
//!
//! Key generation, transaction inspection and block candidate packing from
//! the command line.

use clap::{Parser, Subcommand};
use coin_ledger::cli::{self, CliResult};
use coin_ledger::config::LedgerConfig;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "coin")]
#[command(version = "0.1.0")]
#[command(about = "Transaction tooling for the coin ledger", long_about = None)]
struct Cli {
    /// Ledger configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate new key pairs
    Keygen {
        /// Number of key pairs
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
    },

    /// Derive the address of a secret key
    Address {
        /// Hex-encoded secret key
        #[arg(short, long)]
        secret: String,
    },

    /// Decode and verify a hex-encoded transaction
    Decode {
        /// Hex-encoded transaction bytes
        tx: String,
    },

    /// Admit transactions into a mempool and print the block candidate
    Pack {
        /// Unspent outputs the transactions spend (JSON array)
        #[arg(short, long)]
        unspent: PathBuf,

        /// Hex-encoded transactions
        #[arg(required = true)]
        txs: Vec<String>,
    },

    /// Print the effective configuration
    Config,
}

fn run(cli: Cli, config: LedgerConfig) -> CliResult<bool> {
    let mut out = io::stdout().lock();
    match cli.command {
        Commands::Keygen { count } => cli::cmd_keygen(&mut out, &config, count)?,
        Commands::Address { secret } => cli::cmd_address(&mut out, &config, &secret)?,
        Commands::Decode { tx } => return cli::cmd_decode(&mut out, &tx),
        Commands::Pack { unspent, txs } => {
            let unspent = cli::load_unspent(&unspent)?;
            cli::cmd_pack(&mut out, &config, &unspent, &txs)?;
        }
        Commands::Config => cli::cmd_config(&mut out, &config)?,
    }
    Ok(true)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match LedgerConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logger
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    match run(cli, config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
