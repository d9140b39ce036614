use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Drive the LedgerX transfer demo from the terminal
#[derive(Parser, Debug)]
#[command(name = "ledgerx", version)]
#[command(about = "Drive the LedgerX transfer demo from the terminal", long_about = None)]
pub struct CliArgs {
    /// Config file to use instead of ~/.ledgerx/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// LedgerX API base URL; wins over config and LEDGERX_API_URL
    #[arg(long = "base-url", global = true, value_name = "URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Wait for the backend to wake up and report its state
    Status,
    /// Show the balances of the configured wallets
    Account {
        /// Account numbers to show (default: both configured wallets)
        #[arg(value_name = "ACCOUNT")]
        accounts: Vec<String>,
    },
    /// Browse the transaction history
    Transactions {
        /// Zero-based page number
        #[arg(long, short, default_value_t = 0)]
        page: u32,
    },
    /// Transfer AMOUNT from the source wallet to the destination wallet
    Transfer {
        /// Amount to transfer, e.g. 25.00
        #[arg(value_name = "AMOUNT", allow_hyphen_values = true)]
        amount: String,
        /// Swap source and destination
        #[arg(long)]
        reverse: bool,
    },
    /// Fire many identical small transfers at once
    Stress {
        /// Number of concurrent transfers (default: from config, 50)
        #[arg(long, short = 'n', value_name = "COUNT", value_parser = clap::value_parser!(u32).range(1..=1000))]
        count: Option<u32>,
        /// Swap source and destination
        #[arg(long)]
        reverse: bool,
    },
    /// Restore the demo wallets to their seeded balances
    Reset,
    /// Follow wallet balances and completed transfers live until Ctrl-C
    Watch,
}
