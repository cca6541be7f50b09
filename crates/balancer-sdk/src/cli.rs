//! Command line entry point.

use {
    crate::{
        graph_api::PoolData,
        price_impact::StablePriceImpact,
        relayer::chained_reference::ChainedReference,
    },
    anyhow::{Context, Result, ensure},
    clap::{Parser, Subcommand},
    number::units::{format_percentage, parse_units},
    std::path::PathBuf,
    tracing_subscriber::EnvFilter,
};

#[derive(Debug, Parser)]
#[clap(name = "balancer-sdk", about = "Balancer relayer SDK utilities")]
pub struct Arguments {
    #[clap(long, env, default_value = "warn,balancer_sdk=debug")]
    pub log_filter: String,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Price impact of joining a stable pool with (or exiting it to) the given
    /// token amounts.
    PriceImpact {
        /// Path to the pool's JSON as returned by the Balancer API.
        #[clap(long)]
        pool: PathBuf,
        /// Token amounts in token units, one per pool token without the BPT.
        #[clap(long, value_delimiter = ',')]
        amounts: Vec<String>,
        /// BPT amount received (or paid for an exit).
        #[clap(long)]
        bpt: String,
        #[clap(long)]
        exit: bool,
    },
    /// Print the chained reference for a key.
    ChainedReference {
        #[clap(long)]
        key: u64,
        #[clap(long)]
        read_only: bool,
    },
}

pub fn start(args: impl IntoIterator<Item = String>) {
    let args = Arguments::parse_from(args);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_filter))
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?args, "running command");

    match run(args.command) {
        Ok(output) => println!("{output}"),
        Err(err) => {
            tracing::error!(?err, "command failed");
            std::process::exit(1);
        }
    }
}

fn run(command: Command) -> Result<String> {
    match command {
        Command::PriceImpact {
            pool,
            amounts,
            bpt,
            exit,
        } => {
            let contents = std::fs::read_to_string(&pool)
                .with_context(|| format!("reading pool {}", pool.display()))?;
            let pool = serde_json::from_str::<PoolData>(&contents)
                .context("parsing pool data")?
                .into_snapshot()?;

            let tokens = pool.math_tokens().collect::<Vec<_>>();
            ensure!(
                tokens.len() == amounts.len(),
                "expected {} amounts, got {}",
                tokens.len(),
                amounts.len()
            );
            let amounts = tokens
                .iter()
                .zip(&amounts)
                .map(|(token, amount)| parse_units(amount, token.decimals))
                .collect::<Result<Vec<_>>>()?;
            let bpt = parse_units(&bpt, 18)?;

            let impact = StablePriceImpact::try_new(&pool)?.calc_price_impact(&amounts, bpt, !exit)?;
            Ok(format_percentage(impact))
        }
        Command::ChainedReference { key, read_only } => {
            let reference = if read_only {
                ChainedReference::read_only(key)
            } else {
                ChainedReference::temporary(key)
            };
            Ok(reference.to_string())
        }
    }
}
