//! swapquote: command-line quote client
//!
//! Fetches quotes through the caching client and reports cache metrics.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures_util::future::join_all;
use swapquote::config::Config;
use swapquote::{CachePreset, CachingQuoteClient, QuoteApi, QuoteRequest};

/// Swap-quote client with response caching
#[derive(Parser)]
#[command(name = "swapquote")]
#[command(version = swapquote::PKG_VERSION)]
#[command(about = "Fetch swap quotes through a caching client")]
struct Args {
    /// Config file (default: ~/.swapquote/config.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Quote API base URL (overrides the config file)
    #[arg(long, env = "SWAPQUOTE_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Request a quote
    Quote {
        /// Input mint address
        input: String,
        /// Output mint address
        output: String,
        /// Raw input amount
        amount: u64,
        /// Slippage tolerance in basis points
        #[arg(long)]
        slippage_bps: Option<u16>,
        /// Cache preset (overrides the config file)
        #[arg(long)]
        preset: Option<CachePreset>,
        /// Issue the same request this many times concurrently
        #[arg(long, default_value_t = 1)]
        repeat: usize,
    },

    /// List program ID to DEX label mappings
    Labels,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // default: warn; override with RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(base_url) = args.base_url {
        config.client.base_url = base_url;
    }
    let http = Arc::new(config.http_client()?);

    match args.command {
        Command::Quote {
            input,
            output,
            amount,
            slippage_bps,
            preset,
            repeat,
        } => {
            let cache_config = match preset {
                Some(preset) => preset.into(),
                None => config.cache_config(),
            };
            let client = CachingQuoteClient::new(http, cache_config)?;

            let mut request = QuoteRequest::new(input, output, amount);
            if let Some(bps) = slippage_bps {
                request = request.slippage_bps(bps);
            }

            let results = join_all((0..repeat.max(1)).map(|_| client.quote(&request))).await;
            for result in results {
                let quote = result?;
                println!(
                    "{} {} -> {} {} (impact {}%)",
                    quote.in_amount,
                    quote.input_mint,
                    quote.out_amount,
                    quote.output_mint,
                    quote.price_impact_pct
                );
            }

            let m = client.metrics();
            println!(
                "requests: {}  hits: {}  misses: {}  saved: {}  hit ratio: {:.2}  avg: {:?}",
                m.requests,
                m.hits,
                m.misses,
                m.api_calls_saved,
                m.hit_ratio(),
                m.avg_response_time
            );
            client.destroy();
        }

        Command::Labels => {
            let mut labels: Vec<_> = http.program_id_to_label().await?.into_iter().collect();
            labels.sort();
            for (program, label) in labels {
                println!("{program}  {label}");
            }
        }
    }

    Ok(())
}
