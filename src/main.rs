use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use aspira_engine::{BENCH_DEPTH, Searcher, run_bench};
use aspira_uci::UciEngine;

fn main() -> Result<()> {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("bench") {
        let depth = match args.get(1) {
            Some(text) => text.parse().with_context(|| format!("invalid bench depth `{text}`"))?,
            None => BENCH_DEPTH,
        };
        let report = run_bench(&mut Searcher::default(), depth)?;
        println!("{report}");
        return Ok(());
    }

    info!(version = env!("CARGO_PKG_VERSION"), "aspira starting");
    UciEngine::new().run()?;
    Ok(())
}
