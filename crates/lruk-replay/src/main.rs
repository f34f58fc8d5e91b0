//! lruk-replay - replay a call trace through an LRU-K memo cache

mod replay;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lrukmemo::MemoConfig;
use tracing::info;

use crate::replay::{load_trace, replay, Function, ReplayReport};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON-lines trace, one array of arguments per line
    trace: PathBuf,

    /// Computation to memoize
    #[arg(short, long, value_enum, default_value_t = Function::Sum)]
    function: Function,

    /// JSON file with a cache configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Visits before a key is cached (overrides --config)
    #[arg(short = 'k', long)]
    threshold: Option<usize>,

    /// Cache tier capacity (overrides --config)
    #[arg(short, long)]
    capacity: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn memo_config(&self) -> Result<MemoConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => MemoConfig::default(),
        };

        if let Some(k) = self.threshold {
            config = config.with_promotion_threshold(k);
        }
        if let Some(capacity) = self.capacity {
            config = config.with_cache_capacity(capacity);
        }
        config.validate()?;
        Ok(config)
    }
}

fn print_report(report: &ReplayReport) {
    println!("calls:        {}", report.calls);
    println!("failures:     {}", report.failures);
    println!("history size: {}", report.sizes.history_size);
    println!("cache size:   {}", report.sizes.cache_size);
    println!("hits:         {}", report.counters.hits());
    println!("misses:       {}", report.counters.misses());
    println!("promotions:   {}", report.counters.promotions());
    println!("evictions:    {}", report.counters.evictions());
    println!("computations: {}", report.counters.computations());
    println!("hit ratio:    {:.3}", report.hit_ratio);
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.memo_config()?;

    info!("lruk-replay v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Promotion threshold: {}, cache capacity: {}",
        config.promotion_threshold, config.cache_capacity
    );

    let calls = load_trace(&args.trace)?;
    info!("Loaded {} calls from {}", calls.len(), args.trace.display());

    let report = replay(config, args.function, &calls)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["lruk-replay", "trace.jsonl", "-k", "3", "--capacity", "5"]);
        assert_eq!(args.trace, PathBuf::from("trace.jsonl"));
        assert_eq!(args.function, Function::Sum);

        let config = args.memo_config().unwrap();
        assert_eq!(config.promotion_threshold, 3);
        assert_eq!(config.cache_capacity, 5);
    }

    #[test]
    fn test_config_file_with_override() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"promotion_threshold": 4, "cache_capacity": 7}}"#).unwrap();
        let path = file.path().to_str().unwrap();

        let args = Args::parse_from(["lruk-replay", "t.jsonl", "--config", path, "-c", "2"]);
        let config = args.memo_config().unwrap();

        assert_eq!(config.promotion_threshold, 4);
        assert_eq!(config.cache_capacity, 2);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let args = Args::parse_from(["lruk-replay", "t.jsonl", "-k", "0"]);
        let err = args.memo_config().unwrap_err();
        assert!(err.to_string().contains("promotion threshold"));
    }

    #[test]
    fn test_function_flag() {
        let args = Args::parse_from(["lruk-replay", "t.jsonl", "--function", "concat"]);
        assert_eq!(args.function, Function::Concat);
    }
}
