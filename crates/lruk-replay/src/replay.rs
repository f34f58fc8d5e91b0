//! Trace loading and replay through an LRU-K memo cache

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use lrukmemo::{Arg, CacheStats, LrukMemo, MemoConfig, MemoStats};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Built-in computation to memoize
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Function {
    /// Sum of numeric arguments
    Sum,
    /// Concatenation of string arguments
    Concat,
    /// Number of arguments
    Len,
}

impl Function {
    /// Evaluate the function over one call's arguments
    pub fn apply(&self, args: &[Arg]) -> Result<Value> {
        match self {
            Function::Sum => {
                let mut ints = 0i64;
                let mut floats = 0f64;
                let mut any_float = false;
                for (i, arg) in args.iter().enumerate() {
                    if let Some(n) = arg.as_int() {
                        ints = ints
                            .checked_add(n)
                            .ok_or_else(|| anyhow!("integer overflow at argument {}", i))?;
                    } else if let Arg::UInt(_) = arg {
                        bail!("sum: argument {} does not fit in i64", i);
                    } else if let Some(x) = arg.as_f64() {
                        floats += x;
                        any_float = true;
                    } else {
                        bail!("sum: argument {} is not a number: {:?}", i, arg);
                    }
                }
                if any_float {
                    Ok(Value::from(ints as f64 + floats))
                } else {
                    Ok(Value::from(ints))
                }
            }
            Function::Concat => {
                let mut out = String::new();
                for (i, arg) in args.iter().enumerate() {
                    let s = arg
                        .as_str()
                        .ok_or_else(|| anyhow!("concat: argument {} is not a string", i))?;
                    out.push_str(s);
                }
                Ok(Value::String(out))
            }
            Function::Len => Ok(Value::from(args.len())),
        }
    }
}

/// Parse a JSON-lines trace: one JSON array of arguments per line.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_trace(input: &str) -> Result<Vec<Vec<Arg>>> {
    let mut calls = Vec::new();
    for (lineno, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("line {}: invalid JSON", lineno + 1))?;
        match value {
            Value::Array(items) => calls.push(items.into_iter().map(Arg::from).collect()),
            other => bail!("line {}: expected an array of arguments, got {}", lineno + 1, other),
        }
    }
    Ok(calls)
}

/// Read and parse a trace file
pub fn load_trace<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<Arg>>> {
    let path = path.as_ref();
    let input = fs::read_to_string(path)
        .with_context(|| format!("failed to read trace {}", path.display()))?;
    parse_trace(&input)
}

/// Outcome of a replay
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Calls replayed
    pub calls: usize,
    /// Calls whose computation failed
    pub failures: usize,
    /// Final tier occupancy
    pub sizes: MemoStats,
    /// Activity counters
    pub counters: CacheStats,
    /// Hits over lookups
    pub hit_ratio: f64,
}

/// Replay every call through a fresh memo cache
pub fn replay(config: MemoConfig, function: Function, calls: &[Vec<Arg>]) -> Result<ReplayReport> {
    let mut memo = LrukMemo::with_scope(config, function, |f: &mut Function, args: &[Arg]| {
        f.apply(args)
    })?;

    let mut failures = 0;
    for (i, args) in calls.iter().enumerate() {
        match memo.invoke(args) {
            Ok(value) => debug!(call = i, result = %value, "Call completed"),
            Err(e) => {
                failures += 1;
                warn!(call = i, "Computation failed: {:#}", e);
            }
        }
    }

    Ok(ReplayReport {
        calls: calls.len(),
        failures,
        sizes: memo.get_stats(),
        counters: memo.stats().clone(),
        hit_ratio: memo.stats().hit_ratio(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_trace() {
        let calls = parse_trace("# header\n[1, 2]\n\n[\"a\", {\"k\": 1}]\n").unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[1][0].as_str(), Some("a"));
    }

    #[test]
    fn test_parse_trace_rejects_non_array() {
        let err = parse_trace("[1]\n{\"a\": 1}\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let err = parse_trace("[1,\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_functions() {
        let ints = [Arg::from(1), Arg::from(2)];
        assert_eq!(Function::Sum.apply(&ints).unwrap(), Value::from(3));
        assert_eq!(
            Function::Sum.apply(&[Arg::from(1), Arg::from(0.5)]).unwrap(),
            Value::from(1.5)
        );
        assert!(Function::Sum.apply(&[Arg::from("x")]).is_err());
        assert!(Function::Sum.apply(&[Arg::from(u64::MAX)]).is_err());
        assert_eq!(Function::Sum.apply(&[Arg::from(4u64)]).unwrap(), Value::from(4));

        let strs = [Arg::from("ab"), Arg::from("cd")];
        assert_eq!(Function::Concat.apply(&strs).unwrap(), Value::from("abcd"));
        assert!(Function::Concat.apply(&ints).is_err());

        assert_eq!(Function::Len.apply(&strs).unwrap(), Value::from(2));
    }

    #[test]
    fn test_replay_scenario() {
        let trace = "[1,2]\n[1,2]\n[1,2]\n[3,4]\n[3,4]\n[5,6]\n[5,6]\n[1,2]\n";
        let calls = parse_trace(trace).unwrap();
        let config = MemoConfig::new()
            .with_promotion_threshold(2)
            .with_cache_capacity(2);

        let report = replay(config, Function::Sum, &calls).unwrap();

        assert_eq!(report.calls, 8);
        assert_eq!(report.failures, 0);
        assert_eq!(report.sizes.cache_size, 2);
        assert_eq!(report.sizes.history_size, 1);
        assert_eq!(report.counters.hits(), 1);
        assert_eq!(report.counters.promotions(), 3);
        assert_eq!(report.counters.evictions(), 1);
        assert_eq!(report.counters.computations(), 7);
    }

    #[test]
    fn test_large_trace_integers_get_distinct_keys() {
        let calls = parse_trace("[18446744073709551615]\n[18446744073709551614]\n").unwrap();
        let config = MemoConfig::new().with_promotion_threshold(2);

        let report = replay(config, Function::Len, &calls).unwrap();

        // Two distinct keys, each seen once
        assert_eq!(report.sizes.history_size, 2);
        assert_eq!(report.sizes.cache_size, 0);
    }

    #[test]
    fn test_replay_counts_failures() {
        let calls = parse_trace("[\"x\"]\n[\"x\"]\n[1]\n").unwrap();

        let report = replay(MemoConfig::default(), Function::Sum, &calls).unwrap();

        assert_eq!(report.failures, 2);
        assert_eq!(report.sizes.history_size, 1);
        assert_eq!(report.sizes.cache_size, 0);
    }

    #[test]
    fn test_replay_rejects_bad_config() {
        let config = MemoConfig::new().with_cache_capacity(0);
        assert!(replay(config, Function::Len, &[]).is_err());
    }

    #[test]
    fn test_load_trace_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[1, 2]").unwrap();
        writeln!(file, "[1, 2]").unwrap();

        let calls = load_trace(file.path()).unwrap();
        assert_eq!(calls.len(), 2);

        let missing = load_trace(file.path().with_extension("missing"));
        assert!(missing.is_err());
    }
}
