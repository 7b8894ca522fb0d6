//! # Command-Line Interface
//!
//! Two subcommands share the client options:
//!
//! - `throughput`: one write phase and one read phase at a fixed concurrency
//! - `sweep`: the same test repeated across concurrency levels
//!
//! Global flags control logging (`-v`, `-q`, `--log-file`). Durations accept
//! bare seconds or a unit suffix, see [`parse_duration`].

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// DFS Benchmark Suite - throughput, latency and reliability of a remote
/// file-storage service under varying concurrency
#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[clap(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[clap(short = 'q', long, default_value_t = false, global = true)]
    pub quiet: bool,

    /// Also write logs to this file
    #[clap(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run one write phase and one read phase at a single concurrency level
    Throughput(ThroughputArgs),

    /// Repeat the throughput test across a range of concurrency levels
    Sweep(SweepArgs),
}

/// How to reach the storage service
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ClientArgs {
    /// Username for the storage service
    #[clap(long)]
    pub username: String,

    /// Password for the storage service
    #[clap(long)]
    pub password: String,

    /// Path to the storage client binary
    #[clap(long)]
    pub client_path: PathBuf,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ThroughputArgs {
    #[clap(flatten)]
    pub client: ClientArgs,

    /// Number of concurrent workers
    #[clap(short = 'c', long = "concurrent", default_value_t = crate::defaults::CONCURRENCY)]
    pub concurrency: usize,

    /// Size of each test file in MB
    #[clap(short = 's', long, default_value_t = crate::defaults::FILE_SIZE_MB)]
    pub file_size: u64,

    /// Number of test files to generate
    #[clap(short = 'n', long, default_value_t = crate::defaults::NUM_FILES)]
    pub num_files: usize,

    /// Duration of each phase (e.g. "60", "30s", "5m")
    #[clap(short = 'd', long, value_parser = parse_duration, default_value = "60")]
    pub duration: Duration,

    /// Directory for generated and downloaded test files
    #[clap(long, default_value = crate::defaults::STAGING_DIR)]
    pub test_files_dir: PathBuf,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SweepArgs {
    #[clap(flatten)]
    pub client: ClientArgs,

    /// Maximum number of concurrent workers to test
    #[clap(long, default_value_t = crate::defaults::MAX_THREADS)]
    pub max_threads: usize,

    /// Size of test files in MB
    #[clap(short = 's', long, default_value_t = crate::defaults::FILE_SIZE_MB)]
    pub file_size: u64,

    /// Number of test files to generate for each run
    #[clap(short = 'n', long, default_value_t = crate::defaults::NUM_FILES)]
    pub num_files: usize,

    /// Duration of each phase (e.g. "30", "30s", "2m")
    #[clap(short = 'd', long, value_parser = parse_duration, default_value = "30")]
    pub duration: Duration,

    /// Number of times to repeat each concurrency level
    #[clap(short = 'r', long, default_value_t = crate::defaults::REPEATS)]
    pub repeats: usize,

    /// Prefix for output files
    #[clap(short = 'o', long, default_value = crate::defaults::OUTPUT_PREFIX)]
    pub output: String,

    /// Parent directory for each run's test files
    #[clap(long, default_value = crate::defaults::STAGING_DIR)]
    pub test_files_dir: PathBuf,
}

/// Parse duration from string (e.g., "10", "10s", "5m", "1h", "500ms").
///
/// ## Parameters
/// - `s`: a non-negative number, optionally followed by `ms`, `s`, `m` or
///   `h`. A bare number is seconds; fractions are allowed.
///
/// ## Returns
/// - `Ok(Duration)`: the parsed duration
/// - `Err(String)`: a message clap shows next to the offending argument
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let (num_str, unit) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, "ms")
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, "s")
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, "m")
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, "h")
    } else {
        (s, "s")
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number in duration: {}", num_str))?;
    if !num.is_finite() || num < 0.0 {
        return Err(format!("Duration must be a non-negative number: {}", s));
    }

    let seconds = match unit {
        "ms" => num / 1000.0,
        "s" => num,
        "m" => num * 60.0,
        "h" => num * 3600.0,
        _ => return Err(format!("Invalid duration unit: {}", unit)),
    };

    Ok(Duration::from_secs_f64(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(
            parse_duration("500ms").unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(parse_duration("60").unwrap(), Duration::from_secs(60));
        assert_eq!(
            parse_duration("1.5s").unwrap(),
            Duration::from_millis(1500)
        );

        assert!(parse_duration("").is_err());
        assert!(parse_duration("invalid").is_err());
        assert!(parse_duration("-3s").is_err());
    }

    #[test]
    fn test_throughput_defaults() {
        let args = Args::parse_from([
            "dfs-bench",
            "throughput",
            "--username",
            "alice",
            "--password",
            "secret",
            "--client-path",
            "/usr/local/bin/dfs-client",
        ]);

        let Command::Throughput(throughput) = args.command else {
            panic!("expected throughput subcommand");
        };
        assert_eq!(throughput.client.username, "alice");
        assert_eq!(throughput.concurrency, 4);
        assert_eq!(throughput.file_size, 1);
        assert_eq!(throughput.num_files, 10);
        assert_eq!(throughput.duration, Duration::from_secs(60));
        assert_eq!(throughput.test_files_dir, PathBuf::from("./test_files"));
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_sweep_options() {
        let args = Args::parse_from([
            "dfs-bench",
            "-vv",
            "sweep",
            "--username",
            "alice",
            "--password",
            "secret",
            "--client-path",
            "dfs-client",
            "--max-threads",
            "8",
            "--repeats",
            "2",
            "--duration",
            "10s",
            "--output",
            "run1",
        ]);

        let Command::Sweep(sweep) = args.command else {
            panic!("expected sweep subcommand");
        };
        assert_eq!(sweep.max_threads, 8);
        assert_eq!(sweep.repeats, 2);
        assert_eq!(sweep.duration, Duration::from_secs(10));
        assert_eq!(sweep.output, "run1");
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_credentials_are_required() {
        let result = Args::try_parse_from(["dfs-bench", "throughput", "--username", "alice"]);
        assert!(result.is_err());
    }
}
