use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use driver_perf_bench::fixtures::{self, GenerateConfig, DEFAULT_DATA_DIR};
use driver_perf_bench::harness::{FailurePolicy, HarnessConfig, Profile, RunMode};
use driver_perf_bench::report::{render_all, ReportFormat};
use driver_perf_bench::runner::Runner;
use driver_perf_bench::schema::{RunMeta, RunSummary};
use driver_perf_bench::workloads;
use driver_perf_bench::RunContext;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileArg {
    Quick,
    Full,
}

impl From<ProfileArg> for Profile {
    fn from(v: ProfileArg) -> Self {
        match v {
            ProfileArg::Quick => Profile::Quick,
            ProfileArg::Full => Profile::Full,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the registered cases and emit a perf report.
    Run {
        /// Only run cases whose name contains this pattern.
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// List registered cases with their scale metadata.
    List,

    /// Generate deterministic document fixtures.
    GenerateFixtures {
        /// Random seed for deterministic generation.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Nesting depth of the deep fixture.
        #[arg(long, default_value_t = 12)]
        depth: usize,
    },

    /// Show size, shape and digest of a fixture file.
    FixtureInfo {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

#[derive(Parser, Debug)]
#[command(name = "driver-perf-bench")]
#[command(about = "Workload benchmark runner (Evergreen perf-format output)")]
struct Args {
    #[arg(long, value_enum, default_value_t = ProfileArg::Full, global = true)]
    profile: ProfileArg,

    #[arg(long, value_enum, global = true)]
    mode: Option<RunMode>,

    /// Trials per case in fixed mode.
    #[arg(long, global = true)]
    trials: Option<usize>,

    /// Bound on the whole run, in seconds. Each case is bounded separately regardless.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Skip remaining cases after the first failing one.
    #[arg(long, default_value_t = false, global = true)]
    abort_on_failure: bool,

    #[arg(long, value_enum, default_value_t = ReportFormat::Legacy, global = true)]
    format: ReportFormat,

    /// Directory holding the fixture files.
    #[arg(long, default_value = DEFAULT_DATA_DIR, global = true)]
    data_dir: PathBuf,

    /// Where to write the perf report. If omitted, prints to stdout.
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Where to write the run summary (metadata and per-case status).
    #[arg(long, global = true)]
    meta_out: Option<PathBuf>,

    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn now_utc() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("unix:{secs}")
}

fn git_sha_short() -> Option<String> {
    std::env::var("GIT_SHA")
        .ok()
        .or_else(|| std::env::var("GITHUB_SHA").ok())
        .map(|s| s.chars().take(12).collect())
}

fn config_from_args(args: &Args) -> HarnessConfig {
    let mut cfg = HarnessConfig::new(args.profile.into());
    if let Some(mode) = args.mode {
        cfg.mode = mode;
    }
    if let Some(trials) = args.trials {
        cfg.trials = trials;
    }
    if let Some(secs) = args.timeout_secs {
        cfg.run_timeout = Some(Duration::from_secs(secs));
    }
    if args.abort_on_failure {
        cfg.failure_policy = FailurePolicy::AbortOnFirst;
    }
    cfg
}

fn run(args: &Args, filter: Option<&str>) -> anyhow::Result<ExitCode> {
    let cfg = config_from_args(args);
    let registry = workloads::standard_registry(&args.data_dir);
    let registry = match filter {
        Some(pattern) => registry.filter(pattern),
        None => registry,
    };
    if registry.is_empty() {
        anyhow::bail!("no cases match the filter pattern");
    }

    let outcome = Runner::new(&registry, &cfg).run(&RunContext::background());
    let report = render_all(&outcome.results, args.format);

    let json = report.to_json_pretty()?;
    match &args.out {
        Some(out) => {
            fs::write(out, json).with_context(|| format!("writing report to {}", out.display()))?;
            info!(path = %out.display(), entries = report.entries.len(), "wrote perf report");
        }
        None => println!("{json}"),
    }

    if let Some(meta_out) = &args.meta_out {
        let summary = RunSummary {
            run: RunMeta {
                schema_version: 1,
                bench_version: env!("CARGO_PKG_VERSION").to_string(),
                profile: cfg.profile.as_str().to_string(),
                mode: cfg.mode.as_str().to_string(),
                report_format: args.format.as_str().to_string(),
                timestamp_utc: now_utc(),
                git_sha: git_sha_short(),
            },
            cases: outcome.outcomes(),
            report_failures: report.failures.iter().map(|e| e.to_string()).collect(),
        };
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(meta_out, json)
            .with_context(|| format!("writing run summary to {}", meta_out.display()))?;
    }

    let failed = outcome.failed_cases();
    if !failed.is_empty() || !outcome.skipped.is_empty() || !report.is_complete() {
        error!(
            failed = ?failed,
            skipped = outcome.skipped.len(),
            report_failures = report.failures.len(),
            "run finished with failures"
        );
        return Ok(ExitCode::FAILURE);
    }

    info!(cases = outcome.results.len(), "run finished");
    Ok(ExitCode::SUCCESS)
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    match &args.cmd {
        Command::Run { filter } => run(&args, filter.as_deref()),
        Command::List => {
            let registry = workloads::standard_registry(&args.data_dir);
            println!("{:<36} {:>8} {:>12} {:>8}", "Case", "Count", "Size", "Runtime");
            println!("{:-<68}", "");
            for case in &registry {
                let size = case
                    .data_size()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<36} {:>8} {:>12} {:>7}s",
                    case.name(),
                    case.count(),
                    size,
                    case.runtime().as_secs()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::GenerateFixtures { seed, depth } => {
            let config = GenerateConfig {
                seed: *seed,
                deep_depth: *depth,
                ..GenerateConfig::default()
            };
            let paths = fixtures::write_fixtures(&args.data_dir, &config)
                .with_context(|| format!("generating fixtures in {}", args.data_dir.display()))?;
            for path in paths {
                let size = fs::metadata(&path)?.len();
                info!(path = %path.display(), bytes = size, "wrote fixture");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::FixtureInfo { path } => {
            let info = fixtures::fixture_info(path)?;
            println!("Fixture: {}", info.path.display());
            println!("  Bytes: {}", info.bytes);
            println!("  Top-level fields: {}", info.top_level_fields);
            println!("  Max depth: {}", info.max_depth);
            println!("  SHA-256: {}", info.sha256);
            Ok(ExitCode::SUCCESS)
        }
    }
}
