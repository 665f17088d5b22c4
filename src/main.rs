//! jsonbench CLI.
//!
//! Report output goes to stdout, logs to stderr. Setup errors exit with 2,
//! failed checks with 1.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jsonbench::bench::{Aggregator, BenchDriver};
use jsonbench::conformance::{run_probes, DifferentialRunner, SuiteOutcome, SuiteRunner};
use jsonbench::registry::{self, CodecDescriptor};
use jsonbench::{BenchConfig, Corpus, GoldenMode, HarnessConfig, HarnessError, HarnessResult};

#[derive(Parser)]
#[command(name = "jsonbench")]
#[command(about = "Differential testing and benchmarking for JSON codecs", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the gzip fixtures
    #[arg(long, global = true, default_value = "testdata")]
    testdata: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered codecs and their capability slots
    Codecs,

    /// Check every codec against the reference decode of the corpus
    Roundtrip {
        /// Only these fixtures
        #[arg(long = "fixture")]
        fixtures: Vec<String>,
        /// Only these codecs
        #[arg(long = "codec")]
        codecs: Vec<String>,
        /// Write a JSON repro bundle per diverging unit into this directory
        #[arg(long)]
        repro_dir: Option<PathBuf>,
    },

    /// Run the behavior probes against the recorded expectations
    Probe {
        /// Only these codecs
        #[arg(long = "codec")]
        codecs: Vec<String>,
    },

    /// Run the conformance suite against the golden file
    Suite {
        /// Suite directory, defaults to <testdata>/JSONTestSuite
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Golden file name inside the suite directory
        #[arg(long, default_value = "results.json")]
        golden: String,
        /// Rewrite the golden file instead of checking it
        #[arg(long)]
        update: bool,
    },

    /// Time every codec slot on the corpus
    Bench {
        /// Only these fixtures
        #[arg(long = "fixture")]
        fixtures: Vec<String>,
        /// Only these codecs
        #[arg(long = "codec")]
        codecs: Vec<String>,
        /// Minimum seconds per benchmark
        #[arg(long, default_value_t = 1.0)]
        benchtime: f64,
        /// Repetitions of each benchmark
        #[arg(long, default_value_t = 1)]
        count: u32,
        /// Only benchmarks whose name contains this
        #[arg(long)]
        filter: Option<String>,
    },

    /// Tabulate benchmark logs relative to the first codec
    Aggregate {
        /// Benchmark logs
        #[arg(default_value = "results.log")]
        files: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> HarnessResult<ExitCode> {
    let base = HarnessConfig::rooted(&cli.testdata);
    match cli.command {
        Commands::Codecs => {
            for codec in registry::codecs() {
                let ops: Vec<&str> = codec.ops().iter().map(|op| op.name()).collect();
                println!("{}\t{}\t{}", codec.name, ops.join(","), codec.label);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Roundtrip {
            fixtures,
            codecs,
            repro_dir,
        } => {
            let config = base.with_fixture_names(&fixtures)?;
            let corpus = Corpus::load_fixtures(&config.testdata_dir, config.selected_fixtures())?;
            let runner = DifferentialRunner::new(&corpus)?.with_codecs(select(&codecs)?);
            let results = runner.run_all();

            for failure in &results.failures {
                println!("{}", failure.repro.to_report());
                if let Some(dir) = &repro_dir {
                    let path = failure.repro.save(dir)?;
                    println!("saved {}", path.display());
                }
            }
            for error in &results.error_details {
                println!("ERROR {}: {}", error.name, error.message);
            }
            println!("{}", results.summary());
            Ok(status(results.all_passed()))
        }
        Commands::Probe { codecs } => {
            let report = run_probes(&select(&codecs)?);
            for result in &report.results {
                let mark = if result.is_mismatch() { "MISMATCH" } else { "ok" };
                println!("{mark}\t{}", result.describe());
            }
            println!("{}", report.summary());
            Ok(status(report.all_matched()))
        }
        Commands::Suite {
            dir,
            golden,
            update,
        } => {
            let config = HarnessConfig {
                suite_dir: dir.unwrap_or_else(|| base.suite_dir.clone()),
                golden,
                mode: GoldenMode::from_flag(update),
                ..base
            };
            let runner = SuiteRunner::load(&config.suite_dir, &config.golden)?;
            let all: Vec<&'static CodecDescriptor> = registry::codecs().iter().collect();
            match runner.execute(&all, config.mode)? {
                SuiteOutcome::Updated(path) => {
                    println!("updated {}", path.display());
                    Ok(ExitCode::SUCCESS)
                }
                SuiteOutcome::Checked(diffs) => {
                    for diff in &diffs {
                        println!("{diff}");
                    }
                    println!(
                        "{} documents, {} golden entries differ",
                        runner.cases().len(),
                        diffs.len()
                    );
                    Ok(status(diffs.is_empty()))
                }
            }
        }
        Commands::Bench {
            fixtures,
            codecs,
            benchtime,
            count,
            filter,
        } => {
            let config = base.with_fixture_names(&fixtures)?;
            let corpus = Corpus::load_fixtures(&config.testdata_dir, config.selected_fixtures())?;
            let bench = BenchConfig {
                min_time: Duration::try_from_secs_f64(benchtime).unwrap_or(Duration::ZERO),
                count,
                filter,
            };
            let driver = BenchDriver::new(&corpus, bench)?.with_codecs(select(&codecs)?);
            driver.run(|result| println!("{result}"));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Aggregate { files } => {
            let mut aggregator = Aggregator::new();
            for path in files {
                let file = File::open(&path).map_err(|e| HarnessError::io(&path, e))?;
                aggregator
                    .read(BufReader::new(file))
                    .map_err(|e| HarnessError::io(&path, e))?;
            }
            print!("{}", aggregator.render());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// The named codecs, or all of them.
fn select(names: &[String]) -> HarnessResult<Vec<&'static CodecDescriptor>> {
    if names.is_empty() {
        return Ok(registry::codecs().iter().collect());
    }
    names.iter().map(|n| registry::lookup(n)).collect()
}

fn status(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
