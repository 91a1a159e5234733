use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use log::info;

use bdd_sampler::emit::OutputFormat;
use bdd_sampler::pipeline::{run, RunConfig};
use bdd_sampler::sample::SamplerConfig;
use bdd_sampler::weight::WeightingKind;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Input constraint document (JSON).
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Number of assignments to draw.
    #[arg(short = 'n', long, value_name = "INT", default_value = "5")]
    samples: usize,

    /// Output file (default: stdout).
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Seed of the random generator (default: from the OS).
    #[arg(long, value_name = "INT")]
    seed: Option<u64>,

    /// Edge weighting: `exact` (uniform over solutions) or `paths`.
    #[arg(long, value_name = "STRATEGY", default_value = "exact")]
    weighting: WeightingKind,

    /// Output format: `text` or `json`.
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    format: OutputFormat,

    /// Write the combined diagram in DOT format to this file.
    #[arg(long, value_name = "FILE")]
    dot: Option<PathBuf>,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    let level = match args.verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let input = std::fs::read_to_string(&args.input)
        .wrap_err_with(|| format!("Failed to read {}", args.input.display()))?;

    let mut sampler = SamplerConfig::default()
        .with_num_samples(args.samples)
        .with_weighting(args.weighting);
    if let Some(seed) = args.seed {
        sampler = sampler.with_seed(seed);
    }
    let config = RunConfig {
        sampler,
        format: args.format,
        dot: args.dot.clone(),
        ..RunConfig::default()
    };

    // Render into memory first, so a failed run leaves no partial output behind.
    let mut buffer = Vec::new();
    let assignments = run(&input, &mut buffer, &config)?;

    match &args.output {
        Some(path) => {
            let mut out = BufWriter::new(
                File::create(path).wrap_err_with(|| format!("Failed to create {}", path.display()))?,
            );
            out.write_all(&buffer)?;
            out.flush()?;
        }
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(&buffer)?;
            out.flush()?;
        }
    }

    info!(
        "Wrote {} assignments in {:.3} s",
        assignments.len(),
        time_total.elapsed().as_secs_f64()
    );
    Ok(())
}
