use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use nullinit_core::{
    initializer::{self, Verbosity},
    io::JobConfig,
};
use num_complex::Complex64;

#[derive(Parser, Debug)]
#[command(
    name = "nullinit",
    about = "Spectral null initializer for magnitude-only measurements"
)]
struct Cli {
    /// Path to a TOML job file
    #[arg(short, long)]
    config: PathBuf,
    /// Path to CSV output (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Override the exclusion fraction from the job file
    #[arg(long)]
    gamma: Option<f64>,
    /// Suppress progress logs (stderr)
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if !cli.quiet {
        eprintln!("[cli] loading job {}", cli.config.display());
    }
    let raw = fs::read_to_string(&cli.config)?;
    let mut config: JobConfig = toml::from_str(&raw)?;
    if let Some(gamma) = cli.gamma {
        if !cli.quiet {
            eprintln!("[cli] overriding gamma={gamma}");
        }
        config.gamma = gamma;
    }
    let metrics_recorder = config.metrics.build_recorder()?;
    let operator = config.build_operator()?;
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        Verbosity::Verbose
    };
    let opts = config.init_options(verbosity);
    if !cli.quiet {
        if let Some(dest) = &cli.output {
            eprintln!("[cli] writing CSV to {}", dest.display());
        } else {
            eprintln!("[cli] streaming CSV to stdout");
        }
    }
    let estimate = initializer::null_initializer_with_metrics(
        &operator,
        &config.measurements,
        &opts,
        metrics_recorder.as_ref(),
    )?;
    emit_csv(&estimate, cli.output.as_deref())?;
    if !cli.quiet {
        if let Some(path) = cli.output {
            eprintln!("wrote {} rows to {}", estimate.len(), path.display());
        } else {
            eprintln!("wrote {} rows to stdout", estimate.len());
        }
    }
    Ok(())
}

fn emit_csv(estimate: &[Complex64], dest: Option<&Path>) -> io::Result<()> {
    let mut writer: Box<dyn Write> = match dest {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    writeln!(writer, "index,re,im,abs")?;
    for (idx, value) in estimate.iter().enumerate() {
        writeln!(writer, "{idx},{},{},{}", value.re, value.im, value.norm())?;
    }
    writer.flush()
}
