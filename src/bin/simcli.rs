//! simcli — a thin command-line front end over `waveform_core`.
//!
//! Reads a waveform from a CSV file (first column is the time or frequency
//! axis, remaining columns are real-valued signals) and either extracts
//! metrics, evaluates an expression against the loaded signals, or
//! re-exports the data in another format.
//!
//! # Usage
//! ```bash
//! simcli metrics --input trace.csv --topology op-amp
//! simcli eval --input trace.csv --expr "db(V(out))"
//! simcli export --input trace.csv --output trace.npz
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use waveform_core::model::{Axis, AxisKind, Signal, SimulationData};
use waveform_core::{eval, export, metrics};

#[derive(Parser)]
#[command(name = "simcli")]
#[command(about = "Simulation result analysis core CLI")]
#[command(version)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract a metric catalogue from a CSV waveform trace.
    Metrics {
        #[arg(long)]
        input: PathBuf,
        /// Circuit topology tag; auto-detects the metric families when omitted.
        #[arg(long)]
        topology: Option<CliTopology>,
    },
    /// Evaluate a whitelisted expression against the loaded signals.
    Eval {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        expr: String,
    },
    /// Re-export a CSV waveform trace to another supported format.
    Export {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CliTopology {
    Amplifier,
    OpAmp,
    Ldo,
    DcDc,
    Oscillator,
    Filter,
    Adc,
    Dac,
    Digital,
}

impl From<CliTopology> for metrics::Topology {
    fn from(t: CliTopology) -> Self {
        match t {
            CliTopology::Amplifier => metrics::Topology::Amplifier,
            CliTopology::OpAmp => metrics::Topology::OpAmp,
            CliTopology::Ldo => metrics::Topology::Ldo,
            CliTopology::DcDc => metrics::Topology::DcDc,
            CliTopology::Oscillator => metrics::Topology::Oscillator,
            CliTopology::Filter => metrics::Topology::Filter,
            CliTopology::Adc => metrics::Topology::Adc,
            CliTopology::Dac => metrics::Topology::Dac,
            CliTopology::Digital => metrics::Topology::Digital,
        }
    }
}

/// Loads a CSV trace: first column is the axis, remaining columns become
/// real-valued signals named after their header. The axis kind is
/// inferred from the header name (`frequency`/`freq` → AC, else time).
fn load_csv(path: &PathBuf) -> Result<SimulationData> {
    let mut reader = csv::ReaderBuilder::new()
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        anyhow::bail!("{} has no header row", path.display());
    }
    let axis_kind = match headers.get(0).unwrap_or("").to_lowercase().as_str() {
        "frequency" | "freq" | "f" => AxisKind::Frequency,
        _ => AxisKind::Time,
    };

    let mut axis_values = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len() - 1];
    for record in reader.records() {
        let record = record?;
        axis_values.push(record.get(0).unwrap_or("0").parse::<f64>().unwrap_or(0.0));
        for (i, col) in columns.iter_mut().enumerate() {
            col.push(record.get(i + 1).unwrap_or("0").parse::<f64>().unwrap_or(0.0));
        }
    }

    let axis = Axis::new(axis_kind, axis_values)?;
    let mut data = SimulationData::new(axis);
    for (i, values) in columns.into_iter().enumerate() {
        let name = headers.get(i + 1).unwrap_or("signal").to_string();
        data = data.with_signal(name, Signal::Real(values))?;
    }
    Ok(data)
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    match args.command {
        Command::Metrics { input, topology } => {
            let data = load_csv(&input)?;
            let results = match topology {
                Some(t) => metrics::extract_metrics(&data, t.into()),
                None => metrics::extract_all_metrics(&data),
            };
            let mut names: Vec<_> = results.keys().cloned().collect();
            names.sort();
            for name in names {
                let m = &results[&name];
                match m.value {
                    Some(v) => println!("{name}: {v:.6} {}", m.unit),
                    None => println!("{name}: error ({})", m.error_message.as_deref().unwrap_or("unknown")),
                }
            }
        }
        Command::Eval { input, expr } => {
            let data = load_csv(&input)?;
            let result = eval::evaluate(&expr, &data).with_context(|| format!("evaluating '{expr}'"))?;
            let values = result.real_part();
            println!("{} = [{} points]", result.name, values.len());
            for (x, y) in data.axis.values().iter().zip(values.iter()).take(10) {
                println!("  {x:.6}\t{y:.6}");
            }
            if values.len() > 10 {
                println!("  ... ({} more)", values.len() - 10);
            }
        }
        Command::Export { input, output } => {
            let data = load_csv(&input)?;
            let ext = output.extension().and_then(|e| e.to_str()).unwrap_or("");
            let format = export::ExportFormat::from_extension(ext)
                .with_context(|| format!("unrecognised export extension '{ext}'"))?;
            let result = export::export(&data, &output, format)?;
            if result.success {
                info!(path = %result.path, signals = result.signal_count, points = result.point_count, "export complete");
                println!("wrote {} ({} signals, {} points)", result.path, result.signal_count, result.point_count);
            } else {
                anyhow::bail!(result.error.unwrap_or_else(|| "export failed".to_string()));
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    run()
}
