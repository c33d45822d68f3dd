use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mpcirc::stats::RunStatistics;
use mpcirc::{execute_rounds, CircuitProgram, EvalConfig, PlainBackend, PlainValue, Protocol};

#[derive(Parser)]
struct Args {
    /// Circuit description file
    #[arg(short, long)]
    circuit: PathBuf,
    /// Protocol in which the INPUT gates share their values
    #[arg(short, long, default_value = "boolean")]
    protocol: Protocol,
    /// Number of evaluation rounds
    #[arg(short = 'i', long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    rounds: u32,
    /// Fixture input value per party
    #[arg(long, value_delimiter = ',', default_value = "1,1")]
    inputs: Vec<u64>,
    /// Share bit width of the reference backend
    #[arg(long, default_value_t = 32)]
    bit_width: u32,
    /// Append a JSONL record of the run. Default output is bench_results_TIMESTAMP.jsonl
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Serialize, Debug)]
struct BenchRecord {
    circuit: PathBuf,
    protocol: Protocol,
    rounds: u32,
    outputs: Vec<PlainValue>,
    mean: RunStatistics,
    total: RunStatistics,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = Args::parse();
    if args.out.is_none() {
        args.out = Some(PathBuf::from(format!(
            "bench_results_{}",
            Local::now().to_rfc3339()
        )));
    }

    let program = CircuitProgram::load(&args.circuit)
        .with_context(|| format!("loading circuit {}", args.circuit.display()))?;
    info!(
        gates = program.gate_count(),
        outputs = program.output_count(),
        "Loaded circuit"
    );
    let config = EvalConfig {
        protocol: args.protocol,
        input_values: args.inputs.clone(),
    };
    let bit_width = args.bit_width;
    let (rounds, accumulated) = execute_rounds(&program, &config, args.rounds as usize, || {
        Ok(PlainBackend::new(bit_width))
    })
    .await?;

    let last = rounds.last().expect("at least one round, checked by args parser");
    println!("output:");
    for value in &last.values {
        println!("{value}");
    }
    println!("--- mean over {} rounds ---", accumulated.rounds);
    println!("{}", accumulated.mean());

    let record = BenchRecord {
        circuit: args.circuit.clone(),
        protocol: args.protocol,
        rounds: args.rounds,
        outputs: last.values.clone(),
        mean: accumulated.mean(),
        total: accumulated.total.clone(),
    };
    write_results(&args, &record)?;
    Ok(())
}

fn write_results(args: &Args, record: &BenchRecord) -> anyhow::Result<()> {
    let mut open_options = File::options();
    open_options.create(true).append(true);
    let out = args.out.clone().unwrap();
    let mut json_file = BufWriter::new(open_options.open(out.with_extension("jsonl"))?);
    serde_json::to_writer(&mut json_file, record)?;
    writeln!(&mut json_file)?;
    Ok(())
}
