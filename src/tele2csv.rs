use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use roam_rs::telemetry::{pose_deltas, read_pose_records};

/// Convert a binary telemetry log into `left_delta,right_delta,heading_delta`
/// lines, the layout read by the model fitting.
#[derive(Parser, Debug)]
#[command(name = "tele2csv", version)]
struct Args {
    /// Binary log written by the robot (18-byte records)
    input: PathBuf,

    /// Output file. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> roam_rs::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let (records, trailing) = read_pose_records(File::open(&args.input)?)?;
    if trailing > 0 {
        log::warn!(
            "Ignoring {} trailing bytes (partial record) in {}",
            trailing,
            args.input.display()
        );
    }

    let deltas = pose_deltas(&records);
    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for delta in &deltas {
        out.write_all(delta.encode().as_bytes())?;
    }
    out.flush()?;

    log::info!("{} records, {} deltas", records.len(), deltas.len());
    Ok(())
}
