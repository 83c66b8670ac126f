use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use treeshift_core::{export, logging, source, Config, Frame, Playback};

#[derive(Parser, Debug)]
#[command(name = "treeshift-cli", about = "Headless treemap playback")]
struct Args {
    /// Data file: a JSON array of slices, optionally wrapped in `const dataJson = ...;`
    data: PathBuf,
    /// JSON config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Ticks to play after the initial frame (default: one full cycle)
    #[arg(short, long)]
    ticks: Option<usize>,
    /// Sleep one tick interval between ticks
    #[arg(long)]
    realtime: bool,
    /// Write every frame's transition plan as a JSON array
    #[arg(short, long)]
    json: Option<PathBuf>,
    /// Write the last rendered frame's leaves as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    logging::init("info");
    let args = Args::parse();

    let series = source::load_series(&args.data)
        .with_context(|| format!("reading {}", args.data.display()))?;
    let config = match &args.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("reading config {}", path.display()))?
        }
        None => Config::default(),
    };
    let ticks = args.ticks.unwrap_or(series.len());
    let mut playback = Playback::new(series, config).context("starting playback")?;

    let mut frames: Vec<serde_json::Value> = Vec::new();
    let mut last: Option<Frame> = None;
    let mut failed = 0usize;
    let mut record = |frame: Frame| {
        tracing::info!(
            slice = frame.slice_index,
            label = %frame.label,
            enter = frame.plan.enters.len(),
            update = frame.plan.updates.len(),
            exit = frame.plan.exits.len(),
            "frame"
        );
        if args.json.is_some() {
            frames.push(export::to_json(&frame));
        }
        last = Some(frame);
    };

    match playback.initial_frame() {
        Ok(frame) => record(frame),
        Err(e) => {
            failed += 1;
            tracing::warn!(error = %e, "initial frame failed");
        }
    }
    playback.run_for(ticks, args.realtime, |result| match result {
        Ok(frame) => record(frame),
        Err(_) => failed += 1,
    });

    if let Some(path) = &args.json {
        let text = serde_json::to_string_pretty(&frames)?;
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &args.csv {
        let frame = last
            .as_ref()
            .context("no frame rendered successfully, nothing to write")?;
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        export::to_csv(frame.plan.leaves(), BufWriter::new(file))?;
    }

    println!(
        "Played {} ticks, {} failed",
        ticks + 1,
        failed
    );
    Ok(())
}
