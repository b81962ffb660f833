use anyhow::{bail, Context, Result};
use diagnostic_engine::Reading;
use diagnostic_service::{
    config::MAX_SIMULATED_FLEET, observability, pipeline::Pipeline, sinks::ReadingsCsvSink,
    sources::SimulatedFleetSource,
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: simulate_fleet <out_csv_path> [count] [seed]");
    }
    let out_path = &args[1];
    let count: usize = match args.get(2) {
        Some(s) => s.parse().with_context(|| format!("invalid count '{s}'"))?,
        None => 11,
    };
    if count > MAX_SIMULATED_FLEET {
        bail!("count {count} exceeds the limit of {MAX_SIMULATED_FLEET}");
    }
    let seed: u64 = match args.get(3) {
        Some(s) => s.parse().with_context(|| format!("invalid seed '{s}'"))?,
        None => 42,
    };

    let pipeline: Pipeline<_, Reading, _> = Pipeline {
        source: SimulatedFleetSource::new(count, seed, true),
        transforms: Vec::new(),
        sink: ReadingsCsvSink::new(out_path),
    };

    pipeline.run().await?;

    Ok(())
}
