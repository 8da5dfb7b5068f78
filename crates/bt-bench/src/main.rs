use anyhow::Context;
use bt_optimizer::{progress_channel, Optimizer, RunConfig, SearchSpace};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Synthetic workload: churn a buffer of `buffer_size` elements with
/// `workers` interleaved passes.
fn workload(buffer_size: u32, workers: u32) -> Result<(), String> {
    if workers > 16 && buffer_size < 64 {
        return Err(format!(
            "{workers} workers cannot share a {buffer_size}-element buffer"
        ));
    }
    let mut buffer: Vec<u64> = Vec::with_capacity(buffer_size as usize);
    for i in 0..250_000u64 {
        if buffer.len() == buffer_size as usize {
            buffer.clear();
        }
        buffer.push(i.wrapping_mul(u64::from(workers)));
    }
    thread::sleep(Duration::from_micros(u64::from(workers) * 20));
    std::hint::black_box(&buffer);
    Ok(())
}

fn load_config() -> anyhow::Result<RunConfig> {
    let mut config = match std::env::var("BT_CONFIG") {
        Ok(path) => RunConfig::from_json_file(&path)
            .with_context(|| format!("failed to load run configuration from {path}"))?,
        Err(_) => RunConfig::default(),
    };
    if let Ok(seed) = std::env::var("BT_SEED") {
        let seed: u64 = seed
            .parse()
            .with_context(|| format!("BT_SEED must be an unsigned integer, got {seed:?}"))?;
        config = config.with_seed(seed);
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    let (tx, rx) = progress_channel(config.total_evaluations());

    let observer = thread::spawn(move || {
        for event in rx.iter() {
            info!(
                phase = %event.phase,
                iteration = event.current_iteration,
                total = event.total_iterations,
                params = ?event.current_params,
                cost = event.last_cost,
                best = event.best_cost_so_far,
                "progress"
            );
        }
    });

    let space = SearchSpace::new()
        .add_range(16u32, 65_536)
        .add_range(1, 32);
    let optimizer = Optimizer::new(config.with_progress(tx), space)?;
    let outcome =
        optimizer.run_benchmark(|params: &[u32]| workload(params[0], params[1]))?;

    if observer.join().is_err() {
        warn!("progress observer panicked");
    }

    let summary = serde_json::json!({
        "run_id": outcome.run_id,
        "best_params": outcome.best_params,
        "best_cost_ns": outcome.best_cost,
        "evaluations": outcome.evaluations(),
        "failed": outcome.failed_trials(),
        "dropped_events": outcome.dropped_events,
        "duration_ms": (outcome.finished_at - outcome.started_at).num_milliseconds(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
