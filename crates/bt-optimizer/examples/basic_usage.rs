use bt_optimizer::*;
use std::thread;
use std::time::Duration;

/// Fill and recycle a buffer; smaller buffers churn more, larger ones cost
/// more to touch.
fn churn(buffer_size: usize, multiplier: usize) -> Result<(), String> {
    if buffer_size == 0 {
        return Err("buffer size must be positive".into());
    }
    let mut buffer = Vec::with_capacity(buffer_size);
    for i in 0..200_000 {
        if buffer.len() == buffer_size {
            buffer.clear();
        }
        buffer.push(i * multiplier);
    }
    thread::sleep(Duration::from_micros(buffer_size as u64));
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("BayesTune basic usage example");

    let config = RunConfig::new()
        .with_initial_samples(5)
        .with_iterations(15)
        .with_num_candidates(30)
        .with_acquisition(AcquisitionKind::ExpectedImprovement)
        .with_kernel_width(8.0)
        .with_seed(42);

    let (tx, rx) = progress_channel(config.total_evaluations());
    let observer = thread::spawn(move || {
        for event in rx.iter() {
            println!(
                "[{} {}/{}] params={:?} cost={:.0}ns best={:.0}ns",
                event.phase,
                event.current_iteration,
                event.total_iterations,
                event.current_params,
                event.last_cost,
                event.best_cost_so_far
            );
        }
    });

    let space = SearchSpace::new().add_range(1usize, 512).add_range(1, 4);
    let optimizer = Optimizer::new(config.with_progress(tx), space)?;
    let outcome = optimizer.run_benchmark(|params: &[usize]| churn(params[0], params[1]))?;

    observer.join().expect("observer thread panicked");

    println!(
        "Best parameters {:?} at {:.0}ns after {} evaluations ({} failed)",
        outcome.best_params,
        outcome.best_cost,
        outcome.evaluations(),
        outcome.failed_trials()
    );

    Ok(())
}
