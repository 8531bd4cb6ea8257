/// Basic usage example: feed motion samples, get counted reps
use rep_sensing::{MotionSample, RepCounter, RepCounterConfig, RepEvent};

/// 60Hz, rounded to whole milliseconds
const PERIOD_MS: u64 = 16;

fn main() {
    println!("=== Rep Sensing Engine: Basic Example ===\n");

    // Refined mode: smoothing, live thresholds, trough-anchored correlation
    let mut counter = match RepCounter::new(RepCounterConfig::default()) {
        Ok(counter) => counter,
        Err(e) => {
            eprintln!("invalid config: {e}");
            return;
        }
    };
    counter.on_rep(print_rep);

    // Simulate a set of three lateral raises, arms resting between them
    let samples = simulate_set(3);
    println!("Processing {} samples...\n", samples.len());

    for sample in &samples {
        if let Err(e) = counter.ingest(sample) {
            eprintln!("rejected sample at {}ms: {e}", sample.timestamp_ms);
        }
    }

    println!("\n=== Summary ===");
    println!("Samples accepted: {}", counter.samples_seen());
    println!("Total reps: {}", counter.count());

    counter.reset();
    println!("After reset: {}", counter.count());
}

fn print_rep(event: &RepEvent) {
    match event.trough_ms {
        Some(trough) => println!(
            "Rep {} at {}ms (rotation trough at {}ms)",
            event.count, event.timestamp_ms, trough
        ),
        None => println!("Rep {} at {}ms", event.count, event.timestamp_ms),
    }
}

fn simulate_set(reps: u64) -> Vec<MotionSample> {
    let cycle = 150;
    (0..reps * cycle)
        .map(|i| {
            let d = ((i % cycle) as f64 - 15.0).abs();
            let lift = if d <= 4.0 { 1.0 - d / 5.0 } else { 0.0 };
            MotionSample::new(
                i * PERIOD_MS,
                -2.5 * lift,
                [0.2 + 0.6 * lift, -0.3 + 0.5 * lift, -0.9 + 0.7 * lift],
            )
        })
        .collect()
}
