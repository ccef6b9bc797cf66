use clap::Parser;
use hdrhistogram::Histogram;
use residency_match::{Applicant, Engine, MatchConfig, MatchStats, Residency};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Measure full-run latency over a generated market
#[derive(Parser, Debug)]
#[command(name = "latency-report")]
struct Args {
    /// Number of applicants
    #[arg(long, default_value_t = 2_000)]
    applicants: usize,

    /// Number of residencies
    #[arg(long, default_value_t = 200)]
    residencies: usize,

    /// Residencies ranked by each applicant
    #[arg(long, default_value_t = 10)]
    list_len: usize,

    /// Positions per residency
    #[arg(long, default_value_t = 8)]
    capacity: u32,

    /// Timed runs
    #[arg(long, default_value_t = 200)]
    iterations: u64,
}

/// Deterministic market with overlapping, conflicting preferences.
fn generate(args: &Args) -> (Vec<Applicant>, Vec<Residency>) {
    let n = args.applicants.max(1);
    let m = args.residencies.max(1);

    let applicants = (0..n)
        .map(|i| {
            let prefs = (0..args.list_len.min(m)).map(|k| format!("R{}", (i * 7 + k * 13) % m));
            let mut seen = Vec::new();
            for p in prefs {
                if !seen.contains(&p) {
                    seen.push(p);
                }
            }
            Applicant::new(format!("A{i}"), seen)
        })
        .collect();

    let residencies = (0..m)
        .map(|j| {
            let mut ranking: Vec<usize> = (0..n).collect();
            ranking.sort_by_key(|&i| ((i * 31 + j * 17) % n, i));
            Residency::new(
                format!("R{j}"),
                ranking.into_iter().map(|i| format!("A{i}")),
                args.capacity,
            )
        })
        .collect();

    (applicants, residencies)
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("residency_match=info,latency_report=info")),
        )
        .with_target(false)
        .without_time()
        .init();

    info!(
        applicants = args.applicants,
        residencies = args.residencies,
        list_len = args.list_len,
        capacity = args.capacity,
        "preparing latency benchmark"
    );

    let (applicants, residencies) = generate(&args);
    let config = MatchConfig::for_population(applicants.len(), residencies.len()).with_verify(false);

    let mut histogram = Histogram::<u64>::new_with_bounds(1, 60_000_000_000, 3)
        .expect("histogram bounds are valid");
    let mut total_duration = std::time::Duration::new(0, 0);
    let mut last_stats = MatchStats::default();

    for _ in 0..args.iterations {
        let mut engine = match Engine::from_populations(
            applicants.clone(),
            residencies.clone(),
            config.clone(),
        ) {
            Ok(engine) => engine,
            Err(err) => {
                eprintln!("invalid market: {err}");
                std::process::exit(1);
            }
        };

        // Critical measurement section
        let start = Instant::now();
        let result = std::hint::black_box(engine.run());
        let elapsed = start.elapsed();

        match result {
            Ok(stats) => last_stats = stats,
            Err(err) => {
                eprintln!("run failed: {err}");
                std::process::exit(1);
            }
        }

        histogram.record(elapsed.as_nanos() as u64).unwrap_or(());
        total_duration += elapsed;
    }

    println!("\n=== Run Latency (ns) ===");
    println!("Runs:       {}", args.iterations);
    println!("Proposals:  {} per run", last_stats.proposals);
    println!("Evictions:  {} per run", last_stats.evictions);
    println!("Matched:    {} / {}", last_stats.matched, last_stats.matched + last_stats.unmatched);
    println!(
        "Throughput: {:.2} runs/sec",
        args.iterations as f64 / total_duration.as_secs_f64()
    );
    println!("---------------------------");
    println!("Min:    {:12} ns", histogram.min());
    println!("P50:    {:12} ns", histogram.value_at_quantile(0.50));
    println!("P90:    {:12} ns", histogram.value_at_quantile(0.90));
    println!("P99:    {:12} ns", histogram.value_at_quantile(0.99));
    println!("Max:    {:12} ns", histogram.max());
    println!("---------------------------");
}
