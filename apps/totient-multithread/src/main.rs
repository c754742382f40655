//! Multithreaded Totient Range Calculator
//!
//! This application computes the sum of Euler's totient function phi(n)
//! over an inclusive range [lower, upper] using a rayon thread pool for
//! parallel processing.
//!
//! # Parallelization Strategy
//!
//! 1. Divide the range into contiguous segments, one per thread
//! 2. Each segment's totient sum is independent of every other segment
//!    (no synchronization needed during computation!)
//! 3. Reduce the per-segment partial sums by addition

use clap::Parser;
use rayon::prelude::*;
use std::time::Instant;

/// Multithreaded totient range sum using contiguous segments
#[derive(Parser, Debug)]
#[command(name = "totient-multithread")]
#[command(about = "Sum Euler's totient function using multiple threads", long_about = None)]
struct Args {
    /// Lower bound of the range (inclusive)
    #[arg(short, long, default_value_t = 1)]
    lower: i64,

    /// Upper bound of the range (inclusive)
    #[arg(short, long, default_value_t = 10_000)]
    upper: i64,

    /// Number of threads to use
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Output results in CSV format for benchmarking
    #[arg(long, default_value_t = false)]
    csv: bool,
}

/// Greatest common divisor via the Euclidean remainder algorithm
fn gcd(mut x: i64, mut y: i64) -> i64 {
    while y != 0 {
        let t = x % y;
        x = y;
        y = t;
    }
    x
}

/// Two integers are coprime when their gcd is exactly 1
fn is_coprime(x: i64, y: i64) -> bool {
    gcd(x, y) == 1
}

/// Euler's totient function phi(n): the count of integers in [1, n-1]
/// coprime with n. phi(1) = 0. Precondition: `n >= 1`.
fn totient(n: i64) -> i64 {
    let mut length = 0;
    for i in 1..n {
        if is_coprime(n, i) {
            length += 1;
        }
    }
    length
}

/// Sum of phi(i) for i in [lo, hi] inclusive; 0 when `lo > hi`
fn totient_range_sum(lo: i64, hi: i64) -> i64 {
    let mut sum = 0;
    for i in lo..=hi {
        sum += totient(i);
    }
    sum
}

/// Split [lower, upper] into at most `num_threads` contiguous segments
///
/// Segment length is the ceiling of range_size / num_threads, so the final
/// segment may be shorter; together the segments cover the range exactly
/// once with no overlap.
fn split_range(lower: i64, upper: i64, num_threads: usize) -> Vec<(i64, i64)> {
    if lower > upper {
        return vec![];
    }

    let range_size = upper - lower + 1;
    let segment_size = (range_size + num_threads as i64 - 1) / num_threads as i64;

    let mut segments = vec![];
    for thread_id in 0..num_threads as i64 {
        let seg_low = lower + thread_id * segment_size;
        let seg_high = std::cmp::min(seg_low + segment_size - 1, upper);

        // Skip if this thread has no work (can happen with short ranges)
        if seg_low > upper {
            continue;
        }

        segments.push((seg_low, seg_high));
    }
    segments
}

/// Per-segment outcome: (low, high, partial sum)
type SegmentMetrics = Vec<(i64, i64, i64)>;

/// Parallel totient range sum over a pool of `num_threads` threads
///
/// Returns the total and the per-segment breakdown. The per-segment sums
/// are folded by addition, so the result is identical to the sequential
/// kernel regardless of thread count or completion order.
fn parallel_totient_sum(lower: i64, upper: i64, num_threads: usize) -> (i64, SegmentMetrics) {
    let segments = split_range(lower, upper, num_threads);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .expect("Failed to build thread pool");

    let metrics: SegmentMetrics = pool.install(|| {
        segments
            .par_iter()
            .map(|&(seg_low, seg_high)| (seg_low, seg_high, totient_range_sum(seg_low, seg_high)))
            .collect()
    });

    let total = metrics.iter().map(|&(_, _, partial)| partial).sum();

    (total, metrics)
}

fn main() {
    let args = Args::parse();

    // Validate thread count
    let num_threads = if args.threads == 0 { 1 } else { args.threads };

    if !args.csv {
        println!("═══════════════════════════════════════════════════════════");
        println!("       MULTITHREADED TOTIENT RANGE CALCULATOR");
        println!("═══════════════════════════════════════════════════════════");
        println!("Configuration:");
        println!("  Range: {} to {}", args.lower, args.upper);
        println!("  Threads: {}", num_threads);
        println!("  Algorithm: segmented coprimality counting");
        println!("  Mode: Parallel (rayon thread pool)");
        println!("═══════════════════════════════════════════════════════════");
        println!("\nSumming totients...\n");
    }

    // Start timing
    let start_time = Instant::now();

    // Run the parallel sum
    let (sum, metrics) = parallel_totient_sum(args.lower, args.upper, num_threads);

    // Stop timing
    let elapsed = start_time.elapsed();

    if args.csv {
        // CSV format: lower,upper,threads,time_ms,sum
        println!(
            "{},{},{},{:.3},{}",
            args.lower,
            args.upper,
            num_threads,
            elapsed.as_secs_f64() * 1000.0,
            sum
        );
    } else {
        println!("═══════════════════════════════════════════════════════════");
        println!("                      RESULTS");
        println!("═══════════════════════════════════════════════════════════");
        println!("  Totient sum:         {:>12}", sum);
        println!("───────────────────────────────────────────────────────────");
        println!("  Execution time:      {:>12.3} ms", elapsed.as_secs_f64() * 1000.0);
        println!("  Execution time:      {:>12.6} s", elapsed.as_secs_f64());
        println!("───────────────────────────────────────────────────────────");
        println!("  Segment Metrics:");

        for (i, (low, high, partial)) in metrics.iter().enumerate() {
            println!(
                "    Segment {}: [{:>10}, {:>10}] -> sum {}",
                i, low, high, partial
            );
        }

        println!("═══════════════════════════════════════════════════════════");
    }
}
