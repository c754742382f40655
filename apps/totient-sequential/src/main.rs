//! Sequential Totient Range Calculator
//!
//! This application computes the sum of Euler's totient function phi(n)
//! over an inclusive range [lower, upper] without any parallelization.
//! Used as a correctness baseline and for performance comparison.

use clap::Parser;
use std::time::Instant;

/// Sequential totient range sum using repeated coprimality tests
#[derive(Parser, Debug)]
#[command(name = "totient-sequential")]
#[command(about = "Sum Euler's totient function over a range sequentially", long_about = None)]
struct Args {
    /// Lower bound of the range (inclusive)
    #[arg(short, long, default_value_t = 1)]
    lower: i64,

    /// Upper bound of the range (inclusive)
    #[arg(short, long, default_value_t = 10_000)]
    upper: i64,

    /// Show phi(n) for every n in the range (warning: can be very long)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Output results in CSV format for benchmarking
    #[arg(long, default_value_t = false)]
    csv: bool,
}

/// Greatest common divisor via the Euclidean remainder algorithm
///
/// Repeatedly replaces (x, y) with (y, x mod y) until y reaches 0;
/// the remaining x is the gcd. Inputs must be non-negative.
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

/// Euler's totient function phi(n)
///
/// Counts the integers i in [1, n-1] that are coprime with n, by direct
/// coprimality testing. Each element costs up to n gcd evaluations, which
/// is what makes the range sum an interesting load for the parallel
/// variants.
///
/// phi(1) = 0 under this counting convention (the loop body never runs).
///
/// # Precondition
///
/// `n >= 1`. Behavior for smaller inputs is undefined and not guarded.
fn totient(n: i64) -> i64 {
    let mut length = 0;
    for i in 1..n {
        if is_coprime(n, i) {
            length += 1;
        }
    }
    length
}

/// Sum of phi(i) for i in [lo, hi] inclusive
///
/// An inverted range (`lo > hi`) is the empty sum and yields 0.
fn totient_range_sum(lo: i64, hi: i64) -> i64 {
    let mut sum = 0;
    for i in lo..=hi {
        sum += totient(i);
    }
    sum
}

/// Calculate basic statistics about the totient distribution
fn calculate_statistics(sum: i64, lower: i64, upper: i64) -> TotientStatistics {
    let count = if upper >= lower { upper - lower + 1 } else { 0 };

    // Average phi(n) across the range
    let mean = if count > 0 {
        sum as f64 / count as f64
    } else {
        0.0
    };

    // Asymptotically, the sum of phi(n) for n <= x approaches 3x²/π²,
    // so the range sum approaches 3(upper² - (lower-1)²)/π²
    let theoretical = if count > 0 {
        let hi = upper as f64;
        let lo = (lower - 1) as f64;
        (3.0 * (hi * hi - lo * lo) / (std::f64::consts::PI * std::f64::consts::PI)) as i64
    } else {
        0
    };

    TotientStatistics {
        sum,
        count,
        mean,
        theoretical,
    }
}

struct TotientStatistics {
    sum: i64,
    count: i64,
    mean: f64,
    theoretical: i64,
}

fn main() {
    let args = Args::parse();

    // Print configuration (unless CSV mode)
    if !args.csv {
        println!("═══════════════════════════════════════════════════════════");
        println!("       SEQUENTIAL TOTIENT RANGE CALCULATOR");
        println!("═══════════════════════════════════════════════════════════");
        println!("Configuration:");
        println!("  Range: {} to {}", args.lower, args.upper);
        println!("  Algorithm: coprimality counting via Euclidean gcd");
        println!("  Mode: Sequential (single-threaded)");
        println!("═══════════════════════════════════════════════════════════");
        println!("\nSumming totients...\n");
    }

    // Start timing
    let start_time = Instant::now();

    // Run the kernel over the whole range
    let sum = totient_range_sum(args.lower, args.upper);

    // Stop timing
    let elapsed = start_time.elapsed();

    // Calculate statistics
    let stats = calculate_statistics(sum, args.lower, args.upper);

    // Output results
    if args.csv {
        // CSV format: lower,upper,threads,time_ms,sum
        println!(
            "{},{},{},{:.3},{}",
            args.lower,
            args.upper,
            1, // threads = 1 for sequential
            elapsed.as_secs_f64() * 1000.0,
            stats.sum
        );
    } else {
        println!("═══════════════════════════════════════════════════════════");
        println!("                      RESULTS");
        println!("═══════════════════════════════════════════════════════════");
        println!("  Totient sum:         {:>12}", stats.sum);
        println!("  Range size:          {:>12}", stats.count);
        println!("  Mean phi(n):         {:>12.3}", stats.mean);
        println!("  Asymptotic estimate: {:>12} (3(u²-(l-1)²)/π²)", stats.theoretical);
        println!("───────────────────────────────────────────────────────────");
        println!("  Execution time:      {:>12.3} ms", elapsed.as_secs_f64() * 1000.0);
        println!("  Execution time:      {:>12.6} s", elapsed.as_secs_f64());
        println!("═══════════════════════════════════════════════════════════");

        // Show individual totients if verbose mode
        if args.verbose {
            println!("\nTotient values in range:");
            for (i, n) in (args.lower..=args.upper).enumerate() {
                if i > 0 && i % 10 == 0 {
                    println!();
                }
                print!("{:>8} ", totient(n));
            }
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(12, 8), 4);
        assert_eq!(gcd(8, 12), 4);
        assert_eq!(gcd(17, 5), 1);
        assert_eq!(gcd(10, 0), 10);
        assert_eq!(gcd(0, 10), 10);
    }

    #[test]
    fn test_totient_small_values() {
        // phi(1) = 0 under the [1, n-1] counting convention
        assert_eq!(totient(1), 0);
        assert_eq!(totient(2), 1);
        assert_eq!(totient(3), 2);
        assert_eq!(totient(4), 2);
        assert_eq!(totient(9), 6);
        assert_eq!(totient(10), 4);
    }

    #[test]
    fn test_totient_of_primes() {
        // phi(p) = p - 1 for any prime p
        for p in [2, 3, 5, 7, 11, 13, 101] {
            assert_eq!(totient(p), p - 1);
        }
    }

    #[test]
    fn test_range_sum_1_to_10() {
        // 0 + 1 + 2 + 2 + 4 + 2 + 6 + 4 + 6 + 4
        assert_eq!(totient_range_sum(1, 10), 31);
    }

    #[test]
    fn test_range_sum_1_to_100() {
        assert_eq!(totient_range_sum(1, 100), 3043);
    }

    #[test]
    fn test_single_element_range() {
        assert_eq!(totient_range_sum(10, 10), 4);
    }

    #[test]
    fn test_inverted_range_is_empty_sum() {
        assert_eq!(totient_range_sum(5, 1), 0);
    }
}
