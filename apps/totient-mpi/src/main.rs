//! Distributed Totient Range Calculator using MPI
//!
//! This application computes the sum of Euler's totient function phi(n)
//! over an inclusive range [lower, upper] across multiple processes using
//! the Message Passing Interface (MPI) for communication.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        MPI Cluster                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   ┌─────────────┐     ┌─────────────┐     ┌─────────────┐      │
//! │   │   Rank 0    │     │   Rank 1    │     │   Rank 2    │      │
//! │   │(Coordinator)│     │  (Worker)   │     │  (Worker)   │      │
//! │   │             │     │             │     │             │      │
//! │   │ partitions  │────▶│ [lo₁, hi₁]  │     │ [lo₂, hi₂]  │      │
//! │   │ + reduces   │────▶│             │     │             │      │
//! │   └──────▲──────┘     └──────┬──────┘     └──────┬──────┘      │
//! │          │                   │                   │              │
//! │          └──────partial──────┴──────partial──────┘              │
//! │                              │                                  │
//! │                              ▼                                  │
//! │                     ┌─────────────┐                             │
//! │                     │  Total sum  │                             │
//! │                     └─────────────┘                             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The coordinator (rank 0) does no totient work itself: it splits the
//! range into one contiguous chunk per worker, sends each chunk as two
//! tagged scalar messages (start, then end), and folds the workers'
//! tagged partial sums into the total. With a single process there is
//! nothing to coordinate and the sum is computed directly.
//!
//! # Usage
//!
//! ```bash
//! # With MPI (requires mpirun, build with --features mpi)
//! mpirun -np 4 ./totient-mpi 1 15000
//!
//! # Without MPI (single process fallback)
//! ./totient-mpi 1 15000
//!
//! # TCP fallback: one master, two workers on the same host
//! ./totient-mpi 1 15000 --tcp --workers 2 &
//! ./totient-mpi 0 0 --worker &
//! ./totient-mpi 0 0 --worker
//! ```

use clap::Parser;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Instant;

/// Message tag for a range assignment (two scalar sends: start, then end)
const TAG_RANGE: i32 = 1;

/// Message tag for a worker's partial sum (one scalar send)
const TAG_RESULT: i32 = 2;

/// Distributed totient range sum over MPI or a TCP fallback
#[derive(Parser, Debug, Clone)]
#[command(name = "totient-mpi")]
#[command(about = "Sum Euler's totient function across distributed processes", long_about = None)]
struct Args {
    /// Lower bound of the range (inclusive)
    lower: i64,

    /// Upper bound of the range (inclusive)
    upper: i64,

    /// Use TCP fallback instead of MPI
    #[arg(long, default_value_t = false)]
    tcp: bool,

    /// TCP master address (for TCP mode)
    #[arg(long, default_value = "127.0.0.1:7878")]
    master_addr: String,

    /// Number of workers (for TCP master mode)
    #[arg(long, default_value_t = 2)]
    workers: usize,

    /// Run as TCP worker (the range arguments are ignored; the
    /// assignment arrives from the master)
    #[arg(long, default_value_t = false)]
    worker: bool,

    /// Verbose output (per-worker breakdown)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Output in CSV format
    #[arg(long, default_value_t = false)]
    csv: bool,
}

/// Greatest common divisor via the Euclidean remainder algorithm
///
/// Repeatedly replaces (x, y) with (y, x mod y) until y reaches 0.
/// Inputs must be non-negative.
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

/// Euler's totient function phi(n): the count of integers i in [1, n-1]
/// with gcd(n, i) = 1. phi(1) = 0 (the loop body never runs).
///
/// # Precondition
///
/// `n >= 1`. Smaller inputs are undefined and deliberately not guarded;
/// the kernel stays branch-free beyond the coprimality test itself.
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
/// This is the unit of work handed to each worker, and the whole job in
/// the single-process path. An inverted range (`lo > hi`) is the empty
/// sum and yields 0.
fn totient_range_sum(lo: i64, hi: i64) -> i64 {
    let mut sum = 0;
    for i in lo..=hi {
        sum += totient(i);
    }
    sum
}

/// Split [lower, upper] into contiguous chunks, one per worker
///
/// Chunk length is the floor of range size / workers; a boundary check
/// on the advancing cursor (`i == upper - chunk_size`) makes the final
/// chunk absorb the remainder. The loop is bounded only by the cursor,
/// never by a worker count, and this faithfully carries the original
/// benchmark's quirks:
///
/// - coverage is exact when `workers` divides the range size, and for
///   many uneven sizes where the override fires on the last step;
/// - some uneven sizes emit **more** chunks than workers (the last of
///   which can overshoot `upper`), so dispatch fails once chunks outrun
///   the connected ranks;
/// - some sizes emit **fewer** chunks than workers, leaving the residual
///   workers blocked forever on a receive that never comes.
///
/// # Precondition
///
/// `workers >= 1` and range size >= `workers`: a zero `chunk_size` would
/// stop the cursor from advancing and the loop would never terminate.
fn partition_range(lower: i64, upper: i64, workers: i64) -> Vec<(i64, i64)> {
    // Number of integers in the inclusive range,
    // e.g. 5..10 has (10 - 5) + 1 = 6
    let size = upper - lower + 1;
    let chunk_size = size / workers;

    let mut chunks = vec![];
    let mut i = lower;
    while i <= upper - 1 {
        // First iteration starts at the lower bound; later ones at the cursor
        let start = i;
        let mut end = start + chunk_size - 1;

        // Boundary override: the chunk starting here runs to the very end
        if i == upper - chunk_size {
            end = upper;
        }

        chunks.push((start, end));
        i += chunk_size;
    }
    chunks
}

/// Result of a completed run, reported by the coordinator only
#[derive(Debug)]
struct TotientResult {
    lower: i64,
    upper: i64,
    sum: i64,
    nodes: usize,
    time_ms: f64,
    /// Per-worker (start, end, partial sum), in rank order
    breakdown: Vec<(i64, i64, i64)>,
}

/// MPI-based distributed calculation
#[cfg(feature = "mpi")]
mod mpi_impl {
    use super::*;
    use mpi::traits::*;

    /// Run under the MPI runtime. Returns `Ok(None)` on worker ranks,
    /// which have nothing to report; the session is finalized when the
    /// universe handle drops.
    pub fn run_mpi(args: &Args) -> Result<Option<TotientResult>, String> {
        let universe = mpi::initialize().ok_or("Failed to initialize MPI")?;
        let world = universe.world();
        let rank = world.rank();
        let size = world.size();

        let start_time = Instant::now();

        if size > 1 {
            if rank == 0 {
                // Coordinator: one chunk per worker, two sends per chunk
                let chunks = partition_range(args.lower, args.upper, (size - 1) as i64);

                if args.verbose {
                    println!("MPI Configuration:");
                    println!("  Total ranks: {}", size);
                    println!("  Range: [{}, {}]", args.lower, args.upper);
                    println!("  Chunks dispatched: {}", chunks.len());
                }

                let mut dest = 1;
                for &(start, end) in &chunks {
                    world.process_at_rank(dest).send_with_tag(&start, TAG_RANGE);
                    world.process_at_rank(dest).send_with_tag(&end, TAG_RANGE);
                    dest += 1;
                }

                // Collect partials in ascending rank order (any order
                // would do: addition commutes)
                let mut sum: i64 = 0;
                let mut partials = vec![];
                for source in 1..size {
                    let (part, _status) =
                        world.process_at_rank(source).receive_with_tag::<i64>(TAG_RESULT);
                    sum += part;
                    partials.push(part);
                }

                let elapsed = start_time.elapsed();
                let breakdown = chunks
                    .iter()
                    .zip(partials.iter())
                    .map(|(&(start, end), &part)| (start, end, part))
                    .collect();

                Ok(Some(TotientResult {
                    lower: args.lower,
                    upper: args.upper,
                    sum,
                    nodes: size as usize,
                    time_ms: elapsed.as_secs_f64() * 1000.0,
                    breakdown,
                }))
            } else {
                // Worker: receive start and end, compute, reply
                let (start, _) = world.process_at_rank(0).receive_with_tag::<i64>(TAG_RANGE);
                let (end, _) = world.process_at_rank(0).receive_with_tag::<i64>(TAG_RANGE);

                let part = totient_range_sum(start, end);
                world.process_at_rank(0).send_with_tag(&part, TAG_RESULT);

                Ok(None)
            }
        } else {
            // Sole process: no messages, compute the whole range directly
            let sum = totient_range_sum(args.lower, args.upper);
            let elapsed = start_time.elapsed();

            Ok(Some(TotientResult {
                lower: args.lower,
                upper: args.upper,
                sum,
                nodes: 1,
                time_ms: elapsed.as_secs_f64() * 1000.0,
                breakdown: vec![(args.lower, args.upper, sum)],
            }))
        }
    }
}

/// TCP-based distributed calculation (fallback when MPI not available)
///
/// The master plays rank 0; workers get ranks 1..N in connection order.
/// Every message is framed as one tag byte followed by a little-endian
/// i64, mirroring the tagged scalar sends of the MPI path.
mod tcp_impl {
    use super::*;

    /// Send one tagged scalar
    pub fn send_scalar(stream: &mut TcpStream, tag: i32, value: i64) -> Result<(), String> {
        let mut frame = [0u8; 9];
        frame[0] = tag as u8;
        frame[1..].copy_from_slice(&value.to_le_bytes());
        stream
            .write_all(&frame)
            .map_err(|e| format!("Send failed: {}", e))
    }

    /// Receive one scalar, insisting on the expected tag
    ///
    /// Blocks until a full frame arrives; there is no timeout, so a
    /// message that is never sent blocks the caller forever.
    pub fn recv_scalar(stream: &mut TcpStream, tag: i32) -> Result<i64, String> {
        let mut frame = [0u8; 9];
        stream
            .read_exact(&mut frame)
            .map_err(|e| format!("Receive failed: {}", e))?;

        if frame[0] != tag as u8 {
            return Err(format!(
                "Protocol error: expected tag {}, got tag {}",
                tag, frame[0]
            ));
        }

        Ok(i64::from_le_bytes(frame[1..].try_into().unwrap()))
    }

    /// Accept workers, dispatch chunks, collect and reduce the partials
    ///
    /// Connection order assigns ranks: the i-th accepted worker is rank
    /// i + 1. Dispatch fails if the partition emits more chunks than
    /// there are connected workers; a worker left without a chunk never
    /// receives anything and blocks forever on its end.
    pub fn serve_master(
        listener: TcpListener,
        num_workers: usize,
        lower: i64,
        upper: i64,
        verbose: bool,
    ) -> Result<TotientResult, String> {
        // Accept worker connections
        let mut workers: Vec<TcpStream> = Vec::new();
        for i in 0..num_workers {
            let (stream, addr) = listener
                .accept()
                .map_err(|e| format!("Accept failed: {}", e))?;
            if verbose {
                println!("  Worker {} connected from {}", i + 1, addr);
            }
            workers.push(stream);
        }

        let start_time = Instant::now();

        // Dispatch one chunk per worker, two sends per chunk
        let chunks = partition_range(lower, upper, num_workers as i64);
        for (idx, &(start, end)) in chunks.iter().enumerate() {
            let rank = idx + 1;
            let stream = workers
                .get_mut(idx)
                .ok_or_else(|| format!("No connected worker holds rank {}", rank))?;

            if verbose {
                println!("  Sending range to worker {}: [{}, {}]", rank, start, end);
            }

            send_scalar(stream, TAG_RANGE, start)?;
            send_scalar(stream, TAG_RANGE, end)?;
        }

        // Collect partials in ascending rank order and reduce by addition
        let mut sum: i64 = 0;
        let mut partials = vec![];
        for (idx, stream) in workers.iter_mut().enumerate() {
            let part = recv_scalar(stream, TAG_RESULT)?;

            if verbose {
                println!("  Worker {} returned partial sum {}", idx + 1, part);
            }

            sum += part;
            partials.push(part);
        }

        let elapsed = start_time.elapsed();
        let breakdown = chunks
            .iter()
            .zip(partials.iter())
            .map(|(&(start, end), &part)| (start, end, part))
            .collect();

        Ok(TotientResult {
            lower,
            upper,
            sum,
            nodes: num_workers + 1,
            time_ms: elapsed.as_secs_f64() * 1000.0,
            breakdown,
        })
    }

    /// Serve exactly one range assignment over an established connection
    pub fn serve_assignment(stream: &mut TcpStream) -> Result<(), String> {
        let start = recv_scalar(stream, TAG_RANGE)?;
        let end = recv_scalar(stream, TAG_RANGE)?;

        let part = totient_range_sum(start, end);

        send_scalar(stream, TAG_RESULT, part)
    }

    /// Run as TCP master
    pub fn run_master(args: &Args) -> Result<TotientResult, String> {
        let listener = TcpListener::bind(&args.master_addr)
            .map_err(|e| format!("Failed to bind {}: {}", args.master_addr, e))?;

        if args.verbose {
            println!("Master listening on {}", args.master_addr);
            println!("Waiting for {} workers to connect...", args.workers);
        }

        serve_master(listener, args.workers, args.lower, args.upper, args.verbose)
    }

    /// Run as TCP worker
    pub fn run_worker(args: &Args) -> Result<(), String> {
        let mut stream = TcpStream::connect(&args.master_addr)
            .map_err(|e| format!("Connection to {} failed: {}", args.master_addr, e))?;

        if args.verbose {
            println!("Connected to master at {}", args.master_addr);
        }

        serve_assignment(&mut stream)?;

        if args.verbose {
            println!("Partial sum sent to master");
        }

        Ok(())
    }
}

/// Single-process fallback: the whole range, no messages
fn run_single_node(args: &Args) -> TotientResult {
    let start_time = Instant::now();

    let sum = totient_range_sum(args.lower, args.upper);

    let elapsed = start_time.elapsed();

    TotientResult {
        lower: args.lower,
        upper: args.upper,
        sum,
        nodes: 1,
        time_ms: elapsed.as_secs_f64() * 1000.0,
        breakdown: vec![(args.lower, args.upper, sum)],
    }
}

fn print_result(result: &TotientResult, args: &Args) {
    if args.csv {
        // CSV format: lower,upper,nodes,time_ms,sum
        println!(
            "{},{},{},{:.3},{}",
            result.lower, result.upper, result.nodes, result.time_ms, result.sum
        );
        return;
    }

    println!(
        "Sum of Totients  between [{}..{}] is {}",
        result.lower, result.upper, result.sum
    );

    if args.verbose {
        println!("───────────────────────────────────────────────────────────");
        println!("  Nodes:          {}", result.nodes);
        println!("  Execution time: {:.3} ms", result.time_ms);
        println!("  Per-worker breakdown:");
        for (i, (start, end, part)) in result.breakdown.iter().enumerate() {
            println!(
                "    Worker {}: [{:>10}, {:>10}] -> sum {}",
                i + 1,
                start,
                end,
                part
            );
        }
        println!("───────────────────────────────────────────────────────────");
    }
}

fn main() {
    // Wrong or malformed arguments: one usage line, exit 1, and no
    // transport interaction of any kind
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(_) => {
            println!("You need to pass two arguments i.e. a lower and upper boundary");
            std::process::exit(1);
        }
    };

    if args.worker {
        // TCP worker mode: serve one assignment, stay silent otherwise
        match tcp_impl::run_worker(&args) {
            Ok(()) => {}
            Err(e) => {
                eprintln!("Worker error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if args.tcp {
        // TCP master mode
        match tcp_impl::run_master(&args) {
            Ok(result) => print_result(&result, &args),
            Err(e) => {
                eprintln!("Master error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Try MPI first
    #[cfg(feature = "mpi")]
    {
        match mpi_impl::run_mpi(&args) {
            Ok(Some(result)) => {
                // Only the coordinator rank reports
                print_result(&result, &args);
                return;
            }
            Ok(None) => {
                // Worker ranks finish silently
                return;
            }
            Err(e) => {
                eprintln!("MPI error: {}, falling back to single process", e);
            }
        }
    }

    // Fallback to a single process
    if args.verbose {
        println!("Running in single-process mode (MPI not available)");
        println!("Use --tcp / --worker for TCP-based distribution");
    }

    let result = run_single_node(&args);
    print_result(&result, &args);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_totient_values() {
        assert_eq!(totient(1), 0);
        assert_eq!(totient(2), 1);
        assert_eq!(totient(10), 4);
        // phi(p) = p - 1 for primes
        for p in [2, 3, 5, 7, 11, 13] {
            assert_eq!(totient(p), p - 1);
        }
    }

    #[test]
    fn test_range_sum() {
        assert_eq!(totient_range_sum(1, 10), 31);
        assert_eq!(totient_range_sum(10, 10), 4);
        assert_eq!(totient_range_sum(5, 1), 0);
    }

    #[test]
    fn test_partition_even_split() {
        // 10 elements across 2 workers: two chunks of 5
        assert_eq!(partition_range(1, 10, 2), vec![(1, 5), (6, 10)]);

        // 12 elements across 3 workers: exact coverage, no overlap
        assert_eq!(partition_range(1, 12, 3), vec![(1, 4), (5, 8), (9, 12)]);
    }

    #[test]
    fn test_partition_remainder_absorbed_by_last_chunk() {
        // 10 elements across 3 workers: chunk size 3, override fires at
        // cursor 7 and the last chunk stretches to the upper bound
        assert_eq!(partition_range(1, 10, 3), vec![(1, 3), (4, 6), (7, 10)]);
    }

    #[test]
    fn test_partition_over_dispatch() {
        // 10 elements across 4 workers: chunk size 2, but the cursor
        // bound lets a 5th chunk out, one more than there are workers
        let chunks = partition_range(1, 10, 4);
        assert_eq!(chunks, vec![(1, 2), (3, 4), (5, 6), (7, 8), (9, 10)]);
        assert!(chunks.len() > 4);
    }

    #[test]
    fn test_partition_overshoot() {
        // 11 elements across 3 workers: the override never fires (the
        // cursor skips the trigger value) and the final chunk runs past
        // the upper bound
        let chunks = partition_range(1, 11, 3);
        assert_eq!(chunks, vec![(1, 3), (4, 6), (7, 9), (10, 12)]);
        assert!(chunks.last().unwrap().1 > 11);
    }

    #[test]
    fn test_partition_under_dispatch() {
        // 2 elements across 2 workers: the override fires on the very
        // first step, emitting a single chunk, so the second worker would
        // wait forever
        let chunks = partition_range(1, 2, 2);
        assert_eq!(chunks, vec![(1, 2)]);
        assert!(chunks.len() < 2);
    }

    /// Spin up in-process workers over loopback TCP and check that the
    /// distributed reduction agrees with the sequential kernel.
    fn run_loopback(num_workers: usize, lower: i64, upper: i64) -> TotientResult {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut handles = vec![];
        for _ in 0..num_workers {
            handles.push(thread::spawn(move || {
                let mut stream = TcpStream::connect(addr).unwrap();
                tcp_impl::serve_assignment(&mut stream).unwrap();
            }));
        }

        let result = tcp_impl::serve_master(listener, num_workers, lower, upper, false).unwrap();

        for handle in handles {
            handle.join().unwrap();
        }

        result
    }

    #[test]
    fn test_tcp_distributed_matches_sequential() {
        let result = run_loopback(2, 1, 10);
        assert_eq!(result.sum, 31);
        assert_eq!(result.sum, totient_range_sum(1, 10));
        assert_eq!(result.nodes, 3);
        assert_eq!(result.breakdown.len(), 2);
    }

    #[test]
    fn test_tcp_even_partition_three_workers() {
        let result = run_loopback(3, 1, 12);
        assert_eq!(result.sum, totient_range_sum(1, 12));
        assert_eq!(result.breakdown, vec![(1, 4, 5), (5, 8, 16), (9, 12, 24)]);
    }

    #[test]
    fn test_tcp_tag_mismatch_is_protocol_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let sender = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            tcp_impl::send_scalar(&mut stream, TAG_RESULT, 7).unwrap();
        });

        let (mut stream, _) = listener.accept().unwrap();
        let err = tcp_impl::recv_scalar(&mut stream, TAG_RANGE).unwrap_err();
        assert!(err.contains("expected tag"));

        sender.join().unwrap();
    }
}
