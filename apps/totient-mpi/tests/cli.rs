//! Command-line contract tests for the totient-mpi binary
//!
//! Wrong or malformed arguments must produce exactly one usage line on
//! stdout and exit with status 1, before any transport interaction; a
//! valid invocation must produce exactly the fixed result line and exit
//! with status 0.

use std::process::Command;

const USAGE_LINE: &str = "You need to pass two arguments i.e. a lower and upper boundary\n";

fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_totient-mpi"))
        .args(args)
        .output()
        .expect("failed to spawn totient-mpi")
}

#[test]
fn wrong_argument_count_prints_usage_and_exits_nonzero() {
    for args in [&[][..], &["5"][..], &["1", "10", "20"][..]] {
        let output = run(args);
        assert_eq!(output.status.code(), Some(1), "args: {:?}", args);
        assert_eq!(String::from_utf8_lossy(&output.stdout), USAGE_LINE);
    }
}

#[test]
fn malformed_numeric_argument_prints_usage_and_exits_nonzero() {
    let output = run(&["abc", "10"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout), USAGE_LINE);
}

#[test]
fn valid_invocation_prints_single_result_line() {
    let output = run(&["1", "10"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Sum of Totients  between [1..10] is 31\n"
    );
}

#[test]
fn single_element_range() {
    let output = run(&["10", "10"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Sum of Totients  between [10..10] is 4\n"
    );
}
