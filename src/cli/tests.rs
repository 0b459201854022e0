//! Unit tests for CLI parsing

use crate::cli::{Cli, Commands};
use clap::Parser;

#[test]
fn test_serve_defaults() {
    let cli = Cli::try_parse_from(["addsvc", "serve"]).unwrap();
    assert_eq!(
        cli.command,
        Commands::Serve {
            config: None,
            addr: None
        }
    );
}

#[test]
fn test_serve_with_flags() {
    let cli = Cli::try_parse_from([
        "addsvc",
        "serve",
        "--config",
        "addsvc.yaml",
        "--addr",
        "127.0.0.1:9000",
    ])
    .unwrap();
    match cli.command {
        Commands::Serve { config, addr } => {
            assert_eq!(config.unwrap().to_string_lossy(), "addsvc.yaml");
            assert_eq!(addr.as_deref(), Some("127.0.0.1:9000"));
        }
        other => panic!("Expected Serve command, got {other:?}"),
    }
}

#[test]
fn test_sum_accepts_negative_operands() {
    let cli = Cli::try_parse_from(["addsvc", "sum", "--target", "localhost:1", "-2", "5"]).unwrap();
    assert_eq!(
        cli.command,
        Commands::Sum {
            target: "localhost:1".into(),
            a: -2,
            b: 5
        }
    );
}

#[test]
fn test_sum_rejects_non_integers() {
    assert!(Cli::try_parse_from(["addsvc", "sum", "two", "3"]).is_err());
}

#[test]
fn test_concat_default_target() {
    let cli = Cli::try_parse_from(["addsvc", "concat", "foo", "bar"]).unwrap();
    match cli.command {
        Commands::Concat { target, a, b } => {
            assert_eq!(target, "localhost:8081");
            assert_eq!((a.as_str(), b.as_str()), ("foo", "bar"));
        }
        other => panic!("Expected Concat command, got {other:?}"),
    }
}
