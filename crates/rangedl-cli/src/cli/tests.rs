use super::progress::{format_progress, Throttle};
use super::*;
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_get_defaults() {
    match parse(&["rangedl", "get", "https://example.com/file.iso"]) {
        CliCommand::Get {
            url,
            output,
            block_size,
            concurrency,
        } => {
            assert_eq!(url, "https://example.com/file.iso");
            assert!(output.is_none());
            assert!(block_size.is_none());
            assert!(concurrency.is_none());
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_overrides() {
    match parse(&[
        "rangedl",
        "get",
        "https://example.com/f",
        "-o",
        "/tmp/out.bin",
        "--block-size",
        "4096",
        "--concurrency",
        "8",
    ]) {
        CliCommand::Get {
            output,
            block_size,
            concurrency,
            ..
        } => {
            assert_eq!(output, Some(PathBuf::from("/tmp/out.bin")));
            assert_eq!(block_size, Some(4096));
            assert_eq!(concurrency, Some(8));
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_status_and_discard() {
    match parse(&["rangedl", "status", "out.bin"]) {
        CliCommand::Status { destination } => assert_eq!(destination, PathBuf::from("out.bin")),
        _ => panic!("expected Status"),
    }
    match parse(&["rangedl", "discard", "out.bin"]) {
        CliCommand::Discard { destination } => assert_eq!(destination, PathBuf::from("out.bin")),
        _ => panic!("expected Discard"),
    }
}

#[test]
fn cli_rejects_missing_url_and_bad_numbers() {
    assert!(Cli::try_parse_from(["rangedl", "get"]).is_err());
    assert!(Cli::try_parse_from(["rangedl", "get", "u", "--concurrency", "many"]).is_err());
}

#[test]
fn discard_removes_sidecar_files() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("f.bin");
    std::fs::write(dir.path().join("f.bin.tmp"), b"x").unwrap();
    std::fs::write(dir.path().join("f.bin.cfg"), b"{}").unwrap();
    commands::run_discard(&dest).unwrap();
    assert!(!dir.path().join("f.bin.tmp").exists());
    assert!(!dir.path().join("f.bin.cfg").exists());
}

#[test]
fn status_without_ledger_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    commands::run_status(&dir.path().join("nothing.bin")).unwrap();
}

#[test]
fn throttle_limits_updates_but_passes_final() {
    let mut t = Throttle::new(Duration::from_millis(500));
    let t0 = Instant::now();
    assert!(t.ready(t0, false));
    assert!(!t.ready(t0 + Duration::from_millis(100), false));
    assert!(t.ready(t0 + Duration::from_millis(200), true));
    assert!(!t.ready(t0 + Duration::from_millis(600), false));
    assert!(t.ready(t0 + Duration::from_millis(700), false));
}

#[test]
fn progress_line_shows_percentage() {
    assert_eq!(format_progress(50, 200), " 25.0% (50/200 bytes)");
    assert_eq!(format_progress(0, 0), "100.0% (0 B)");
}
