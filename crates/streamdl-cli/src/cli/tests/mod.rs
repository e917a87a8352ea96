//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn cli_parse_get_stdout() {
    let cli = parse(&["streamdl", "get", "https://example.com/file.iso"]);
    assert!(cli.config.is_none());
    match cli.command {
        CliCommand::Get {
            url,
            output,
            sha256,
        } => {
            assert_eq!(url, "https://example.com/file.iso");
            assert!(output.is_none());
            assert!(sha256.is_none());
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_output_and_sha() {
    let cli = parse(&[
        "streamdl",
        "get",
        "https://example.com/x",
        "-o",
        "/tmp/x.bin",
        "--sha256",
        "abc123",
    ]);
    match cli.command {
        CliCommand::Get {
            output, sha256, ..
        } => {
            assert_eq!(output.as_deref(), Some(std::path::Path::new("/tmp/x.bin")));
            assert_eq!(sha256.as_deref(), Some("abc123"));
        }
        _ => panic!("expected Get with --output"),
    }
}

#[test]
fn cli_parse_global_config_after_subcommand() {
    let cli = parse(&[
        "streamdl",
        "get",
        "https://example.com/x",
        "--config",
        "/etc/streamdl.toml",
    ]);
    assert_eq!(
        cli.config.as_deref(),
        Some(std::path::Path::new("/etc/streamdl.toml"))
    );
}

#[test]
fn cli_parse_checksum() {
    match parse(&["streamdl", "checksum", "/tmp/file"]).command {
        CliCommand::Checksum { path } => {
            assert_eq!(path, std::path::PathBuf::from("/tmp/file"))
        }
        _ => panic!("expected Checksum"),
    }
}

#[test]
fn cli_get_requires_url() {
    assert!(Cli::try_parse_from(["streamdl", "get"]).is_err());
}
