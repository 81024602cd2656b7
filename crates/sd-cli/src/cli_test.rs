use super::*;
use clap::{CommandFactory, Parser};

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_global_defaults() {
    let cli = Cli::parse_from(["sd", "deploy"]);
    assert_eq!(cli.global.config, None);
    assert!(!cli.global.dry_run);
    assert!(!cli.global.verbose);
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::parse_from(["sd", "deploy", "--dry-run", "-c", "other.yml"]);
    assert!(cli.global.dry_run);
    assert_eq!(cli.global.config.as_deref(), Some("other.yml"));
}

#[test]
fn test_deploy_args() {
    let cli = Cli::parse_from(["sd", "deploy", "--databases", "orders,billing", "--no-track"]);
    match cli.command {
        Commands::Deploy(args) => {
            assert_eq!(args.databases.as_deref(), Some("orders,billing"));
            assert!(args.no_track);
            assert_eq!(args.output, OutputFormat::Table);
        }
        other => panic!("expected deploy, got {other:?}"),
    }
}

#[test]
fn test_script_commands_take_reference() {
    let cli = Cli::parse_from(["sd", "unmark", "orders/005_hotfix.sql"]);
    match cli.command {
        Commands::Unmark(args) => assert_eq!(args.script, "orders/005_hotfix.sql"),
        other => panic!("expected unmark, got {other:?}"),
    }
}

#[test]
fn test_baseline_requires_database() {
    assert!(Cli::try_parse_from(["sd", "baseline"]).is_err());
}

#[test]
fn test_status_json_output() {
    let cli = Cli::parse_from(["sd", "status", "--output", "json"]);
    match cli.command {
        Commands::Status(args) => assert_eq!(args.output, OutputFormat::Json),
        other => panic!("expected status, got {other:?}"),
    }
}
