use clap::Parser;
use strata::cli::commands::keys::KeysArgs;
use strata::cli::commands::show::ShowArgs;
use strata::cli::{Cli, Commands};
use strata::infrastructure::logging::LogFormat;

#[test]
fn test_parse_show_with_overrides() {
    let cli = Cli::try_parse_from(vec![
        "strata",
        "--dir",
        "/etc/flip",
        "show",
        "--app-env",
        "local",
        "--port",
        "9090",
        "--project-id",
        "flip-dev",
    ])
    .unwrap();

    assert_eq!(cli.dir.to_str(), Some("/etc/flip"));
    match cli.command {
        Commands::Show(ShowArgs {
            app_env,
            port,
            project_id,
        }) => {
            assert_eq!(app_env.as_deref(), Some("local"));
            assert_eq!(port, Some(9090));
            assert_eq!(project_id.as_deref(), Some("flip-dev"));
        }
        Commands::Keys(_) => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_keys_with_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(vec![
        "strata",
        "keys",
        "--prefix",
        "database",
        "--json",
        "--log-format",
        "json",
    ])
    .unwrap();

    assert!(cli.json);
    assert_eq!(cli.log_format, LogFormat::Json);
    match cli.command {
        Commands::Keys(KeysArgs { prefix }) => assert_eq!(prefix.as_deref(), Some("database")),
        Commands::Show(_) => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_log_config_from_flags() {
    let cli = Cli::try_parse_from(vec![
        "strata",
        "--log-level",
        "debug",
        "--log-dir",
        "/var/log/strata",
        "keys",
    ])
    .unwrap();

    let config = cli.log_config();

    assert_eq!(config.level, "debug");
    assert_eq!(config.log_dir.as_deref().and_then(|p| p.to_str()), Some("/var/log/strata"));
    assert!(config.enable_stderr);
}

#[test]
fn test_invalid_port_is_rejected() {
    let result = Cli::try_parse_from(vec!["strata", "show", "--port", "70000"]);
    assert!(result.is_err());
}

#[test]
fn test_subcommand_is_required() {
    assert!(Cli::try_parse_from(vec!["strata"]).is_err());
}
