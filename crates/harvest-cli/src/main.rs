// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod commands;
mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use harvest_api::Client;
use harvest_app::{AppState, RunId};
use runtime::ApiRuntime;
use std::env;
use std::io;
use std::path::PathBuf;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `harvest --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let base_url = config.api_base_url();
    let client = Client::new(&base_url, config.api_timeout()?, config.scrape_timeout()?)
        .with_context(|| {
            format!(
                "invalid [api] config in {}; fix base_url/timeout values or HARVEST_API_URL",
                options.config_path.display()
            )
        })?;
    if options.check_only {
        return Ok(());
    }

    let _log_guard = logging::init(&logging::log_dir()?)?;
    info!(
        config = %options.config_path.display(),
        base_url = %base_url,
        export_dir = %config.export_dir().display(),
        "harvest starting"
    );

    let mut stdout = io::stdout().lock();
    match options.command {
        Some(Command::Runs) => commands::list_runs(&client, &mut stdout),
        Some(Command::Entries(run_id)) => commands::list_entries(&client, run_id, &mut stdout),
        Some(Command::Export(scope)) => {
            commands::export(&client, scope, &config.export_dir(), &mut stdout)
        }
        None => {
            drop(stdout);
            let mut state = AppState::default();
            let mut runtime = ApiRuntime::new(client, config.export_dir());
            harvest_tui::run_app(&mut state, &mut runtime, config.ui_options())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    Runs,
    Entries(RunId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Runs,
    Entries(RunId),
    Export(ExportScope),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    command: Option<Command>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
        command: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let command = match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
                continue;
            }
            "--print-config-path" => {
                options.print_config_path = true;
                continue;
            }
            "--print-example-config" => {
                options.print_example = true;
                continue;
            }
            "--check" => {
                options.check_only = true;
                continue;
            }
            "--help" | "-h" => {
                options.show_help = true;
                continue;
            }
            "runs" => Command::Runs,
            "entries" => Command::Entries(parse_run_id(iter.next(), "entries")?),
            "export" => {
                let scope = iter.next();
                let scope: Option<&str> = scope.as_ref().map(|value| value.as_ref());
                match scope {
                    Some("runs") => Command::Export(ExportScope::Runs),
                    Some("entries") => Command::Export(ExportScope::Entries(parse_run_id(
                        iter.next(),
                        "export entries",
                    )?)),
                    other => {
                        return Err(anyhow!(
                            "export needs `runs` or `entries <id>`, got {other:?}"
                        ));
                    }
                }
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        };
        if options.command.replace(command).is_some() {
            return Err(anyhow!(
                "only one command per invocation; run with --help to see usage"
            ));
        }
    }

    Ok(options)
}

fn parse_run_id<S: AsRef<str>>(value: Option<S>, command: &str) -> Result<RunId> {
    let raw = value.ok_or_else(|| anyhow!("{command} requires a run id"))?;
    let raw = raw.as_ref();
    raw.parse::<i64>()
        .map(RunId::new)
        .with_context(|| format!("{command}: run id {raw:?} is not a number"))
}

fn print_help() {
    println!("harvest: scrape run dashboard");
    println!("  harvest                        Open the dashboard");
    println!("  harvest runs                   List runs (newest first)");
    println!("  harvest entries <id>           List the contacts of one run");
    println!("  harvest export runs            Write the runs sheet (csv) to the export dir");
    println!("  harvest export entries <id>    Write one run's contacts sheet (csv)");
    println!();
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and API settings, then exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, Command, ExportScope, parse_cli_args};
    use anyhow::Result;
    use harvest_app::RunId;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/harvest-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_dashboard() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                check_only: false,
                show_help: false,
                command: None,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check", "-h"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_reads_subcommands() -> Result<()> {
        let runs = parse_cli_args(vec!["runs"], default_options_path())?;
        assert_eq!(runs.command, Some(Command::Runs));

        let entries = parse_cli_args(vec!["entries", "12"], default_options_path())?;
        assert_eq!(entries.command, Some(Command::Entries(RunId::new(12))));

        let export = parse_cli_args(
            vec!["--config", "/c.toml", "export", "entries", "3"],
            default_options_path(),
        )?;
        assert_eq!(
            export.command,
            Some(Command::Export(ExportScope::Entries(RunId::new(3))))
        );
        assert_eq!(export.config_path, PathBuf::from("/c.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_bad_run_ids_and_scopes() {
        let missing = parse_cli_args(vec!["entries"], default_options_path())
            .expect_err("missing id should fail");
        assert!(missing.to_string().contains("requires a run id"));

        let not_number = parse_cli_args(vec!["entries", "abc"], default_options_path())
            .expect_err("non-numeric id should fail");
        assert!(not_number.to_string().contains("is not a number"));

        let scope = parse_cli_args(vec!["export", "vendors"], default_options_path())
            .expect_err("unknown scope should fail");
        assert!(scope.to_string().contains("`runs` or `entries <id>`"));
    }

    #[test]
    fn parse_cli_args_rejects_two_commands() {
        let error = parse_cli_args(vec!["runs", "entries", "1"], default_options_path())
            .expect_err("two commands should fail");
        assert!(error.to_string().contains("only one command"));
    }
}
