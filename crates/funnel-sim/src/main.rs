//! Funnel simulator CLI

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use funnel_core::harness::{run_simulator, SimulatorConfig};
use funnel_core::FunnelConfig;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("TOML funnel configuration");

    Command::new("funnel-sim")
        .version(funnel_core::VERSION)
        .about("Walk the signup funnel headlessly")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("warn")
                .help("Log filter when RUST_LOG is unset"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("simulate")
                .about("Run one visitor through every page")
                .arg(
                    Arg::new("trust-name")
                        .long("trust-name")
                        .default_value("Harbour Family Trust")
                        .help("Trust name typed on the first page"),
                )
                .arg(
                    Arg::new("fail-updates")
                        .long("fail-updates")
                        .default_value("0")
                        .value_parser(value_parser!(usize))
                        .help("Number of store updates to fail"),
                )
                .arg(config_arg.clone())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Validate and print the effective configuration")
                .arg(config_arg),
        )
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn load_config(args: &ArgMatches) -> anyhow::Result<FunnelConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => FunnelConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(FunnelConfig::default()),
    }
}

async fn simulate(args: &ArgMatches) -> anyhow::Result<bool> {
    let funnel = load_config(args)?;
    let trust_name = args
        .get_one::<String>("trust-name")
        .context("missing trust name")?;
    let fail_updates = args.get_one::<usize>("fail-updates").copied().unwrap_or(0);

    tracing::info!(%trust_name, fail_updates, "starting simulation");
    let config = SimulatorConfig::new(trust_name.as_str())
        .with_funnel(funnel)
        .with_failed_updates(fail_updates);
    let report = run_simulator(config).await;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.generate_text());
    }
    Ok(report.passed())
}

fn show_config(args: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(args)?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let level = matches
        .get_one::<String>("log-level")
        .map_or("warn", String::as_str);
    init_tracing(level);

    match matches.subcommand() {
        Some(("simulate", args)) => {
            let passed = simulate(args).await?;
            std::process::exit(if passed { 0 } else { 1 });
        }
        Some(("config", args)) => show_config(args),
        _ => unreachable!("subcommand required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn parses_simulate_flags() {
        let matches = cli()
            .try_get_matches_from(["funnel-sim", "simulate", "--fail-updates", "2", "--json"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "simulate");
        assert_eq!(args.get_one::<usize>("fail-updates"), Some(&2));
        assert!(args.get_flag("json"));
    }
}
