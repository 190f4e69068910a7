use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, Command};
use loglift_core::tracer::logging_rules::RULE_NAMES;
use loglift_core::{init_tracing, init_tracing_with, LoggingFramework, LogliftConfig};
use loglift_cli::driver::{self, DriverOptions, EmitFormat};

fn cli() -> Command {
    Command::new("loglift")
        .version(loglift_core::VERSION)
        .about("Normalizes Java logging calls in serialized compilation units")
        .arg(
            Arg::new("inputs")
                .value_name("PATH")
                .help("Unit files or directories of .json units")
                .num_args(1..)
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file; flags override its values")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .value_name("FRAMEWORK")
                .help("Target framework: slf4j, log4j1, log4j2, jul or commons"),
        )
        .arg(
            Arg::new("rules")
                .long("rules")
                .value_name("NAMES")
                .help(format!("Comma-separated rules to run ({})", RULE_NAMES.join(", ")))
                .value_delimiter(','),
        )
        .arg(
            Arg::new("max-cycles")
                .long("max-cycles")
                .value_name("N")
                .help("Rewrite cycles allowed per unit")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("logger-name")
                .long("logger-name")
                .value_name("NAME")
                .help("Name for injected logger fields"),
        )
        .arg(
            Arg::new("no-add-logger")
                .long("no-add-logger")
                .help("Never inject a logger field")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("emit")
                .long("emit")
                .value_name("FORMAT")
                .help("Output format: source or json")
                .default_value("source"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("DIR")
                .help("Write results here instead of stdout")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Log every applied rewrite")
                .action(ArgAction::SetTrue),
        )
}

fn build_config(matches: &clap::ArgMatches) -> Result<LogliftConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => LogliftConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))?,
        None => LogliftConfig::default(),
    };

    if let Some(target) = matches.get_one::<String>("target") {
        config.target = target.parse::<LoggingFramework>()?;
    }
    if let Some(rules) = matches.get_many::<String>("rules") {
        config.rules = rules.map(|rule| rule.trim().to_string()).collect();
    }
    if let Some(max_cycles) = matches.get_one::<usize>("max-cycles") {
        config.max_cycles = *max_cycles;
    }
    if let Some(name) = matches.get_one::<String>("logger-name") {
        config.logger_name = name.clone();
    }
    if matches.get_flag("no-add-logger") {
        config.add_logger_if_missing = false;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    if matches.get_flag("debug") {
        init_tracing_with("loglift_core=debug,loglift_cli=debug");
    } else {
        init_tracing();
    }

    let config = build_config(&matches)?;
    let emit = matches
        .get_one::<String>("emit")
        .map(|format| format.parse::<EmitFormat>())
        .transpose()?
        .unwrap_or_default();
    let options = DriverOptions {
        config,
        emit,
        output: matches.get_one::<PathBuf>("output").cloned(),
    };

    let paths: Vec<PathBuf> = matches
        .get_many::<PathBuf>("inputs")
        .map(|paths| paths.cloned().collect())
        .unwrap_or_default();
    let inputs = driver::collect_inputs(&paths)?;
    if inputs.is_empty() {
        bail!("no .json units found");
    }

    let report = driver::run(inputs, &options).await?;
    for file in &report.files {
        eprintln!("{}: {}", file.path.display(), file.status);
    }
    eprintln!(
        "{} files, {} changed, {} rewrites",
        report.files.len(),
        report.summary.units_changed,
        report.summary.rewrites
    );

    if !report.success() {
        bail!("{} units could not be rewritten", report.summary.errors.len());
    }
    Ok(())
}
