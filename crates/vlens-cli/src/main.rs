//! `vlens`: slice versioned classes from the command line

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vlens_core::prelude::*;
use vlens_syntax::{parse_module, print_class};

fn cli() -> Command {
    Command::new("vlens")
        .version(vlens_core::VERSION)
        .about("Slice multi-version classes into one class per version")
        .arg(
            Arg::new("input")
                .long("input")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Source module to read"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .action(ArgAction::SetTrue)
                .help("Print every declared version, one per line"),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .value_name("VERSION")
                .help("Print each class sliced at this version"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .help("Report every violation; exits non-zero if any"),
        )
        .group(
            ArgGroup::new("mode")
                .args(["list", "target", "check"])
                .required(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML file with slicing options"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Raise log verbosity (-v info, -vv debug)"),
        )
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<SliceConfig> {
    let Some(path) = path else {
        return Ok(SliceConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    SliceConfig::from_toml_str(&text).with_context(|| format!("loading config {}", path.display()))
}

fn run(args: &ArgMatches) -> Result<ExitCode> {
    let input = args
        .get_one::<PathBuf>("input")
        .context("--input is required")?;
    let config = load_config(args.get_one::<PathBuf>("config"))?;
    let source = std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let module = parse_module(&source).with_context(|| format!("parsing {}", input.display()))?;

    if args.get_flag("check") {
        tracing::info!(input = %input.display(), "checking");
        let diagnostics = check_module(&module, &config);
        for d in &diagnostics {
            println!("{d}");
        }
        return Ok(if diagnostics.is_empty() {
            ExitCode::SUCCESS
        } else {
            eprintln!("{}: {} problem(s)", input.display(), diagnostics.len());
            ExitCode::FAILURE
        });
    }

    let model = ModuleModel::from_module(&module).with_context(|| format!("reading versions of {}", input.display()))?;

    if args.get_flag("list") {
        tracing::info!(input = %input.display(), classes = model.classes.len(), "listing versions");
        for version in model.versions() {
            println!("{version}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(target) = args.get_one::<String>("target") {
        tracing::info!(input = %input.display(), target = %target, "slicing");
        let classes = slice_module(&model, target, &config)?;
        let printed: Vec<String> = classes.iter().map(print_class).collect();
        print!("{}", printed.join("\n"));
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let args = cli().get_matches();
    init_tracing(args.get_count("verbose"));
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn a_mode_is_required() {
        let err = cli().try_get_matches_from(["vlens", "--input", "m.py"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn modes_are_exclusive() {
        assert!(cli()
            .try_get_matches_from(["vlens", "--input", "m.py", "--list", "--check"])
            .is_err());
    }

    #[test]
    fn verbosity_counts() {
        let m = cli()
            .try_get_matches_from(["vlens", "--input", "m.py", "--list", "-vv"])
            .unwrap();
        assert_eq!(m.get_count("verbose"), 2);
    }
}
