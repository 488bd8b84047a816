//! Command line surface.

use crate::config;
use crate::error::{CwtailError, Result};
use crate::resolver::ResolveMode;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// `--since` default: far enough back to mean "all recent history"
pub const DEFAULT_SINCE: &str = "100000s";

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub identifier: String,
    pub since: String,
    pub to: Option<String>,
    pub filter: String,
    pub keep_open: bool,
    pub exact: bool,
    pub set: bool,
    pub use_paginate: bool,
    pub interval: Duration,
    pub limit: i32,
    pub config: Option<PathBuf>,
    pub profile: Option<String>,
    pub region: Option<String>,
    pub no_color: bool,
    pub verbose: u8,
}

impl CliOptions {
    /// How the identifier is to be resolved; `-e` and `-s` exclude each other
    pub fn resolve_mode(&self) -> Result<ResolveMode> {
        match (self.exact, self.set) {
            (true, true) => Err(CwtailError::usage(
                "--exact and --set cannot be used together",
            )),
            (true, false) => Ok(ResolveMode::Exact),
            (false, true) => Ok(ResolveMode::LogSet),
            (false, false) => Ok(ResolveMode::Substring),
        }
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let string = |id: &str| matches.get_one::<String>(id).cloned();
        Self {
            identifier: string("identifier").unwrap_or_default(),
            since: string("since").unwrap_or_else(|| DEFAULT_SINCE.to_string()),
            to: string("to"),
            filter: string("filter").unwrap_or_default(),
            keep_open: !matches.get_flag("disable-keep-open"),
            exact: matches.get_flag("exact"),
            set: matches.get_flag("set"),
            use_paginate: matches.get_flag("use-paginate"),
            interval: Duration::from_millis(
                matches.get_one::<u64>("interval").copied().unwrap_or(1000),
            ),
            limit: matches.get_one::<i32>("limit").copied().unwrap_or(10_000),
            config: matches.get_one::<PathBuf>("config").cloned(),
            profile: string("profile"),
            region: string("region"),
            no_color: matches.get_flag("no-color"),
            verbose: matches.get_count("verbose"),
        }
    }
}

fn after_help() -> String {
    let mut text = String::from(
        "Log sets are read from the first existing file of:\n",
    );
    for location in config::default_locations() {
        text.push_str(&format!("  {}\n", location.display()));
    }
    text.push_str(
        "\nFormat: { \"<set>\": { \"log_groups\": [ { \"name\": \"...\", \"alias\": \"...\" } ] } }\n\
         Tail a set with: cwtail <set> -s",
    );
    text
}

/// Argument definitions
pub fn command() -> Command {
    Command::new("cwtail")
        .version(crate::VERSION)
        .about("Tail CloudWatch Logs groups in the terminal")
        .long_about(
            "cwtail follows one log group, or a configured set of log groups merged into a \
             single chronological stream, and prints new events as they arrive.",
        )
        .arg_required_else_help(true)
        .after_help(after_help())
        .arg(
            Arg::new("identifier")
                .help("Log group name, substring of one, or log set name (with -s)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("since")
                .long("since")
                .value_name("DURATION|TIMESTAMP")
                .default_value(DEFAULT_SINCE)
                .help("Only show events since a duration ago (1h30m) or a time (2024-01-31/09:00:00)"),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .value_name("DURATION|TIMESTAMP")
                .help("Only show events before this point; prints once and exits"),
        )
        .arg(
            Arg::new("filter")
                .long("filter")
                .value_name("PATTERN")
                .default_value("")
                .help("CloudWatch filter pattern applied to the events"),
        )
        .arg(
            Arg::new("disable-keep-open")
                .long("disable-keep-open")
                .action(ArgAction::SetTrue)
                .help("Exit after printing the available events instead of following"),
        )
        .arg(
            Arg::new("exact")
                .short('e')
                .long("exact")
                .action(ArgAction::SetTrue)
                .conflicts_with("set")
                .help("Use the identifier as the exact log group name"),
        )
        .arg(
            Arg::new("set")
                .short('s')
                .long("set")
                .action(ArgAction::SetTrue)
                .help("Use the identifier as a log set name from the configuration"),
        )
        .arg(
            Arg::new("use-paginate")
                .short('p')
                .long("use-paginate")
                .action(ArgAction::SetTrue)
                .help("List every log stream instead of only the 50 most recent"),
        )
        .arg(
            Arg::new("interval")
                .long("interval")
                .value_name("MS")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("1000")
                .help("Pause between polls in milliseconds"),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .value_name("N")
                .value_parser(value_parser!(i32).range(1..=10_000))
                .default_value("10000")
                .help("Maximum events per backend page"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Log set configuration file"),
        )
        .arg(
            Arg::new("profile")
                .long("profile")
                .value_name("NAME")
                .help("AWS profile to use"),
        )
        .arg(
            Arg::new("region")
                .long("region")
                .value_name("REGION")
                .help("AWS region to use"),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .action(ArgAction::SetTrue)
                .help("Disable colored output"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Diagnostic logging on stderr (-v debug, -vv trace)"),
        )
}

/// Parse `args` (including the program name)
pub fn try_parse_from<I, T>(args: I) -> std::result::Result<CliOptions, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    Ok(CliOptions::from_matches(&matches))
}

/// Parse the process arguments, exiting with usage information on error
pub fn parse() -> CliOptions {
    let matches = command().get_matches();
    CliOptions::from_matches(&matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = try_parse_from(["cwtail", "payments"]).unwrap();
        assert_eq!(options.identifier, "payments");
        assert_eq!(options.since, DEFAULT_SINCE);
        assert_eq!(options.to, None);
        assert_eq!(options.filter, "");
        assert!(options.keep_open);
        assert_eq!(options.interval, Duration::from_secs(1));
        assert_eq!(options.limit, 10_000);
        assert_eq!(options.resolve_mode().unwrap(), ResolveMode::Substring);
    }

    #[test]
    fn test_all_flags() {
        let options = try_parse_from([
            "cwtail",
            "checkout",
            "-s",
            "-p",
            "--since",
            "2h",
            "--to",
            "1h",
            "--filter",
            "ERROR",
            "--disable-keep-open",
            "--interval",
            "250",
            "-vv",
        ])
        .unwrap();

        assert_eq!(options.resolve_mode().unwrap(), ResolveMode::LogSet);
        assert!(options.use_paginate);
        assert_eq!(options.since, "2h");
        assert_eq!(options.to.as_deref(), Some("1h"));
        assert_eq!(options.filter, "ERROR");
        assert!(!options.keep_open);
        assert_eq!(options.interval, Duration::from_millis(250));
        assert_eq!(options.verbose, 2);
    }

    #[test]
    fn test_exact_and_set_conflict() {
        let err = try_parse_from(["cwtail", "x", "-e", "-s"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_resolve_mode_rejects_both() {
        let mut options = try_parse_from(["cwtail", "x", "-e"]).unwrap();
        assert_eq!(options.resolve_mode().unwrap(), ResolveMode::Exact);

        options.set = true;
        assert!(matches!(
            options.resolve_mode(),
            Err(CwtailError::Usage { .. })
        ));
    }

    #[test]
    fn test_limit_is_bounded() {
        assert!(try_parse_from(["cwtail", "x", "--limit", "0"]).is_err());
        assert!(try_parse_from(["cwtail", "x", "--limit", "10001"]).is_err());
    }

    #[test]
    fn test_command_is_well_formed() {
        command().debug_assert();
    }
}
