//! Clap command tree and option parsing for the demo.

use std::path::PathBuf;
use std::time::Duration;

use clap::{value_parser, Arg, ArgMatches, Command};

use interpose_proxy::CONFIG_FILE_NAME;

/// Build the demo command tree.
pub fn build_cli() -> Command {
    Command::new("interpose-demo")
        .about("Caching and logging interceptors over a deliberately slow service")
        .subcommand_required(false)
        .arg(
            Arg::new("delay-ms")
                .long("delay-ms")
                .help("Base delay of the slow members in milliseconds (default: 1000)")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("ttl-ms")
                .long("ttl-ms")
                .help("Cache entry lifetime in milliseconds (default: 3000)")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("rounds")
                .long("rounds")
                .help("Cache lifetimes to run through (default: 2)")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Interceptor bindings file; declared markers are used without it")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .value_name("FILTER")
                .help("Log filter when RUST_LOG is unset (default: info)"),
        )
        .subcommand(
            Command::new("init-config")
                .about("Write a commented interceptor bindings file")
                .arg(
                    Arg::new("path")
                        .value_name("PATH")
                        .help("Destination (default: interpose.toml)")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

/// What the demo was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Run the slow service through its proxy
    Run(DemoOptions),
    /// Write the default bindings file
    InitConfig(PathBuf),
}

/// Options for a demo run.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoOptions {
    pub delay: Duration,
    pub ttl: Duration,
    pub rounds: u32,
    pub config: Option<PathBuf>,
    pub log: String,
}

impl Default for DemoOptions {
    fn default() -> Self {
        DemoOptions {
            delay: Duration::from_millis(1000),
            ttl: Duration::from_millis(3000),
            rounds: 2,
            config: None,
            log: "info".to_string(),
        }
    }
}

/// Turn parsed matches into an [`Action`].
pub fn matches_to_action(matches: &ArgMatches) -> Action {
    if let Some(sub) = matches.subcommand_matches("init-config") {
        let path = sub
            .get_one::<PathBuf>("path")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        return Action::InitConfig(path);
    }

    let defaults = DemoOptions::default();
    Action::Run(DemoOptions {
        delay: matches
            .get_one::<u64>("delay-ms")
            .map(|ms| Duration::from_millis(*ms))
            .unwrap_or(defaults.delay),
        ttl: matches
            .get_one::<u64>("ttl-ms")
            .map(|ms| Duration::from_millis(*ms))
            .unwrap_or(defaults.ttl),
        rounds: matches.get_one::<u32>("rounds").copied().unwrap_or(defaults.rounds),
        config: matches.get_one::<PathBuf>("config").cloned(),
        log: matches
            .get_one::<String>("log")
            .cloned()
            .unwrap_or(defaults.log),
    })
}
