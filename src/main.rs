//! ghseal - Sealed-box relay for GitHub tokens and Actions secrets.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ghseal::cli::output;
use ghseal::cli::{execute, Cli};
use ghseal::core::constants::env;
use ghseal::error::{ConfigError, Error, ErrorKind};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(env::LOG).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("ghseal=debug")
        } else {
            EnvFilter::new("ghseal=warn")
        }
    });

    let (plain, structured) = if cli.log_json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (
            Some(
                fmt::layer()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr),
            ),
            None,
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(structured)
        .init();

    if let Err(e) = execute(cli.command, cli.config.as_deref()) {
        let suggestion = match &e {
            Error::Config(ConfigError::MissingKeys) => Some("run: ghseal keygen --save"),
            Error::Config(ConfigError::NoHomeDir) => Some("pass --config or set GHSEAL_CONFIG"),
            _ => match e.kind() {
                ErrorKind::InvalidPat => Some("the token was rejected; seal a new one with: ghseal pat seal"),
                ErrorKind::RateLimit => Some("GitHub rate limit reached; retry later"),
                _ => None,
            },
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
