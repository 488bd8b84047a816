//! cwtail - tail CloudWatch Logs groups and log sets in the terminal.

use anyhow::{Context, Result};
use cwtail::engine::TailOutcome;
use cwtail::CwtailError;

/// Conventional status for a run ended by SIGINT
const EXIT_INTERRUPTED: i32 = 130;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<CwtailError>()
        .map_or(1, CwtailError::exit_code)
}

async fn run() -> Result<TailOutcome> {
    let cli = cwtail::cli::parse();
    init_logging(cli.verbose);
    log::debug!("cwtail {} starting with {:?}", cwtail::VERSION, cli);

    let identifier = cli.identifier.clone();
    cwtail::app::run(cli)
        .await
        .with_context(|| format!("Failed to tail '{identifier}'"))
}

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(TailOutcome::Completed) => 0,
        Ok(TailOutcome::Interrupted) => EXIT_INTERRUPTED,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            exit_code(&err)
        }
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!cwtail::VERSION.is_empty());
    }

    #[test]
    fn test_exit_code_from_domain_error() {
        let usage = anyhow::Error::from(CwtailError::usage("bad flags"));
        assert_eq!(exit_code(&usage), 2);

        let wrapped = anyhow::Error::from(CwtailError::usage("bad flags")).context("while starting");
        assert_eq!(exit_code(&wrapped), 2);

        let other = anyhow::anyhow!("unrelated failure");
        assert_eq!(exit_code(&other), 1);
    }
}
