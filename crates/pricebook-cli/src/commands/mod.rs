mod ingest;
mod schema;
mod serve;

use std::process::ExitCode;

use crate::cli::{Cli, Command};
use crate::config::ServiceConfig;
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let config = ServiceConfig::resolve(cli.home.clone(), cli.db_path.clone());

    match &cli.command {
        Command::Serve(args) => serve::run(args, &config).await,
        Command::Ingest(args) => ingest::run(args, &config).await,
        Command::Schema => schema::run(&config),
    }
}

/// Print a value as JSON on stdout.
fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
