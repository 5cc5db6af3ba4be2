use std::process::ExitCode;
use std::sync::Arc;

use pricebook_core::{
    AlphaVantageAdapter, DateWindow, Ingestor, Symbol, TradeDate, ValidationError, Warehouse,
};

use crate::cli::IngestArgs;
use crate::commands::print_json;
use crate::config::ServiceConfig;
use crate::error::CliError;

pub async fn run(args: &IngestArgs, config: &ServiceConfig) -> Result<ExitCode, CliError> {
    let symbols = args
        .symbols
        .iter()
        .map(|symbol| Symbol::parse(symbol))
        .collect::<Result<Vec<_>, ValidationError>>()?;
    let window = (!args.all).then(|| DateWindow::trailing_weeks(TradeDate::today(), args.weeks));

    let adapter = AlphaVantageAdapter::new(args.api_key.clone())
        .with_timeout_ms(args.timeout_ms)
        .with_full_history(args.full);

    let warehouse = Warehouse::open(config.warehouse.clone())?;
    let ingestor = Ingestor::new(warehouse.clone(), Arc::new(adapter));
    let report = ingestor.ingest(&symbols, window).await;
    warehouse.close();
    let report = report?;

    tracing::info!(
        request_id = %report.request_id,
        inserted = report.inserted(),
        failures = report.failures(),
        "ingestion finished"
    );
    print_json(&report, args.pretty)?;

    if report.failures() > 0 {
        return Ok(ExitCode::from(3));
    }
    Ok(ExitCode::SUCCESS)
}
